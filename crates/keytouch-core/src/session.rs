//! One live mapping: the contact table behind a single lock, plus the
//! keep-alive thread that re-asserts it.

use crate::config::SessionConfig;
use crate::engine::ContactStateMachine;
use crate::error::{InjectError, SessionError};
use crate::injector::{FocusProbe, TouchInjector, TouchPlatform};
use crate::keepalive;
use crate::mapping::MappingTable;
use crate::types::{Contact, KeyEvent};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{error, info, warn};

/// Platform range for the handshake's contact count.
const MAX_TOUCH_COUNT: usize = 256;

pub(crate) struct Shared<P> {
    pub(crate) state: Mutex<SessionState<P>>,
    pub(crate) interval: Duration,
}

pub(crate) struct SessionState<P> {
    pub(crate) machine: ContactStateMachine<P>,
    pub(crate) closed: bool,
    pub(crate) keepalive_running: bool,
    /// Handshake failure seen off the event path, reported by the next event.
    pub(crate) failure: Option<InjectError>,
    keepalive: Option<JoinHandle<()>>,
}

/// Shared handle to a running session.
///
/// The event path and the keep-alive thread both take the same lock for the
/// whole decide-mutate-submit sequence, so every frame is a full snapshot.
pub struct Session<P: TouchPlatform + 'static> {
    shared: Arc<Shared<P>>,
    stop_tx: Mutex<Option<Sender<()>>>,
    stop_rx: Receiver<()>,
}

impl<P: TouchPlatform + 'static> Session<P> {
    pub fn new(machine: ContactStateMachine<P>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    machine,
                    closed: false,
                    keepalive_running: false,
                    failure: None,
                    keepalive: None,
                }),
                interval,
            }),
            stop_tx: Mutex::new(Some(stop_tx)),
            stop_rx,
        }
    }

    /// Build the injector and state machine from a loaded mapping.
    pub fn from_config(
        mapping: MappingTable,
        platform: P,
        config: &SessionConfig,
        focus: Option<Box<dyn FocusProbe>>,
    ) -> Self {
        let max_contacts = mapping.len().clamp(1, MAX_TOUCH_COUNT) as u32;
        let mut injector = TouchInjector::new(platform, max_contacts, config.contact_radius);
        match (config.gated_target(), focus) {
            (Some(target), Some(probe)) => {
                info!("Frames gated on focus of {}", target);
                injector = injector.with_focus_gate(target, probe);
            }
            (Some(target), None) => {
                warn!("Focus gating for {} requested but no probe available", target);
            }
            _ => {}
        }
        if mapping.is_empty() {
            warn!("Mapping is empty; session will not inject anything");
        }
        Self::new(
            ContactStateMachine::new(mapping, injector),
            config.keepalive_interval(),
        )
    }

    pub fn handle(&self, event: &KeyEvent) -> Result<(), SessionError> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(match state.failure.take() {
                Some(e) => SessionError::Handshake(e),
                None => SessionError::Closed,
            });
        }
        state
            .machine
            .apply(&event.key, event.edge)
            .map_err(SessionError::Handshake)?;
        self.ensure_keepalive(&mut state);
        Ok(())
    }

    pub fn key_down(&self, key: &str) -> Result<(), SessionError> {
        self.handle(&KeyEvent::down(key))
    }

    pub fn key_up(&self, key: &str) -> Result<(), SessionError> {
        self.handle(&KeyEvent::up(key))
    }

    /// Snapshot of the active-contact table.
    pub fn contacts(&self) -> Vec<Contact> {
        self.shared.state.lock().machine.contacts().to_vec()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn keepalive_running(&self) -> bool {
        self.shared.state.lock().keepalive_running
    }

    /// Drain then stop: cancel every active contact in one final frame, mark
    /// the session closed, wake the keep-alive and wait for it to exit.
    /// Nothing is submitted once this has taken the lock. Returns `false`
    /// if the session was already shut down.
    pub fn shutdown(&self) -> bool {
        let Some(stop_tx) = self.stop_tx.lock().take() else {
            return false;
        };
        let handle = {
            let mut state = self.shared.state.lock();
            if !state.closed {
                state.closed = true;
                if let Err(e) = state.machine.release_all() {
                    warn!("Final frame failed: {}", e);
                }
            }
            state.keepalive.take()
        };

        drop(stop_tx);

        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("Keep-alive thread panicked");
            }
        }
        self.shared.state.lock().keepalive_running = false;
        info!("Session closed");
        true
    }

    fn ensure_keepalive(&self, state: &mut SessionState<P>) {
        if state.keepalive_running || !state.machine.is_active() {
            return;
        }
        let shared = self.shared.clone();
        let stop = self.stop_rx.clone();
        let spawned = std::thread::Builder::new()
            .name("keytouch-keepalive".to_string())
            .spawn(move || keepalive::run(shared, stop));
        match spawned {
            Ok(handle) => {
                state.keepalive_running = true;
                // any previous handle belongs to a thread that already left its loop
                state.keepalive = Some(handle);
            }
            Err(e) => error!("Failed to start keep-alive: {}", e),
        }
    }
}

impl<P: TouchPlatform + 'static> Drop for Session<P> {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContactRecord, KeyId, Point, PointerFlags};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Instant;

    type Frames = Arc<Mutex<Vec<Vec<ContactRecord>>>>;

    struct Recorder(Frames);

    impl TouchPlatform for Recorder {
        fn begin(&mut self, _max_contacts: u32) -> Result<(), InjectError> {
            Ok(())
        }

        fn submit(&mut self, frame: &[ContactRecord]) -> Result<(), InjectError> {
            self.0.lock().push(frame.to_vec());
            Ok(())
        }
    }

    fn session(interval_ms: u64) -> (Session<Recorder>, Frames) {
        let frames = Frames::default();
        let mapping: MappingTable = [
            (KeyId::atom("a"), Point::new(100, 100)),
            (KeyId::atom("s"), Point::new(200, 100)),
        ]
        .into_iter()
        .collect();
        let config = SessionConfig {
            keepalive_ms: interval_ms,
            ..SessionConfig::default()
        };
        let session = Session::from_config(mapping, Recorder(frames.clone()), &config, None);
        (session, frames)
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_keepalive_refreshes_held_contact() {
        let (session, frames) = session(10);
        session.key_down("a").unwrap();
        assert!(session.keepalive_running());
        assert!(wait_until(|| frames.lock().len() >= 3));

        let frames_now = frames.lock().clone();
        for frame in &frames_now[1..] {
            assert_eq!(frame.len(), 1);
            assert_eq!(frame[0].flags, PointerFlags::CONTINUING);
        }
        session.shutdown();
    }

    #[test]
    fn test_keepalive_stops_when_table_empties() {
        let (session, frames) = session(10);
        session.key_down("a").unwrap();
        session.key_up("a").unwrap();
        assert!(wait_until(|| !session.keepalive_running()));

        let count = frames.lock().len();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(frames.lock().len(), count);
        let last = frames.lock().last().cloned().unwrap();
        assert_eq!(last[0].flags, PointerFlags::NATURAL_END);
    }

    #[test]
    fn test_shutdown_drains_and_silences() {
        let (session, frames) = session(5);
        session.key_down("a").unwrap();
        session.key_down("s").unwrap();
        session.shutdown();

        assert!(session.is_closed());
        assert!(session.contacts().is_empty());
        assert!(!session.keepalive_running());

        let last = frames.lock().last().cloned().unwrap();
        assert!(last
            .iter()
            .all(|r| r.flags == PointerFlags::SUPERSEDED_END));

        let count = frames.lock().len();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(frames.lock().len(), count);
    }

    #[test]
    fn test_events_after_shutdown_are_rejected() {
        let (session, frames) = session(50);
        session.shutdown();
        assert!(matches!(session.key_down("a"), Err(SessionError::Closed)));
        assert!(frames.lock().is_empty());
    }

    #[test]
    fn test_keepalive_restarts_for_next_press() {
        let (session, frames) = session(10);
        session.key_down("a").unwrap();
        session.key_up("a").unwrap();
        assert!(wait_until(|| !session.keepalive_running()));

        session.key_down("s").unwrap();
        assert!(session.keepalive_running());
        let before = frames.lock().len();
        assert!(wait_until(|| frames.lock().len() > before));
        session.shutdown();
    }

    #[test]
    fn test_second_shutdown_is_a_no_op() {
        let (session, frames) = session(10_000);
        session.key_down("a").unwrap();
        assert!(session.shutdown());
        assert!(!session.shutdown());
        drop(session);
        assert_eq!(frames.lock().len(), 2);
    }

    struct Denied;

    impl TouchPlatform for Denied {
        fn begin(&mut self, _max_contacts: u32) -> Result<(), InjectError> {
            Err(InjectError::Begin("access denied".into()))
        }

        fn submit(&mut self, _frame: &[ContactRecord]) -> Result<(), InjectError> {
            Ok(())
        }
    }

    struct Focus(Arc<AtomicBool>);

    impl FocusProbe for Focus {
        fn has_focus(&self, _target: &str) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_keepalive_handshake_failure_closes_session() {
        let focused = Arc::new(AtomicBool::new(false));
        let mapping: MappingTable = [
            (KeyId::atom("a"), Point::new(100, 100)),
            (KeyId::atom("s"), Point::new(200, 100)),
        ]
        .into_iter()
        .collect();
        let config = SessionConfig {
            keepalive_ms: 5,
            target: Some("game".into()),
            focus_gating: true,
            ..SessionConfig::default()
        };
        let session = Session::from_config(
            mapping,
            Denied,
            &config,
            Some(Box::new(Focus(focused.clone()))),
        );

        // dropped by the gate, so no handshake yet
        session.key_down("a").unwrap();
        focused.store(true, Ordering::SeqCst);
        assert!(wait_until(|| session.is_closed()));
        assert!(!session.keepalive_running());

        assert!(matches!(
            session.key_down("s"),
            Err(SessionError::Handshake(InjectError::Begin(_)))
        ));
        assert!(matches!(session.key_up("s"), Err(SessionError::Closed)));
        assert!(session.shutdown());
    }
}
