use crate::error::SessionError;
use crate::injector::TouchPlatform;
use crate::session::Session;
use crate::types::ListenerEvent;
use crossbeam_channel::Receiver;
use tracing::{debug, info};

/// Feed listener events into the session until the quit hotkey, a closed
/// channel, or a fatal error. The session is always shut down on return.
pub fn run_session<P: TouchPlatform + 'static>(
    session: &Session<P>,
    events: &Receiver<ListenerEvent>,
) -> Result<(), SessionError> {
    let result = loop {
        match events.recv() {
            Ok(ListenerEvent::Key(event)) => {
                debug!("{:?} {}", event.edge, event.key);
                if let Err(e) = session.handle(&event) {
                    break Err(e);
                }
            }
            Ok(ListenerEvent::Quit) => {
                info!("Quit hotkey pressed");
                break Ok(());
            }
            Err(_) => {
                info!("Listener closed");
                break Ok(());
            }
        }
    };
    session.shutdown();
    result
}
