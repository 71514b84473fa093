use crate::injector::TouchPlatform;
use crate::session::Shared;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use tracing::{debug, error};

/// Re-submit the active table every interval until it empties, the session
/// closes, or the stop channel disconnects.
pub(crate) fn run<P: TouchPlatform>(shared: Arc<Shared<P>>, stop: Receiver<()>) {
    debug!("Keep-alive started ({:?})", shared.interval);
    loop {
        match stop.recv_timeout(shared.interval) {
            Err(RecvTimeoutError::Timeout) => {}
            _ => break,
        }

        let mut state = shared.state.lock();
        if state.closed {
            state.keepalive_running = false;
            break;
        }
        match state.machine.refresh() {
            Ok(true) => {}
            Ok(false) => {
                state.keepalive_running = false;
                break;
            }
            Err(e) => {
                // the next event reports it and the dispatcher tears down
                error!("Keep-alive stopped: {}", e);
                state.keepalive_running = false;
                state.closed = true;
                state.failure = Some(e);
                break;
            }
        }
    }
    debug!("Keep-alive stopped");
}
