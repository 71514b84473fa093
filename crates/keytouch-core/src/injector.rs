//! Frame submission towards the host touch-injection interface.
//!
//! [`TouchPlatform`] is the seam to the operating system; [`TouchInjector`]
//! layers the per-idle-period handshake, empty-frame suppression and optional
//! focus gating on top of it.

use crate::error::InjectError;
use crate::types::{Contact, ContactRecord, PointerFlags};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// The host touch-injection interface.
pub trait TouchPlatform: Send {
    /// One-time handshake before the first frame of an active period.
    fn begin(&mut self, max_contacts: u32) -> Result<(), InjectError>;

    /// Report one complete frame in a single call.
    fn submit(&mut self, frame: &[ContactRecord]) -> Result<(), InjectError>;
}

impl<T: TouchPlatform + ?Sized> TouchPlatform for Box<T> {
    fn begin(&mut self, max_contacts: u32) -> Result<(), InjectError> {
        (**self).begin(max_contacts)
    }

    fn submit(&mut self, frame: &[ContactRecord]) -> Result<(), InjectError> {
        (**self).submit(frame)
    }
}

/// Answers whether the named application currently has input focus.
pub trait FocusProbe: Send {
    fn has_focus(&self, target: &str) -> bool;
}

/// What happened to one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Submitted,
    /// Nothing to report; the platform was not called.
    Empty,
    /// The target application was not focused; the platform was not called.
    Unfocused,
    /// The platform rejected the frame.
    Failed,
}

struct FocusGate {
    target: String,
    probe: Box<dyn FocusProbe>,
}

pub struct TouchInjector<P> {
    platform: P,
    max_contacts: u32,
    radius: i32,
    idle: bool,
    gate: Option<FocusGate>,
    /// Pointer ids the platform was last told are down.
    live: HashSet<u32>,
}

impl<P: TouchPlatform> TouchInjector<P> {
    pub fn new(platform: P, max_contacts: u32, radius: i32) -> Self {
        Self {
            platform,
            max_contacts,
            radius,
            idle: true,
            gate: None,
            live: HashSet::new(),
        }
    }

    pub fn with_focus_gate(mut self, target: impl Into<String>, probe: Box<dyn FocusProbe>) -> Self {
        self.gate = Some(FocusGate {
            target: target.into(),
            probe,
        });
        self
    }

    /// True until the next handshake is due.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Submit the full contact table as one frame.
    ///
    /// Only a failed handshake is returned as an error; a rejected frame is
    /// logged and reported as [`FrameOutcome::Failed`]. While the focus gate
    /// is closed a frame still goes out if it ends a pointer the platform
    /// holds down.
    pub fn inject(&mut self, contacts: &[Contact]) -> Result<FrameOutcome, InjectError> {
        if contacts.is_empty() {
            return Ok(FrameOutcome::Empty);
        }

        if let Some(gate) = &self.gate {
            let ends_live = contacts
                .iter()
                .any(|c| c.flags.is_ending() && self.live.contains(&c.pointer_id));
            if !ends_live && !gate.probe.has_focus(&gate.target) {
                debug!("{} not focused, frame of {} dropped", gate.target, contacts.len());
                self.reset_if_natural_end(contacts);
                return Ok(FrameOutcome::Unfocused);
            }
        }

        if self.idle {
            self.platform.begin(self.max_contacts)?;
            info!("Touch injection initialised for {} contacts", self.max_contacts);
            self.idle = false;
        }

        let records: Vec<ContactRecord> = contacts.iter().map(|c| c.record(self.radius)).collect();
        let outcome = match self.platform.submit(&records) {
            Ok(()) => FrameOutcome::Submitted,
            Err(e) => {
                warn!("{}", e);
                FrameOutcome::Failed
            }
        };

        for c in contacts {
            if c.flags.is_ending() {
                self.live.remove(&c.pointer_id);
            } else {
                self.live.insert(c.pointer_id);
            }
        }
        self.reset_if_natural_end(contacts);

        Ok(outcome)
    }

    fn reset_if_natural_end(&mut self, contacts: &[Contact]) {
        if contacts.len() == 1 && contacts[0].flags == PointerFlags::NATURAL_END {
            self.idle = true;
            self.live.clear();
        }
    }
}
