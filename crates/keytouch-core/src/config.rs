use crate::types::Hotkey;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Period of the keep-alive refresh while any contact is held.
    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,
    /// Half the side of the square contact area, in pixels.
    #[serde(default = "default_contact_radius")]
    pub contact_radius: i32,
    #[serde(default)]
    pub quit_hotkey: Hotkey,
    /// Application that should receive the touches.
    #[serde(default)]
    pub target: Option<String>,
    /// Drop frames while `target` is not in the foreground.
    #[serde(default)]
    pub focus_gating: bool,
    /// Bound of the listener -> dispatcher queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_keepalive_ms() -> u64 {
    50
}

fn default_contact_radius() -> i32 {
    5
}

fn default_channel_capacity() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keepalive_ms: default_keepalive_ms(),
            contact_radius: default_contact_radius(),
            quit_hotkey: Hotkey::default(),
            target: None,
            focus_gating: false,
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl SessionConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_ms.max(1))
    }

    /// The target to gate on, if gating is enabled and a target was given.
    pub fn gated_target(&self) -> Option<&str> {
        if !self.focus_gating {
            return None;
        }
        self.target.as_deref().filter(|t| !t.trim().is_empty())
    }
}
