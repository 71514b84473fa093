pub mod allocator;
pub mod chord_engine;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod injector;
mod keepalive;
pub mod keymap;
pub mod mapping;
pub mod parser;
pub mod session;
pub mod types;

#[cfg(windows)]
pub mod cursor;
#[cfg(windows)]
pub mod focus;
#[cfg(windows)]
pub mod keyboard_hook;
#[cfg(windows)]
pub mod touch_injection;

pub use config::SessionConfig;
pub use dispatcher::run_session;
pub use engine::ContactStateMachine;
pub use error::{HotkeyError, InjectError, MappingError, SessionError};
pub use injector::{FocusProbe, FrameOutcome, TouchInjector, TouchPlatform};
pub use mapping::MappingTable;
pub use parser::{load_mapping, parse_mapping, render_mapping};
pub use session::Session;
pub use types::{
    Chord, Contact, ContactRecord, Hotkey, KeyEdge, KeyEvent, KeyId, ListenerEvent, Point,
    PointerFlags,
};
