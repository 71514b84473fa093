use crate::error::SessionError;
use crate::keymap::vk_to_key_name;
use crate::types::{Hotkey, KeyEvent, ListenerEvent, Modifiers};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetMessageW, PeekMessageW, PostThreadMessageW,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, KBDLLHOOKSTRUCT, LLKHF_INJECTED,
    MSG, PEEK_MESSAGE_REMOVE_TYPE, WH_KEYBOARD_LL, WM_KEYDOWN, WM_KEYUP, WM_QUIT, WM_SYSKEYDOWN,
    WM_SYSKEYUP,
};

struct HookTarget {
    sender: Sender<ListenerEvent>,
    quit: Hotkey,
}

lazy_static::lazy_static! {
    static ref TARGET: Mutex<Option<HookTarget>> = Mutex::new(None);
}

/// A global low-level keyboard hook running on its own message-loop thread.
///
/// Key transitions are forwarded without blocking the hook; the quit hotkey
/// is swallowed and reported as [`ListenerEvent::Quit`]. Only one listener
/// can be installed per process.
pub struct KeyboardListener {
    thread_id: u32,
    handle: Option<JoinHandle<()>>,
}

impl KeyboardListener {
    pub fn install(sender: Sender<ListenerEvent>, quit: Hotkey) -> Result<Self, SessionError> {
        {
            let mut target = TARGET.lock();
            if target.is_some() {
                return Err(SessionError::Listener("a listener is already installed".into()));
            }
            *target = Some(HookTarget { sender, quit });
        }

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<u32, String>>(1);
        let spawned = std::thread::Builder::new()
            .name("keytouch-hook".to_string())
            .spawn(move || hook_thread(ready_tx));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                TARGET.lock().take();
                return Err(SessionError::Listener(e.to_string()));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => Ok(Self {
                thread_id,
                handle: Some(handle),
            }),
            Ok(Err(message)) => {
                let _ = handle.join();
                Err(SessionError::Listener(message))
            }
            Err(_) => {
                let _ = handle.join();
                TARGET.lock().take();
                Err(SessionError::Listener("hook thread exited during setup".into()))
            }
        }
    }

    /// Install with a fresh bounded queue and hand back its receiving end.
    pub fn channel(
        capacity: usize,
        quit: Hotkey,
    ) -> Result<(Self, Receiver<ListenerEvent>), SessionError> {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Ok((Self::install(tx, quit)?, rx))
    }

    /// Unhook and wait for the message loop to exit. Dropping the sender
    /// disconnects the dispatcher's channel.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        unsafe {
            if let Err(e) = PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                warn!("Failed to post quit to hook thread: {}", e);
            }
        }
        if handle.join().is_err() {
            error!("Hook thread panicked");
        }
    }
}

impl Drop for KeyboardListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn hook_thread(ready: Sender<Result<u32, String>>) {
    let mut msg = MSG::default();
    let thread_id = unsafe {
        // make sure the thread has a queue before anyone posts to it
        let _ = PeekMessageW(&mut msg, None, 0, 0, PEEK_MESSAGE_REMOVE_TYPE(0));
        GetCurrentThreadId()
    };

    let installed =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0) };
    let hook = match installed {
        Ok(hook) if !hook.is_invalid() => hook,
        Ok(_) => {
            TARGET.lock().take();
            let _ = ready.send(Err("SetWindowsHookExW returned an invalid handle".into()));
            return;
        }
        Err(e) => {
            TARGET.lock().take();
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };
    info!("Keyboard hook installed. Handle: {:?}", hook);
    let _ = ready.send(Ok(thread_id));

    unsafe {
        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        let _ = UnhookWindowsHookEx(hook);
    }
    TARGET.lock().take();
    info!("Keyboard hook uninstalled.");
}

fn key_held(vk: u16) -> bool {
    unsafe { GetAsyncKeyState(vk as i32) as u16 & 0x8000 != 0 }
}

fn held_modifiers() -> Modifiers {
    Modifiers {
        ctrl: key_held(VK_CONTROL.0),
        shift: key_held(VK_SHIFT.0),
        alt: key_held(VK_MENU.0),
        win: key_held(VK_LWIN.0) || key_held(VK_RWIN.0),
    }
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    if kbd.flags.0 & LLKHF_INJECTED.0 != 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let msg = wparam.0 as u32;
    let down = msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN;
    let up = msg == WM_KEYUP || msg == WM_SYSKEYUP;
    let Some(name) = vk_to_key_name(kbd.vkCode).filter(|_| down || up) else {
        return CallNextHookEx(None, code, wparam, lparam);
    };

    let target = TARGET.lock();
    let Some(target) = target.as_ref() else {
        return CallNextHookEx(None, code, wparam, lparam);
    };

    if down && target.quit.matches(name, held_modifiers()) {
        if let Err(e) = target.sender.try_send(ListenerEvent::Quit) {
            warn!("Quit hotkey not delivered: {}", e);
        }
        return LRESULT(1);
    }

    let event = if down {
        KeyEvent::down(name)
    } else {
        KeyEvent::up(name)
    };
    match target.sender.try_send(ListenerEvent::Key(event)) {
        Ok(()) => {}
        Err(TrySendError::Full(ev)) => warn!("Event queue full, dropped {:?}", ev),
        Err(TrySendError::Disconnected(_)) => debug!("Dispatcher gone, {} not forwarded", name),
    }

    CallNextHookEx(None, code, wparam, lparam)
}
