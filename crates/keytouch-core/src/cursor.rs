use crate::types::Point;
use std::time::Duration;
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{GetAsyncKeyState, VK_LBUTTON};
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

const POLL: Duration = Duration::from_millis(10);

fn left_button_down() -> bool {
    unsafe { GetAsyncKeyState(VK_LBUTTON.0 as i32) as u16 & 0x8000 != 0 }
}

/// Block until the next left click and return the cursor position at press.
pub fn wait_for_click() -> windows::core::Result<Point> {
    // a button already down belongs to an earlier click
    while left_button_down() {
        std::thread::sleep(POLL);
    }
    while !left_button_down() {
        std::thread::sleep(POLL);
    }
    let mut pos = POINT::default();
    unsafe { GetCursorPos(&mut pos)? };
    while left_button_down() {
        std::thread::sleep(POLL);
    }
    Ok(Point::new(pos.x, pos.y))
}
