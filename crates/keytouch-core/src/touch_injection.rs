use crate::error::InjectError;
use crate::injector::TouchPlatform;
use crate::types::ContactRecord;
use tracing::trace;
use windows::Win32::Foundation::{POINT, RECT};
use windows::Win32::UI::Input::Pointer::{
    InitializeTouchInjection, InjectTouchInput, POINTER_FLAGS, POINTER_INFO, POINTER_TOUCH_INFO,
    TOUCH_FEEDBACK_DEFAULT,
};
use windows::Win32::UI::WindowsAndMessaging::PT_TOUCH;

const TOUCH_FLAG_NONE: u32 = 0x0;
/// Contact area, orientation and pressure.
const TOUCH_MASK_ALL: u32 = 0x7;

/// `InitializeTouchInjection` / `InjectTouchInput`.
#[derive(Debug, Default)]
pub struct WindowsTouchPlatform;

impl WindowsTouchPlatform {
    pub fn new() -> Self {
        Self
    }
}

fn touch_info(record: &ContactRecord) -> POINTER_TOUCH_INFO {
    POINTER_TOUCH_INFO {
        pointerInfo: POINTER_INFO {
            pointerType: PT_TOUCH,
            pointerId: record.pointer_id,
            pointerFlags: POINTER_FLAGS(record.flags.bits()),
            ptPixelLocation: POINT {
                x: record.point.x,
                y: record.point.y,
            },
            ..Default::default()
        },
        touchFlags: TOUCH_FLAG_NONE,
        touchMask: TOUCH_MASK_ALL,
        rcContact: RECT {
            left: record.area.left,
            top: record.area.top,
            right: record.area.right,
            bottom: record.area.bottom,
        },
        ..Default::default()
    }
}

impl TouchPlatform for WindowsTouchPlatform {
    fn begin(&mut self, max_contacts: u32) -> Result<(), InjectError> {
        unsafe { InitializeTouchInjection(max_contacts.clamp(1, 256), TOUCH_FEEDBACK_DEFAULT) }
            .map_err(|e| InjectError::Begin(e.to_string()))
    }

    fn submit(&mut self, frame: &[ContactRecord]) -> Result<(), InjectError> {
        let infos: Vec<POINTER_TOUCH_INFO> = frame.iter().map(touch_info).collect();
        trace!("InjectTouchInput with {} contacts", infos.len());
        unsafe { InjectTouchInput(&infos) }.map_err(|e| InjectError::Submit(e.to_string()))
    }
}
