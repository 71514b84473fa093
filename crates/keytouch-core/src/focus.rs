use crate::injector::FocusProbe;
use std::path::Path;
use windows::core::PWSTR;
use windows::Win32::Foundation::CloseHandle;
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
};

/// Matches the foreground window's executable stem or title against the
/// target, case-insensitively.
#[derive(Debug, Default)]
pub struct ForegroundProbe;

impl FocusProbe for ForegroundProbe {
    fn has_focus(&self, target: &str) -> bool {
        let target = target.trim().to_lowercase();
        let (exe, title) = foreground_window();
        let stem = exe.as_deref().and_then(|path| {
            Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
        });
        let target_stem = target.strip_suffix(".exe").unwrap_or(&target);
        stem.as_deref() == Some(target_stem) || title.map(|t| t.to_lowercase()) == Some(target)
    }
}

/// Executable path and title of the foreground window.
pub fn foreground_window() -> (Option<String>, Option<String>) {
    unsafe {
        let hwnd = GetForegroundWindow();
        if hwnd.0 == 0 {
            return (None, None);
        }

        let mut title_buf = [0u16; 512];
        let len = GetWindowTextW(hwnd, &mut title_buf);
        let title = (len > 0).then(|| String::from_utf16_lossy(&title_buf[..len as usize]));

        let mut pid = 0u32;
        GetWindowThreadProcessId(hwnd, Some(&mut pid));
        if pid == 0 {
            return (None, title);
        }
        let Ok(process) = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) else {
            return (None, title);
        };
        let mut path_buf = [0u16; 1024];
        let mut size = path_buf.len() as u32;
        let exe = QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            PWSTR(path_buf.as_mut_ptr()),
            &mut size,
        )
        .ok()
        .map(|_| String::from_utf16_lossy(&path_buf[..size as usize]));
        let _ = CloseHandle(process);
        (exe, title)
    }
}
