/// Maps Windows virtual-key codes to the key names used in mapping files.
/// Names follow the US layout.
pub const VK_NAMES: &[(u32, &str)] = &[
    // Editing and whitespace
    (0x08, "backspace"),
    (0x09, "tab"),
    (0x0D, "enter"),
    (0x13, "pause"),
    (0x14, "caps lock"),
    (0x1B, "esc"),
    (0x20, "space"),
    (0x21, "page up"),
    (0x22, "page down"),
    (0x23, "end"),
    (0x24, "home"),
    (0x25, "left"),
    (0x26, "up"),
    (0x27, "right"),
    (0x28, "down"),
    (0x2D, "insert"),
    (0x2E, "delete"),
    // Digits row
    (0x30, "0"),
    (0x31, "1"),
    (0x32, "2"),
    (0x33, "3"),
    (0x34, "4"),
    (0x35, "5"),
    (0x36, "6"),
    (0x37, "7"),
    (0x38, "8"),
    (0x39, "9"),
    // Letters
    (0x41, "a"),
    (0x42, "b"),
    (0x43, "c"),
    (0x44, "d"),
    (0x45, "e"),
    (0x46, "f"),
    (0x47, "g"),
    (0x48, "h"),
    (0x49, "i"),
    (0x4A, "j"),
    (0x4B, "k"),
    (0x4C, "l"),
    (0x4D, "m"),
    (0x4E, "n"),
    (0x4F, "o"),
    (0x50, "p"),
    (0x51, "q"),
    (0x52, "r"),
    (0x53, "s"),
    (0x54, "t"),
    (0x55, "u"),
    (0x56, "v"),
    (0x57, "w"),
    (0x58, "x"),
    (0x59, "y"),
    (0x5A, "z"),
    // Numpad
    (0x60, "num 0"),
    (0x61, "num 1"),
    (0x62, "num 2"),
    (0x63, "num 3"),
    (0x64, "num 4"),
    (0x65, "num 5"),
    (0x66, "num 6"),
    (0x67, "num 7"),
    (0x68, "num 8"),
    (0x69, "num 9"),
    (0x6A, "num *"),
    (0x6B, "num +"),
    (0x6D, "num -"),
    (0x6E, "num ."),
    (0x6F, "num /"),
    // Function keys
    (0x70, "f1"),
    (0x71, "f2"),
    (0x72, "f3"),
    (0x73, "f4"),
    (0x74, "f5"),
    (0x75, "f6"),
    (0x76, "f7"),
    (0x77, "f8"),
    (0x78, "f9"),
    (0x79, "f10"),
    (0x7A, "f11"),
    (0x7B, "f12"),
    // Modifiers (the low-level hook reports sided codes)
    (0xA0, "shift"),
    (0xA1, "right shift"),
    (0xA2, "ctrl"),
    (0xA3, "right ctrl"),
    (0xA4, "alt"),
    (0xA5, "right alt"),
    // OEM punctuation
    (0xBA, ";"),
    (0xBB, "="),
    (0xBC, ","),
    (0xBD, "-"),
    (0xBE, "."),
    (0xBF, "/"),
    (0xC0, "`"),
    (0xDB, "["),
    (0xDC, "\\"),
    (0xDD, "]"),
    (0xDE, "'"),
];

pub fn vk_to_key_name(vk: u32) -> Option<&'static str> {
    VK_NAMES
        .iter()
        .find(|(code, _)| *code == vk)
        .map(|(_, name)| *name)
}

pub fn key_name_to_vk(name: &str) -> Option<u32> {
    let name = normalize_key_name(name);
    VK_NAMES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

/// Lower-cases a key name and folds common aliases onto the canonical spelling.
pub fn normalize_key_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.as_str() {
        "escape" => "esc".to_string(),
        "return" => "enter".to_string(),
        "control" | "left ctrl" => "ctrl".to_string(),
        "left shift" => "shift".to_string(),
        "left alt" => "alt".to_string(),
        "del" => "delete".to_string(),
        "ins" => "insert".to_string(),
        "pgup" => "page up".to_string(),
        "pgdn" => "page down".to_string(),
        _ => lower,
    }
}
