use anyhow::{Context, Result};
use keytouch_core::Hotkey;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Arguments of the last `start`, replayed by `qs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickStart {
    pub filename: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub focus_gating: bool,
    #[serde(default = "default_keepalive_ms")]
    pub keepalive_ms: u64,
    #[serde(default)]
    pub quit_hotkey: Hotkey,
}

fn default_keepalive_ms() -> u64 {
    50
}

pub fn load(path: &Path) -> Result<Option<QuickStart>> {
    if !path.exists() {
        return Ok(None);
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let qs = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(qs))
}

pub fn save(path: &Path, qs: &QuickStart) -> Result<()> {
    let content = serde_json::to_string_pretty(qs)?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(&dir.path().join("quickstart.json")).unwrap(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickstart.json");
        let qs = QuickStart {
            filename: "game".into(),
            target: Some("Game.exe".into()),
            focus_gating: true,
            keepalive_ms: 30,
            quit_hotkey: "ctrl+shift+x".parse().unwrap(),
        };
        save(&path, &qs).unwrap();
        assert_eq!(load(&path).unwrap(), Some(qs));
    }

    #[test]
    fn test_minimal_record_gets_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickstart.json");
        std::fs::write(&path, r#"{"filename": "game.txt", "target": "game"}"#).unwrap();
        let qs = load(&path).unwrap().unwrap();
        assert_eq!(qs.filename, "game.txt");
        assert_eq!(qs.keepalive_ms, 50);
        assert_eq!(qs.quit_hotkey, Hotkey::default());
        assert!(!qs.focus_gating);
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quickstart.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(load(&path).is_err());
    }
}
