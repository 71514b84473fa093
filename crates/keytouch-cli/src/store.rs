use anyhow::{bail, Context, Result};
use keytouch_core::{load_mapping, render_mapping, MappingTable};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

const MAPPING_EXT: &str = "txt";

/// The data directory: `mappings/*.txt` plus `quickstart.json`.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn mappings_dir(&self) -> PathBuf {
        self.root.join("mappings")
    }

    pub fn quickstart_path(&self) -> PathBuf {
        self.root.join("quickstart.json")
    }

    /// `name` with or without the `.txt` suffix.
    pub fn mapping_path(&self, name: &str) -> PathBuf {
        let name = name.trim();
        let file = if Path::new(name).extension().is_some_and(|e| e == MAPPING_EXT) {
            name.to_string()
        } else {
            format!("{}.{}", name, MAPPING_EXT)
        };
        self.mappings_dir().join(file)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.mapping_path(name).is_file()
    }

    /// Mapping names, sorted, without the suffix.
    pub fn list(&self) -> Result<Vec<String>> {
        let dir = self.mappings_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir).with_context(|| format!("reading {}", dir.display()))? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == MAPPING_EXT) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn load(&self, name: &str) -> Result<MappingTable> {
        let path = self.mapping_path(name);
        load_mapping(&path).with_context(|| format!("loading mapping {}", name))
    }

    /// Write a new mapping file. An existing file is never replaced.
    pub fn save(&self, name: &str, table: &MappingTable) -> Result<PathBuf> {
        let path = self.mapping_path(name);
        if path.exists() {
            bail!("mapping {} already exists", path.display());
        }
        std::fs::create_dir_all(self.mappings_dir())
            .with_context(|| format!("creating {}", self.mappings_dir().display()))?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("creating {}", path.display()))?;
        file.write_all(render_mapping(table).as_bytes())?;
        info!("Saved {} entries to {}", table.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keytouch_core::{KeyId, Point};

    #[test]
    fn test_suffix_is_optional() {
        let store = Store::new("/data");
        assert_eq!(store.mapping_path("game"), store.mapping_path("game.txt"));
        assert!(store.mapping_path("game").ends_with("mappings/game.txt"));
    }

    #[test]
    fn test_save_list_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(store.list().unwrap().is_empty());

        let table: MappingTable = [(KeyId::atom("a"), Point::new(1, 2))].into_iter().collect();
        store.save("beta", &table).unwrap();
        store.save("alpha.txt", &table).unwrap();
        std::fs::write(store.mappings_dir().join("notes.md"), "x").unwrap();

        assert_eq!(store.list().unwrap(), vec!["alpha", "beta"]);
        assert!(store.exists("alpha"));
        assert_eq!(store.load("beta").unwrap(), table);
    }

    #[test]
    fn test_save_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let table = MappingTable::new();
        store.save("m", &table).unwrap();
        assert!(store.save("m", &table).is_err());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        std::fs::create_dir_all(store.mappings_dir()).unwrap();
        std::fs::write(store.mapping_path("bad"), "{'a': (1,}").unwrap();
        let err = store.load("bad").unwrap_err();
        assert!(format!("{:#}", err).contains("syntax error"));
    }
}
