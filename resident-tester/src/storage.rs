//! File-backed run storage: one JSON object mapping storage keys to blobs.
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use resident_game::RunStorage;

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> io::Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err),
        }
    }
}

impl RunStorage for JsonFileStorage {
    type Error = io::Error;

    fn load_blob(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.read_all()?.remove(key))
    }

    fn save_blob(&self, key: &str, value: &str) -> Result<(), Self::Error> {
        let mut blobs = self.read_all()?;
        blobs.insert(key.to_string(), value.to_string());
        let text = serde_json::to_string_pretty(&blobs)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resident_game::constants::SEED_HISTORY_KEY;
    use resident_game::{ResidentEngine, load_history};

    fn temp_file(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "resident-storage-{label}-{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let storage = JsonFileStorage::new(temp_file("missing"));
        assert!(storage.load_blob(SEED_HISTORY_KEY).unwrap().is_none());
    }

    #[test]
    fn history_survives_a_new_storage_handle() {
        let path = temp_file("persist");
        let engine = ResidentEngine::with_storage(JsonFileStorage::new(&path));
        engine.start_run(12345).unwrap();
        engine.start_run(23456).unwrap();

        let reopened = JsonFileStorage::new(&path);
        let history = load_history(&reopened).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.latest().unwrap().seed, 23456);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let path = temp_file("corrupt");
        std::fs::write(&path, "[1, 2").unwrap();
        let storage = JsonFileStorage::new(&path);
        assert_eq!(
            storage.load_blob(SEED_HISTORY_KEY).unwrap_err().kind(),
            io::ErrorKind::InvalidData
        );
        let _ = std::fs::remove_file(path);
    }
}
