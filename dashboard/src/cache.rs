use crate::model::{Category, Entry, MovementKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Snapshots JSON por usuario de las últimas listas confirmadas. Se escriben
/// solo tras una recarga exitosa y se leen una vez al abrir sesión; un archivo
/// ausente o ilegible equivale a un arranque en frío.
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<SnapshotCache> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(SnapshotCache { dir })
    }

    pub fn movements(&self, user_id: Uuid, kind: MovementKind) -> Option<Vec<Entry>> {
        self.read(&self.file(user_id, kind.path()))
    }

    pub fn store_movements(
        &self,
        user_id: Uuid,
        kind: MovementKind,
        entries: &[Entry],
    ) -> io::Result<()> {
        self.write(&self.file(user_id, kind.path()), &entries)
    }

    pub fn categories(&self, user_id: Uuid) -> Option<Vec<Category>> {
        self.read(&self.file(user_id, "categorias"))
    }

    pub fn store_categories(&self, user_id: Uuid, categories: &[Category]) -> io::Result<()> {
        self.write(&self.file(user_id, "categorias"), &categories)
    }

    fn file(&self, user_id: Uuid, name: &str) -> PathBuf {
        self.dir.join(format!("{user_id}-{name}.json"))
    }

    fn read<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        let raw = fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write<T: Serialize>(&self, path: &Path, value: &T) -> io::Result<()> {
        let raw = serde_json::to_string(value)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        fs::write(path, raw)
    }
}
