use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tx_core::{LocalStateError, LocalStateStore};

/// Merge profundo: objetos se combinan clave a clave, el resto se reemplaza.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(dst), Value::Object(src)) => {
            for (k, v) in src {
                match dst.get_mut(&k) {
                    Some(existing) => merge_json(existing, v),
                    None => {
                        dst.insert(k, v);
                    }
                }
            }
        }
        (slot, patch) => *slot = patch,
    }
}

#[derive(Default)]
pub struct InMemoryLocalState {
    entries: Mutex<Map<String, Value>>,
}

impl InMemoryLocalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }
}

impl LocalStateStore for InMemoryLocalState {
    fn merge(&self, key: &str, patch: Value) -> Result<(), LocalStateError> {
        let mut entries = self.entries.lock();
        let slot = entries.entry(key.to_string()).or_insert(Value::Null);
        merge_json(slot, patch);
        Ok(())
    }
}

/// Estado local en un archivo JSON (un objeto con una entrada por clave).
///
/// Cada merge escribe un temporal en el mismo directorio y lo renombra sobre
/// el archivo, de modo que un corte a mitad de escritura deja la versión
/// anterior intacta. Un archivo ilegible se aparta como `<archivo>.corrupt`
/// y el siguiente merge parte de cero.
pub struct JsonFileLocalState {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileLocalState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(),
               lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LocalStateError {
        LocalStateError::Io { path: self.path.clone(),
                              source }
    }

    fn load(&self) -> Result<Map<String, Value>, LocalStateError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        let value = serde_json::from_str(&raw).map_err(|source| LocalStateError::Parse { path: self.path.clone(),
                                                                                          source })?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(LocalStateError::NotAnObject(self.path.clone())),
        }
    }

    /// Carga el estado; si el archivo está corrupto lo aparta y empieza vacío.
    fn load_or_recover(&self) -> Result<Map<String, Value>, LocalStateError> {
        match self.load() {
            Err(e) if e.is_corrupt() => {
                let aside = self.corrupt_path();
                warn!("local state unreadable path={} err={} moved_to={}", self.path.display(), e, aside.display());
                fs::rename(&self.path, &aside).map_err(|e| self.io_error(e))?;
                Ok(Map::new())
            }
            other => other,
        }
    }

    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".corrupt");
        PathBuf::from(name)
    }

    fn store(&self, entries: Map<String, Value>) -> Result<(), LocalStateError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        serde_json::to_writer_pretty(&mut tmp, &Value::Object(entries))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, LocalStateError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.get(key).cloned())
    }
}

impl LocalStateStore for JsonFileLocalState {
    fn merge(&self, key: &str, patch: Value) -> Result<(), LocalStateError> {
        let _guard = self.lock.lock();
        let mut entries = self.load_or_recover()?;
        let slot = entries.entry(key.to_string()).or_insert(Value::Null);
        merge_json(slot, patch);
        self.store(entries)
    }
}
