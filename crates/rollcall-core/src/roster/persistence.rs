use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use super::Roster;
use crate::{errors::Error, Result};

/// Storage port for the roster.
///
/// `load` returns `Ok(None)` when nothing has been saved yet; any `Err` is a
/// read or decode failure that the store turns into an empty roster.
pub trait RosterPersistence: Send + Sync {
    fn load(&self) -> Result<Option<Roster>>;
    fn save(&self, roster: &Roster) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Roster persisted as a single JSON file.
#[derive(Clone, Debug)]
pub struct JsonFileRoster {
    path: PathBuf,
}

impl JsonFileRoster {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RosterPersistence for JsonFileRoster {
    fn load(&self) -> Result<Option<Roster>> {
        let txt = match fs::read_to_string(&self.path) {
            Ok(txt) => txt,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Storage {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let roster: Roster = serde_json::from_str(&txt)?;
        Ok(Some(roster))
    }

    fn save(&self, roster: &Roster) -> Result<()> {
        let json = serde_json::to_string_pretty(roster)?;
        atomic_write(&self.path, json.as_bytes())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Write `data` to a temp file next to `path`, then rename it over `path`.
///
/// A crash mid-write leaves either the previous file or the new one, never a
/// truncated mix.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let storage_err = |source: io::Error| Error::Storage {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(storage_err)?;
    }

    // Same directory so the rename never crosses filesystems.
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(storage_err)?;
    tmp.write_all(data).map_err(storage_err)?;
    tmp.as_file().sync_all().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;

    Ok(())
}

/// Roster kept in memory; the persistence used by tests.
#[derive(Debug, Default)]
pub struct InMemoryRoster {
    saved: Mutex<Option<Roster>>,
    saves: Mutex<usize>,
    fail_saves: bool,
}

impl InMemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already-saved snapshot.
    pub fn with_roster(roster: Roster) -> Self {
        Self {
            saved: Mutex::new(Some(roster)),
            ..Self::default()
        }
    }

    /// Every `save` fails with a storage error.
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<Roster> {
        self.saved.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|g| *g).unwrap_or_default()
    }
}

impl RosterPersistence for InMemoryRoster {
    fn load(&self) -> Result<Option<Roster>> {
        Ok(self.snapshot())
    }

    fn save(&self, roster: &Roster) -> Result<()> {
        if self.fail_saves {
            return Err(Error::Storage {
                path: PathBuf::from("<memory>"),
                source: io::Error::new(io::ErrorKind::Other, "simulated write failure"),
            });
        }
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(roster.clone());
        }
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
