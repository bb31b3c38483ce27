use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// A configuration file that is only read when a section is first asked for.
///
/// Sections are deserialized one at a time and are not validated, so a file
/// holding just `[session]` is enough for a caller that only needs a session.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    raw: OnceLock<config::Config>,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            raw: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file has been read yet.
    pub fn is_loaded(&self) -> bool {
        self.raw.get().is_some()
    }

    /// Deserializes one top-level section, reading the file on first use.
    pub fn section<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let raw = match self.raw.get() {
            Some(raw) => raw,
            None => {
                let loaded = crate::read_file(&self.path)?;
                self.raw.get_or_init(|| loaded)
            }
        };
        Ok(raw.get::<T>(name)?)
    }
}
