//! Last entered form, kept between runs.

use input::Form;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// TOML file holding the last submitted or checked form.
#[derive(Debug, Clone)]
pub struct FormCache {
    path: PathBuf,
}

impl FormCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached form, or an empty one if there is none.
    ///
    /// An unreadable cache is logged and ignored.
    pub fn load(&self) -> Form {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Form::default(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read form cache");
                return Form::default();
            }
        };

        match toml::from_str(&contents) {
            Ok(form) => form,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring malformed form cache");
                Form::default()
            }
        }
    }

    pub fn save(&self, form: &Form) -> eyre::Result<()> {
        let contents = toml::to_string(form)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Form cached");
        Ok(())
    }

    /// Remove the cache. Returns false if there was nothing to remove.
    pub fn clear(&self) -> eyre::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
