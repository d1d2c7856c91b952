use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::error::{Result, VectorizerError};

/// Exclusive lock on a store, held as a `<store>.lock` file
/// drop で必ず消す
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Take the lock, failing immediately if another writer holds it
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let mut name = store_path.as_os_str().to_owned();
        name.push(".lock");
        let path = PathBuf::from(name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => VectorizerError::store(format!(
                    "store is locked by another writer ({})",
                    path.display()
                )),
                _ => VectorizerError::store(format!("cannot create lock {}: {e}", path.display())),
            })?;
        // pid は調査用、書けなくてもロック自体は有効
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            warn!("cannot record pid in {}: {e}", path.display());
        }
        debug!("acquired {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to release {}: {e}", self.path.display());
        }
    }
}
