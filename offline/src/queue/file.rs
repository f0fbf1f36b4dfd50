use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::record::Collection;
use super::store::StoreBackend;
use crate::config::StoreConfig;
use crate::error::StoreError;

/// File-per-collection backend: `<root>/<database>/<collection>.bin`.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the database directory under `root`.
    pub fn open(root: impl AsRef<Path>, config: &StoreConfig) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(&config.database);
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Database directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.bin", collection.as_str()))
    }
}

impl StoreBackend for FileBackend {
    fn load(&self, collection: Collection) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path(collection)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, collection: Collection, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.path(collection);
        let tmp = target.with_extension("bin.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &target)?;
        Ok(())
    }
}
