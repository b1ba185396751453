//! Durable storage for the two audio artifacts.
//!
//! Only the latest recording and the latest echo are kept. Writes go to a
//! temporary file that is synced and renamed over the target, so a reader
//! holding the previous file never observes a partial write.

use crate::{CoreResult, SessionError};

use std::{
    fs,
    io::{self, Write},
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use tracing::{debug, instrument, warn};

/// Logical identity of a stored artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactName {
    /// The raw microphone recording.
    Recording,
    /// The server's echoed response.
    Echo,
}

impl ArtifactName {
    /// Logical name used in logs and errors.
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactName::Recording => "recording",
            ArtifactName::Echo => "echo",
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            ArtifactName::Recording => "recording.wav",
            ArtifactName::Echo => "echo.wav",
        }
    }
}

/// Directory-backed artifact store.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    #[track_caller]
    #[instrument]
    pub fn open(root: impl Into<PathBuf> + std::fmt::Debug) -> CoreResult<Self> {
        let root = root.into();

        fs::create_dir_all(&root).map_err(|source| SessionError::ArtifactWriteFailed {
            name: "store",
            source,
            location: ErrorLocation::from(Location::caller()),
        })?;

        debug!(root = ?root, "Artifact store opened");

        Ok(Self { root })
    }

    /// Directory holding the artifacts.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Physical location of an artifact.
    pub fn path(&self, name: ArtifactName) -> PathBuf {
        self.root.join(name.file_name())
    }

    /// Whether the artifact has been written at least once.
    pub fn exists(&self, name: ArtifactName) -> bool {
        self.path(name).is_file()
    }

    /// Replace an artifact's content atomically.
    #[track_caller]
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn write(&self, name: ArtifactName, bytes: &[u8]) -> CoreResult<()> {
        let location = Location::caller();
        let failed = |source| SessionError::ArtifactWriteFailed {
            name: name.as_str(),
            source,
            location: ErrorLocation::from(location),
        };

        let target = self.path(name);
        let temp_path = target.with_extension("wav.tmp");

        let written =
            write_synced(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &target));

        if let Err(source) = written {
            match fs::remove_file(&temp_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?temp_path, error = %e, "Temporary artifact left behind"),
            }
            return Err(failed(source));
        }

        debug!(artifact = name.as_str(), path = ?target, "Artifact written");

        Ok(())
    }

    /// Read an artifact's full content.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn read(&self, name: ArtifactName) -> CoreResult<Vec<u8>> {
        fs::read(self.path(name)).map_err(|source| SessionError::ArtifactReadFailed {
            name: name.as_str(),
            source,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
