//! Temporary audio files handed from the worker to its caller

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use tempfile::TempPath;

/// File name prefix of synthesized clips
pub const ARTIFACT_PREFIX: &str = "GoogleHomeSound";

/// File name suffix of synthesized clips
pub const ARTIFACT_SUFFIX: &str = ".wav";

/// A synthesized clip on disk
///
/// The caller that receives an artifact owns the file: it is removed by
/// [`AudioArtifact::close`] or, failing that, when the value is dropped.
/// Either way the file is deleted exactly once.
pub struct AudioArtifact {
    path: TempPath,
    len: usize,
}

impl AudioArtifact {
    /// Write `bytes` verbatim to a fresh temporary file in the system temp dir
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be created or written
    pub fn create(bytes: &[u8]) -> io::Result<Self> {
        Self::create_in(&std::env::temp_dir(), bytes)
    }

    /// Write `bytes` verbatim to a fresh temporary file in `dir`
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be created or written
    pub fn create_in(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(ARTIFACT_PREFIX)
            .suffix(ARTIFACT_SUFFIX)
            .tempfile_in(dir)?;

        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            path: file.into_temp_path(),
            len: bytes.len(),
        })
    }

    /// Location of the clip
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the clip in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the clip is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the clip now, reporting failure
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be removed
    pub fn close(self) -> io::Result<()> {
        self.path.close()
    }
}

impl fmt::Debug for AudioArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioArtifact")
            .field("path", &self.path.display())
            .field("len", &self.len)
            .finish()
    }
}
