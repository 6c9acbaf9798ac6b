//! Memory-mapped run files.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;

use crate::error::Result;

/// A memory-mapped telemetry file.
///
/// Uses memmap2 to expose the file contents without loading them into
/// memory. The readout words are little-endian 32-bit values packed back
/// to back; a tail shorter than one word is ignored by the word iterator
/// and surfaces through [`RunFile::stray_tail_bytes`].
pub struct RunFile {
    mmap: Arc<Mmap>,
    path: PathBuf,
    label: String,
}

impl RunFile {
    /// Opens a file for memory-mapped reading.
    ///
    /// The file's base name becomes its provenance label.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or memory-mapped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and we assume it is not modified concurrently.
        // This is the standard safety contract for memory mapping.
        #[allow(unsafe_code)]
        let mmap = unsafe { Mmap::map(&file)? };
        let label = path.file_name().map_or_else(
            || path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        Ok(Self {
            mmap: Arc::new(mmap),
            path: path.to_path_buf(),
            label,
        })
    }

    /// The provenance label (the file's base name).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The path the file was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file contents as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap[..]
    }

    /// Returns the file size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Number of complete 32-bit words in the file.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.len() / 4
    }

    /// Bytes left over after the last complete word.
    #[must_use]
    pub fn stray_tail_bytes(&self) -> usize {
        self.len() % 4
    }

    /// Iterates over the complete little-endian words of the file.
    ///
    /// # Panics
    /// Panics if a chunk is not exactly 4 bytes. This should be
    /// unreachable because `chunks_exact(4)` guarantees each chunk length.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.as_bytes().chunks_exact(4).map(|chunk| {
            let bytes: [u8; 4] = chunk.try_into().unwrap();
            u32::from_le_bytes(bytes)
        })
    }
}
