//! Multi-file decoding and aggregation.
//!
//! A run is a list of telemetry files decoded with one configuration and
//! one calibration. Aggregation appends the per-file tables in the order
//! the files were given, merges their diagnostics, and keeps a newline
//! separated provenance string naming every source file.

use std::path::Path;

use log::{info, warn};
use multigrid_calib::Calibration;
use multigrid_core::{CoincidenceTable, DecodeDiagnostics};
use multigrid_mesytec::{DecodeOutput, DecoderConfig, EventClusterer};
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::source::RunFile;

/// One decoded file, before aggregation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecodedFile {
    /// Provenance label (the file's base name).
    pub label: String,
    /// Events clustered from this file.
    pub table: CoincidenceTable,
    /// Counters for this file's word stream.
    pub diagnostics: DecodeDiagnostics,
}

/// Per-file summary kept alongside the aggregated output.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileReport {
    /// Provenance label of the source file.
    pub label: String,
    /// Events the file contributed.
    pub events: usize,
    /// Counters for the file's word stream.
    pub diagnostics: DecodeDiagnostics,
}

/// The combined result of decoding a run.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunOutput {
    /// All events, in file order then frame order.
    pub table: CoincidenceTable,
    /// Counters summed over every file.
    pub diagnostics: DecodeDiagnostics,
    /// Source labels, one per line, newline terminated.
    pub provenance: String,
    /// Per-file summaries, in decode order.
    pub files: Vec<FileReport>,
}

/// Decodes batches of telemetry files against one configuration and
/// calibration.
///
/// The calibration coverage is checked once at construction, so a run
/// never fails halfway through on a missing geometry.
pub struct FileAggregator {
    config: DecoderConfig,
    calibration: Calibration,
}

impl FileAggregator {
    /// Creates an aggregator, validating the configuration against the
    /// calibration.
    ///
    /// # Errors
    /// Fails if a selected geometry has no compiled calibration tables.
    pub fn new(config: DecoderConfig, calibration: Calibration) -> Result<Self> {
        EventClusterer::new(&config, &calibration)?;
        Ok(Self {
            config,
            calibration,
        })
    }

    /// The decoder configuration.
    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// The shared calibration.
    #[must_use]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Decodes one in-memory buffer of packed little-endian words.
    ///
    /// A tail shorter than one word is counted, not decoded.
    ///
    /// # Errors
    /// Fails if a selected geometry has no compiled calibration tables.
    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<DecodeOutput> {
        let mut clusterer = EventClusterer::new(&self.config, &self.calibration)?;
        for chunk in bytes.chunks_exact(4) {
            let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            clusterer.process_word(word);
        }
        let mut output = clusterer.finish();
        output.diagnostics.stray_tail_bytes += (bytes.len() % 4) as u64;
        Ok(output)
    }

    /// Opens and decodes one telemetry file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or the decoder cannot be set up.
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> Result<DecodedFile> {
        let run = RunFile::open(path)?;
        let output = self.decode_bytes(run.as_bytes())?;
        if !output.diagnostics.is_clean() {
            warn!("{}: {}", run.label(), output.diagnostics);
        }
        Ok(DecodedFile {
            label: run.label().to_owned(),
            table: output.table,
            diagnostics: output.diagnostics,
        })
    }

    /// Decodes the files one after another and aggregates them in order.
    ///
    /// # Errors
    /// Fails on the first file that cannot be read.
    pub fn decode_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<RunOutput> {
        let decoded = paths
            .iter()
            .map(|path| self.decode_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::assemble(&decoded))
    }

    /// Decodes the files on the rayon pool, then aggregates them in the
    /// order they were given. The output is identical to
    /// [`FileAggregator::decode_files`].
    ///
    /// # Errors
    /// Fails if any file cannot be read.
    pub fn decode_files_parallel<P: AsRef<Path> + Sync>(&self, paths: &[P]) -> Result<RunOutput> {
        let decoded = paths
            .par_iter()
            .map(|path| self.decode_file(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::assemble(&decoded))
    }

    fn assemble(decoded: &[DecodedFile]) -> RunOutput {
        let total_events = decoded.iter().map(|file| file.table.len()).sum();
        let mut table = CoincidenceTable::with_capacity(total_events);
        let mut diagnostics = DecodeDiagnostics::default();
        let mut provenance = String::new();
        let mut files = Vec::with_capacity(decoded.len());

        for file in decoded {
            table.append(&file.table);
            diagnostics.merge(&file.diagnostics);
            provenance.push_str(&file.label);
            provenance.push('\n');
            files.push(FileReport {
                label: file.label.clone(),
                events: file.table.len(),
                diagnostics: file.diagnostics,
            });
        }

        info!(
            "aggregated {} files into {} events ({diagnostics})",
            files.len(),
            table.len()
        );
        RunOutput {
            table,
            diagnostics,
            provenance,
            files,
        }
    }
}
