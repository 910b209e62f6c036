//! Trace reader for recorded AIS sessions.
//!
//! A trace is line oriented: `<seconds>-<sentence>`. The line is split once
//! on the first `-`, so the sentence itself may contain further dashes.

use apate_core::{RawSentence, TraceTime};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Separator between the timestamp and the sentence
const SEPARATOR: char = '-';

/// Error while loading a trace
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The trace file does not exist
    #[error("trace file '{}' does not exist", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The trace could not be read
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not `<seconds>-<sentence>`
    #[error("trace not formatted correctly on line {line}: {reason}")]
    Format {
        /// 1-based line number
        line: usize,
        /// What was wrong with it
        reason: String,
    },
}

/// All sentences recorded at one timestamp, in recorded order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayEntry {
    /// Offset from trace start
    pub time: TraceTime,
    /// Sentences in the order they appear in the trace
    pub sentences: Vec<RawSentence>,
}

/// A parsed trace: timestamps in ascending order, each with its batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    entries: BTreeMap<TraceTime, Vec<RawSentence>>,
    sentence_count: usize,
}

impl Trace {
    /// Create an empty trace
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sentence to the batch at `time`
    pub fn push(&mut self, time: TraceTime, sentence: RawSentence) {
        self.entries.entry(time).or_default().push(sentence);
        self.sentence_count += 1;
    }

    /// Number of distinct timestamps
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no sentence was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total sentences across all timestamps
    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.sentence_count
    }

    /// Batch recorded at exactly `time`
    #[must_use]
    pub fn get(&self, time: TraceTime) -> Option<&[RawSentence]> {
        self.entries.get(&time).map(Vec::as_slice)
    }

    /// Last timestamp in the trace
    #[must_use]
    pub fn end_time(&self) -> Option<TraceTime> {
        self.entries.keys().next_back().copied()
    }

    /// Iterate batches in ascending timestamp order
    pub fn iter(&self) -> impl Iterator<Item = (TraceTime, &[RawSentence])> {
        self.entries.iter().map(|(time, batch)| (*time, batch.as_slice()))
    }
}

impl IntoIterator for Trace {
    type Item = ReplayEntry;
    type IntoIter = std::iter::Map<
        std::collections::btree_map::IntoIter<TraceTime, Vec<RawSentence>>,
        fn((TraceTime, Vec<RawSentence>)) -> ReplayEntry,
    >;

    fn into_iter(self) -> Self::IntoIter {
        let to_entry: fn((TraceTime, Vec<RawSentence>)) -> ReplayEntry =
            |(time, sentences)| ReplayEntry { time, sentences };
        self.entries.into_iter().map(to_entry)
    }
}

/// Reads traces from files, readers or strings
pub struct TraceReader;

impl TraceReader {
    /// Load the trace at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, unreadable or malformed
    pub fn open(path: impl AsRef<Path>) -> Result<Trace, TraceError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TraceError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a trace, stopping at the first malformed line
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure or the first malformed line
    pub fn read(reader: impl BufRead) -> Result<Trace, TraceError> {
        let mut trace = Trace::new();
        for (index, line) in reader.lines().enumerate() {
            let text = line.map_err(|err| match err.kind() {
                ErrorKind::InvalidData => TraceError::Format {
                    line: index + 1,
                    reason: "line is not valid UTF-8".to_string(),
                },
                _ => TraceError::Io(err),
            })?;
            let (time, sentence) = Self::parse_line(index + 1, &text)?;
            trace.push(time, sentence);
        }
        tracing::debug!(
            timestamps = trace.len(),
            sentences = trace.sentence_count(),
            "trace parsed"
        );
        Ok(trace)
    }

    /// Parse trace text held in memory
    ///
    /// # Errors
    ///
    /// Returns error on the first malformed line
    pub fn parse_str(text: &str) -> Result<Trace, TraceError> {
        Self::read(text.as_bytes())
    }

    /// Parse one line; `line` is 1-based and only used for errors
    ///
    /// # Errors
    ///
    /// Returns error if the separator is missing or the timestamp is invalid
    pub fn parse_line(line: usize, text: &str) -> Result<(TraceTime, RawSentence), TraceError> {
        let (seconds, sentence) = text.split_once(SEPARATOR).ok_or_else(|| TraceError::Format {
            line,
            reason: format!("missing '{}' separator", SEPARATOR),
        })?;
        let time = TraceTime::parse_secs(seconds).map_err(|err| TraceError::Format {
            line,
            reason: err.to_string(),
        })?;
        Ok((time, RawSentence::new(sentence.trim_end())))
    }
}
