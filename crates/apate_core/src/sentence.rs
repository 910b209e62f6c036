//! Raw recorded sentences.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of transport-format text exactly as recorded in a trace
///
/// The text is opaque at this layer; trailing whitespace has already been
/// stripped by the trace reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSentence(String);

impl RawSentence {
    /// Wrap recorded text
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Borrow the recorded text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the recorded text is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RawSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RawSentence {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for RawSentence {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl AsRef<str> for RawSentence {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
