//! Placement schemes understood by the authority

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named allocation/placement policy
///
/// Labels the client does not know are kept verbatim as [`Scheme::Other`] so
/// they can still be displayed. Only recognized schemes may be requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Scheme {
    FirstFit,
    NextFit,
    BestFit,
    WorstFit,
    Compaction,
    Other(String),
}

impl Scheme {
    pub const RECOGNIZED: [Scheme; 5] = [
        Scheme::FirstFit,
        Scheme::NextFit,
        Scheme::BestFit,
        Scheme::WorstFit,
        Scheme::Compaction,
    ];

    /// Interpret a label, accepting the short aliases used on the command line
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "first-fit" | "firstfit" | "first" | "ff" | "1" => Scheme::FirstFit,
            "next-fit" | "nextfit" | "next" | "nf" | "2" => Scheme::NextFit,
            "best-fit" | "bestfit" | "best" | "bf" | "3" => Scheme::BestFit,
            "worst-fit" | "worstfit" | "worst" | "wf" | "4" => Scheme::WorstFit,
            "compaction" | "compact" => Scheme::Compaction,
            _ => Scheme::Other(label.trim().to_string()),
        }
    }

    pub fn is_recognized(&self) -> bool {
        Self::RECOGNIZED.contains(self)
    }

    /// Comma-separated labels of every recognized scheme
    pub fn recognized_labels() -> String {
        Self::RECOGNIZED
            .iter()
            .map(Scheme::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn label(&self) -> &str {
        match self {
            Scheme::FirstFit => "first-fit",
            Scheme::NextFit => "next-fit",
            Scheme::BestFit => "best-fit",
            Scheme::WorstFit => "worst-fit",
            Scheme::Compaction => "compaction",
            Scheme::Other(label) => label,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for Scheme {
    fn from(label: String) -> Self {
        Scheme::from_label(&label)
    }
}

impl From<Scheme> for String {
    fn from(scheme: Scheme) -> Self {
        scheme.label().to_string()
    }
}
