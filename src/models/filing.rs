//! Listing entries and scored candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of filing a listing title refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocType {
    Rhp,
    Drhp,
    Addendum,
    Corrigendum,
    Other,
}

impl DocType {
    /// Classify a raw listing title.
    ///
    /// Markers are checked in fixed priority, not in textual order:
    /// corrigendum, addendum, drhp, rhp. `drhp` must be tested before `rhp`
    /// since the latter is a substring of the former.
    pub fn classify(title_raw: &str) -> Self {
        let lower = title_raw.to_lowercase();
        if lower.contains("corrigendum") {
            Self::Corrigendum
        } else if lower.contains("addendum") {
            Self::Addendum
        } else if lower.contains("drhp") {
            Self::Drhp
        } else if lower.contains("rhp") {
            Self::Rhp
        } else {
            Self::Other
        }
    }

    /// Selection priority; higher is preferred.
    pub fn priority(self) -> u8 {
        match self {
            Self::Rhp => 3,
            Self::Drhp => 2,
            Self::Addendum | Self::Corrigendum => 1,
            Self::Other => 0,
        }
    }

    /// Only prospectus documents can be chosen.
    pub fn is_selectable(self) -> bool {
        matches!(self, Self::Rhp | Self::Drhp)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rhp => "RHP",
            Self::Drhp => "DRHP",
            Self::Addendum => "ADDENDUM",
            Self::Corrigendum => "CORRIGENDUM",
            Self::Other => "OTHER",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One filing link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingEntry {
    /// Visible link text, never empty
    pub title: String,

    /// Absolute URL of the filing page
    pub url: String,
}

/// A company name as typed and in comparable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw: String,
    pub normalized: String,
}

/// A listing entry scored against the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub title_raw: String,
    pub title_normalized: String,
    pub url: String,
    pub doc_type: DocType,

    /// Similarity in `[0, 1]`, rounded to 4 decimals
    pub match_score: f64,
}
