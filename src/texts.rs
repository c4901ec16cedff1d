//! Card text lookup.
//!
//! Maps an identifier to its (title, subtitle) pair. The production table
//! ships built in; an external JSON table may replace it. Unmapped
//! identifiers fall back to one fixed default pair.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ident::Identifier;

pub const DEFAULT_TITLE: &str = "РАЗОМ";
pub const DEFAULT_SUBTITLE: &str = "30 секунд для себе";

/// Production card texts (seasonal run, identifiers 001-015).
static BUILTIN: &[(&str, &str, &str)] = &[
    ("001", "ТИХОГО РІЗДВА", "і ясної дороги"),
    ("002", "СВІТЛИХ СВЯТ", "у словах і тиші"),
    ("003", "МИРНОГО РІЗДВА", "і спокійного серця"),
    ("004", "РІЗДВА ЗЛАГОДИ", "і теплих слів"),
    ("005", "РІЗДВА СВІТЛА", "у простих речах"),
    ("006", "РІЗДВЯНОЇ ТИШІ", "для відновлення"),
    ("007", "СВЯТОЇ ПАУЗИ", "для себе"),
    ("008", "СВІТЛОЇ ОПОРИ", "на кожен день"),
    ("009", "ТИХОГО РИТМУ", "крок за кроком"),
    ("010", "СВІТЛО ПОРУЧ", "м’яко й повільно"),
    ("011", "РІЗДВА ДОВІРИ", "ми поруч"),
    ("012", "РІЗДВА СПІЛЬНОСТІ", "ти не сам(а)"),
    ("013", "РІЗДВА ПОЛЕГШЕННЯ", "день за днем"),
    ("014", "РІЗДВА ДОСТАТКУ", "саме стільки"),
    ("015", "РІЗДВА ТЕПЛА", "для видиху"),
];

/// One title/subtitle pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub title: String,
    pub subtitle: String,
}

/// Immutable identifier → text table with a default fallback.
#[derive(Debug, Clone)]
pub struct TextTable {
    entries: BTreeMap<String, CardText>,
}

impl TextTable {
    /// Table shipped with the binary.
    pub fn builtin() -> Self {
        let entries = BUILTIN
            .iter()
            .map(|(id, title, subtitle)| {
                (
                    (*id).to_string(),
                    CardText {
                        title: (*title).to_string(),
                        subtitle: (*subtitle).to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Load a replacement table from JSON of the form
    /// `{"001": ["title", "subtitle"], ...}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read text table {}", path.display()))?;
        let parsed: BTreeMap<String, (String, String)> = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse text table {}", path.display()))?;
        let entries = parsed
            .into_iter()
            .map(|(id, (title, subtitle))| (id, CardText { title, subtitle }))
            .collect();
        Ok(Self { entries })
    }

    /// Resolve the pair for an identifier, falling back to the defaults.
    pub fn lookup(&self, id: &Identifier) -> (&str, &str) {
        match self.entries.get(id.as_str()) {
            Some(text) => (&text.title, &text.subtitle),
            None => (DEFAULT_TITLE, DEFAULT_SUBTITLE),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
