use std::fmt;

/// Zero-padded numeric code naming one card.
///
/// The padded form is used verbatim in file names and in the encoded URL
/// path segment, so it must stay free of separators and whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Format a numeric value as a fixed-width identifier.
    pub fn new(value: u32, digits: usize) -> Self {
        Self(format!("{value:0digits$}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive identifier range, in ascending numeric order.
pub fn id_range(start: u32, end: u32, digits: usize) -> impl Iterator<Item = Identifier> {
    (start..=end).map(move |value| Identifier::new(value, digits))
}
