//! Lookup policy for [`FontDocument`](crate::FontDocument).

use crate::tables::name::{NameId, NameKey, PlatformId, find_preferred};

/// An ordered chain of name ids, the first one present in the font wins.
///
/// This is presentation policy layered over the name table: the decoder
/// only answers "is there a record with this id", the chain decides which
/// ids to ask for and in what order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameFallback {
    chain: Vec<NameId>,
}

impl NameFallback {
    /// An empty chain is allowed, it always resolves to the missing text.
    pub fn new(chain: impl IntoIterator<Item = NameId>) -> Self {
        Self {
            chain: chain.into_iter().collect(),
        }
    }

    /// Designer, then Manufacturer.
    pub fn author() -> Self {
        Self::new([NameId::DESIGNER, NameId::MANUFACTURER])
    }

    pub fn chain(&self) -> &[NameId] {
        &self.chain
    }

    /// Walks the chain over `records` and returns the first hit.
    pub fn resolve<'r, R: NameKey>(&self, records: &'r [R], preferred: PlatformId) -> Option<&'r R> {
        self.chain
            .iter()
            .find_map(|id| find_preferred(records, id.0, preferred))
    }

    /// Text used when nothing in the chain matched, `Unknown Record #<id>`
    /// naming the head of the chain.
    pub fn missing_text(&self) -> String {
        match self.chain.first() {
            Some(id) => missing_record_text(id.0),
            None => "Unknown Record".to_string(),
        }
    }
}

impl Default for NameFallback {
    fn default() -> Self {
        Self::author()
    }
}

pub(crate) fn missing_record_text(name_id: u16) -> String {
    format!("Unknown Record #{name_id}")
}

/// Options controlling how a [`FontDocument`](crate::FontDocument) answers name queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontOptions {
    pub author_fallback: NameFallback,
    /// Platform preferred when several records share a name id
    pub preferred_platform: PlatformId,
    /// Keep decoded tables around after the first query
    pub memoize: bool,
}

impl FontOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author_fallback(mut self, fallback: NameFallback) -> Self {
        self.author_fallback = fallback;
        self
    }

    pub fn with_preferred_platform(mut self, platform: PlatformId) -> Self {
        self.preferred_platform = platform;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            author_fallback: NameFallback::default(),
            preferred_platform: PlatformId::Microsoft,
            memoize: true,
        }
    }
}
