//! Read-only metadata decoding for sfnt (TrueType / OpenType) fonts.
//!
//! The crate walks the table directory and decodes three tables out of an
//! in-memory font buffer: `name` (localized strings), `maxp` (glyph count)
//! and `cmap` format 4 (Unicode to glyph index). Every offset read from the
//! font is bounds-checked before it is used.
//!
//! ```no_run
//! use font_meta::FontDocument;
//!
//! # fn main() -> Result<(), font_meta::FontMetaError> {
//! let font = FontDocument::open("fonts/Example-Regular.ttf")?;
//! println!("{} by {}", font.font_family_name()?, font.designer_or_author()?);
//! println!("{} glyphs, {} mapped code points", font.glyph_count()?, font.cmap()?.len());
//! # Ok(())
//! # }
//! ```

use std::{io, path::PathBuf};

use buffer::BufReaderError;
use format::FontFormat;
use tables::TableEncodingError;
use thiserror::Error;

pub mod buffer;
pub mod font;
pub mod format;
pub mod options;
pub mod tables;

#[cfg(test)]
mod test_helpers;

pub use font::{FontDocument, UNKNOWN_FONT_NAME};
pub use format::{FontMetadata, LoadedFont};
pub use options::{FontOptions, NameFallback};
pub use tables::{
    Tag,
    cmap::CharMap,
    name::{NameEntry, NameId, PlatformId},
};

#[derive(Debug, Error)]
pub enum FontMetaError {
    #[error(transparent)]
    TableEncodingError(#[from] TableEncodingError),

    #[error(transparent)]
    BufReaderError(#[from] BufReaderError),

    #[error("Failed to read font file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{operation} is not supported for {format} fonts")]
    Unsupported {
        operation: &'static str,
        format: FontFormat,
    },
}

impl FontMetaError {
    /// The table-level error, if that is what this is.
    pub fn table_error(&self) -> Option<&TableEncodingError> {
        match self {
            Self::TableEncodingError(err) => Some(err),
            _ => None,
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::BufReaderError(BufReaderError::OutOfBounds { .. }))
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}
