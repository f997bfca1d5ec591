//! [maxp](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6maxp.html) table implementation.
use crate::{FontMetaError, buffer::FontBufReader};

/// The part of the maximum profile table every version shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Maxp {
    /// 0x00005000 for CFF fonts, 0x00010000 for TrueType; not validated
    version: u32,

    /// The number of glyphs in the font
    num_glyphs: u16,
}

impl Maxp {
    pub fn from_table(data: &[u8]) -> Result<Self, FontMetaError> {
        let reader = FontBufReader::new(data);

        Ok(Self {
            version: reader.read_u32_at(0)?,
            num_glyphs: reader.read_u16_at(4)?,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }
}
