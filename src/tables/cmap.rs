use std::collections::BTreeMap;

use log::{debug, trace, warn};

use crate::{FontMetaError, buffer::FontBufReader, tables::TableEncodingError};

/// A full code point to glyph index mapping.
pub type CharMap = BTreeMap<u32, u16>;

/// A representation of the [cmap table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
/// including methods to extract it's values safely.
/// Only format 4 subtables are decoded, that covers the Unicode BMP
/// mapping almost every font ships with.
#[derive(Debug)]
pub struct Cmap<'a> {
    /// The whole cmap table region, subtable offsets are relative to it
    data: &'a [u8],

    /// The version of the cmap table
    /// it's almost guarenteed to be set to zero
    version: u16,

    /// The encoding records, in table order
    subtables: Vec<CmapSub>,
}

impl<'a> Cmap<'a> {
    pub fn from_table(data: &'a [u8]) -> Result<Self, FontMetaError> {
        let mut reader = FontBufReader::new(data);
        let version = reader.read_u16()?;
        let num_subtables = reader.read_u16()?;

        let subtables = (0..num_subtables)
            .map(|_| CmapSub::from_reader(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            data,
            version,
            subtables,
        })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn subtables(&self) -> &[CmapSub] {
        &self.subtables
    }

    /// The first Windows Unicode subtable, BMP (3/1) or full repertoire (3/10).
    pub fn windows_unicode_subtable(&self) -> Option<&CmapSub> {
        self.subtables.iter().find(|sub| sub.is_windows_unicode())
    }

    /// Picks the Windows Unicode subtable and parses it as format 4.
    ///
    /// # Errors
    ///
    /// * `NoSuitableCmapSubtable` if there is no 3/1 or 3/10 record.
    /// * `UnsupportedCmapFormat(format)` if that subtable is not format 4.
    /// * `OutOfBounds` if the subtable lies outside the cmap table.
    pub fn format4(&self) -> Result<Format4<'a>, FontMetaError> {
        let sub = self
            .windows_unicode_subtable()
            .ok_or(TableEncodingError::NoSuitableCmapSubtable)?;

        debug!(
            "using cmap subtable {}/{} at offset {}",
            sub.platform_id, sub.platform_specific_id, sub.offset
        );

        let offset = sub.offset as usize;
        let data = FontBufReader::new(self.data)
            .read_bytes_at(offset, self.data.len().saturating_sub(offset))?;

        Format4::new(data)
    }

    /// Decodes the full code point to glyph index mapping.
    pub fn mappings(&self) -> Result<CharMap, FontMetaError> {
        self.format4()?.mappings()
    }
}

/// A representation of the cmap [sub table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6cmap.html)
/// encoding record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmapSub {
    /// The platform identifier
    pub platform_id: u16,

    /// The platform specific encoding identifier
    pub platform_specific_id: u16,

    /// The offset of the mapping table, from the start of the cmap table
    pub offset: u32,
}

impl CmapSub {
    fn from_reader(reader: &mut FontBufReader<'_>) -> Result<Self, FontMetaError> {
        Ok(Self {
            platform_id: reader.read_u16()?,
            platform_specific_id: reader.read_u16()?,
            offset: reader.read_u32()?,
        })
    }

    pub fn is_windows_unicode(&self) -> bool {
        self.platform_id == 3 && matches!(self.platform_specific_id, 1 | 10)
    }
}

/// One segment of a format 4 subtable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub start_code: u16,
    pub end_code: u16,
    pub id_delta: i16,
    pub id_range_offset: u16,
}

/// A format 4 "segment mapping to delta values" subtable.
///
/// Byte layout looks like this:
/// ```text
/// Header        : 14 bytes
/// End Code      : [u16; segcount]
///                 < 2 byte padding>
/// Start Code    : [u16; segcount]
/// ID Delta      : [i16; segcount]
/// ID Range Offs : [u16; segcount]
/// Glyph IDS     : remaining space
/// ```
#[derive(Debug)]
pub struct Format4<'a> {
    reader: FontBufReader<'a>,
    seg_count: usize,
}

impl<'a> Format4<'a> {
    const END_CODE_START: usize = 14;

    /// `data` starts at the subtable and runs to the end of the cmap table.
    pub fn new(data: &'a [u8]) -> Result<Self, FontMetaError> {
        let reader = FontBufReader::new(data);

        let format = reader.read_u16_at(0)?;
        if format != 4 {
            return Err(TableEncodingError::UnsupportedCmapFormat(format).into());
        }

        let seg_count = usize::from(reader.read_u16_at(6)? / 2);
        // the id range offset array is the last one we index directly
        reader.read_bytes_at(Self::END_CODE_START, seg_count * 8 + 2)?;

        Ok(Self { reader, seg_count })
    }

    /// Get the number of segments in the table, including the final sentinel
    pub fn seg_count(&self) -> usize {
        self.seg_count
    }

    fn start_code_start(&self) -> usize {
        Self::END_CODE_START + self.seg_count * 2 + 2 // two bytes of padding
    }

    fn id_delta_start(&self) -> usize {
        self.start_code_start() + self.seg_count * 2
    }

    fn id_range_offset_start(&self) -> usize {
        self.id_delta_start() + self.seg_count * 2
    }

    pub fn segment(&self, index: usize) -> Result<Segment, FontMetaError> {
        Ok(Segment {
            index,
            end_code: self.reader.read_u16_at(Self::END_CODE_START + index * 2)?,
            start_code: self.reader.read_u16_at(self.start_code_start() + index * 2)?,
            id_delta: self.reader.read_i16_at(self.id_delta_start() + index * 2)?,
            id_range_offset: self.reader.read_u16_at(self.id_range_offset_start() + index * 2)?,
        })
    }

    /// Glyph index for `codepoint`, which must lie inside `segment`.
    ///
    /// With a zero id range offset the glyph is `codepoint + delta`. Otherwise
    /// the id range offset is a byte distance from the segment's own slot in
    /// the id range offset array into the glyph id array; a zero found there
    /// stays zero, anything else gets the delta added. All sums are mod 65536.
    pub fn glyph_index_in(&self, segment: &Segment, codepoint: u32) -> Result<u16, FontMetaError> {
        if segment.id_range_offset == 0 {
            return Ok(apply_delta(codepoint, segment.id_delta));
        }

        let slot = self.id_range_offset_start() + segment.index * 2;
        let address = slot
            + usize::from(segment.id_range_offset)
            + codepoint.saturating_sub(u32::from(segment.start_code)) as usize * 2;

        match self.reader.read_u16_at(address)? {
            0 => Ok(0),
            glyph => Ok(apply_delta(u32::from(glyph), segment.id_delta)),
        }
    }

    /// Looks up a single code point, `None` if no segment covers it.
    pub fn glyph_index(&self, codepoint: u32) -> Result<Option<u16>, FontMetaError> {
        for index in 0..self.seg_count.saturating_sub(1) {
            let segment = self.segment(index)?;
            if (u32::from(segment.start_code)..=u32::from(segment.end_code)).contains(&codepoint) {
                return self.glyph_index_in(&segment, codepoint).map(Some);
            }
        }

        Ok(None)
    }

    /// Expands every segment except the final `0xFFFF` sentinel into a
    /// code point to glyph index map. Unmapped code points inside a
    /// segment are kept with glyph index 0. Where segments overlap the
    /// earlier segment wins, as in [`Format4::glyph_index`].
    pub fn mappings(&self) -> Result<CharMap, FontMetaError> {
        let mut map = CharMap::new();
        let Some(last) = self.seg_count.checked_sub(1) else {
            return Ok(map);
        };

        let sentinel = self.segment(last)?;
        if sentinel.start_code != 0xFFFF || sentinel.end_code != 0xFFFF {
            warn!(
                "last cmap format 4 segment is {:#06X}..={:#06X}, expected the 0xFFFF sentinel",
                sentinel.start_code, sentinel.end_code
            );
        }

        for index in 0..last {
            let segment = self.segment(index)?;
            trace!("cmap segment {segment:?}");

            for codepoint in u32::from(segment.start_code)..=u32::from(segment.end_code) {
                // overlapping segments: the first one covering a code point wins
                if map.contains_key(&codepoint) {
                    continue;
                }
                map.insert(codepoint, self.glyph_index_in(&segment, codepoint)?);
            }
        }

        Ok(map)
    }
}

fn apply_delta(value: u32, delta: i16) -> u16 {
    (i64::from(value) + i64::from(delta)).rem_euclid(0x1_0000) as u16
}
