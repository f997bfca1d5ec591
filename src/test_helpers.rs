//! small utilities used in tests

use crate::tables::{OffsetTable, TableMetadata, Tag};

/// A convenience type for generating a buffer of big-endian bytes.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer(Vec<u8>);

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push_u16(&mut self, item: u16) {
        self.0.extend(item.to_be_bytes())
    }

    pub fn push_i16(&mut self, item: i16) {
        self.0.extend(item.to_be_bytes())
    }

    pub fn push_u32(&mut self, item: u32) {
        self.0.extend(item.to_be_bytes())
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes)
    }

    pub fn extend_u16(&mut self, iter: impl IntoIterator<Item = u16>) {
        for item in iter {
            self.push_u16(item);
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub fn utf16be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// A name record for [`name_table`]: platform, encoding, language, name id, raw bytes.
pub type RawName<'a> = (u16, u16, u16, u16, &'a [u8]);

/// Builds a format 0 `name` table with the string storage right after the records.
pub fn name_table(records: &[RawName<'_>]) -> Vec<u8> {
    let count = records.len() as u16;
    let mut buf = BeBuffer::new();
    buf.push_u16(0);
    buf.push_u16(count);
    buf.push_u16(6 + count * 12);

    let mut storage = Vec::new();
    for &(platform, encoding, language, name_id, bytes) in records {
        buf.extend_u16([platform, encoding, language, name_id]);
        buf.push_u16(bytes.len() as u16);
        buf.push_u16(storage.len() as u16);
        storage.extend_from_slice(bytes);
    }
    buf.push_bytes(&storage);

    buf.into_inner()
}

pub fn maxp_table(num_glyphs: u16) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.push_u32(0x0000_5000);
    buf.push_u16(num_glyphs);
    buf.into_inner()
}

/// A format 4 segment: start code, end code, id delta, id range offset.
pub type Segment = (u16, u16, i16, u16);

/// Builds a format 4 subtable. The `0xFFFF` sentinel segment is appended
/// after `segments`, `glyph_ids` become the trailing glyph id array.
pub fn format4(segments: &[Segment], glyph_ids: &[u16]) -> Vec<u8> {
    let mut all = segments.to_vec();
    all.push((0xFFFF, 0xFFFF, 1, 0));
    let seg_count = all.len() as u16;
    let length = 16 + seg_count * 8 + glyph_ids.len() as u16 * 2;

    let mut buf = BeBuffer::new();
    buf.extend_u16([4, length, 0, seg_count * 2, 0, 0, 0]);
    buf.extend_u16(all.iter().map(|seg| seg.1));
    buf.push_u16(0);
    buf.extend_u16(all.iter().map(|seg| seg.0));
    for seg in &all {
        buf.push_i16(seg.2);
    }
    buf.extend_u16(all.iter().map(|seg| seg.3));
    buf.extend_u16(glyph_ids.iter().copied());

    buf.into_inner()
}

/// Builds a `cmap` table out of (platform, encoding, subtable bytes).
pub fn cmap_table(subtables: &[(u16, u16, Vec<u8>)]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.push_u16(0);
    buf.push_u16(subtables.len() as u16);

    let mut offset = 4 + subtables.len() as u32 * 8;
    for (platform, encoding, data) in subtables {
        buf.extend_u16([*platform, *encoding]);
        buf.push_u32(offset);
        offset += data.len() as u32;
    }
    for (_, _, data) in subtables {
        buf.push_bytes(data);
    }

    buf.into_inner()
}

/// Assembles a whole sfnt buffer, tables are laid out in order and padded to 4 bytes.
pub fn sfnt(version: u32, tables: &[(Tag, Vec<u8>)]) -> Vec<u8> {
    let mut buf = BeBuffer::new();
    buf.push_u32(version);
    buf.extend_u16([tables.len() as u16, 0, 0, 0]);

    let mut offset = (OffsetTable::SIZE + tables.len() * TableMetadata::SIZE) as u32;
    for (tag, data) in tables {
        buf.push_bytes(tag.as_bytes());
        buf.push_u32(0);
        buf.push_u32(offset);
        buf.push_u32(data.len() as u32);
        offset += data.len().next_multiple_of(4) as u32;
    }
    for (_, data) in tables {
        buf.push_bytes(data);
        buf.push_bytes(&vec![0; data.len().next_multiple_of(4) - data.len()]);
    }

    buf.into_inner()
}
