//! Byte builders shared by the integration tests.

#![allow(dead_code)]

pub fn be16(out: &mut Vec<u8>, values: &[u16]) {
    for value in values {
        out.extend(value.to_be_bytes());
    }
}

pub fn utf16be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

pub fn name_table(records: &[(u16, u16, u16, &[u8])]) -> Vec<u8> {
    let count = records.len() as u16;
    let mut out = Vec::new();
    be16(&mut out, &[0, count, 6 + 12 * count]);

    let mut storage = Vec::new();
    for (platform, encoding, name_id, bytes) in records {
        be16(
            &mut out,
            &[*platform, *encoding, 0, *name_id, bytes.len() as u16, storage.len() as u16],
        );
        storage.extend_from_slice(bytes);
    }
    out.extend(storage);
    out
}

/// cmap with one 3/1 format 4 subtable: the given segment plus the sentinel.
pub fn cmap_table(start: u16, end: u16, delta: u16, range_offset: u16, glyphs: &[u16]) -> Vec<u8> {
    let mut out = Vec::new();
    be16(&mut out, &[0, 1, 3, 1]);
    out.extend(12u32.to_be_bytes());
    be16(&mut out, &[4, 32 + 2 * glyphs.len() as u16, 0, 4, 0, 0, 0]);
    be16(&mut out, &[end, 0xFFFF, 0, start, 0xFFFF, delta, 1, range_offset, 0]);
    be16(&mut out, glyphs);
    out
}

pub fn sfnt(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut out = vec![0, 1, 0, 0];
    be16(&mut out, &[tables.len() as u16, 0, 0, 0]);

    let mut offset = 12 + 16 * tables.len() as u32;
    for (tag, data) in tables {
        out.extend_from_slice(*tag);
        out.extend(0u32.to_be_bytes());
        out.extend(offset.to_be_bytes());
        out.extend((data.len() as u32).to_be_bytes());
        offset += data.len() as u32;
    }
    for (_, data) in tables {
        out.extend_from_slice(data);
    }
    out
}
