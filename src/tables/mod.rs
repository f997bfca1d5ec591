use std::{collections::BTreeMap, fmt, ops::Range};

use log::{debug, warn};
use thiserror::Error;

use crate::{FontMetaError, buffer::FontBufReader};

pub mod cmap;
pub mod maxp;
pub mod name;

/// A 4-byte table tag, e.g. `name` or `cmap`.
///
/// Tags are compared byte for byte, so `Name` and `name` are different tables.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const CMAP: Self = Self(*b"cmap");
    pub const MAXP: Self = Self(*b"maxp");
    pub const NAME: Self = Self(*b"name");

    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Tag {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{byte:02X}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag('{self}')")
    }
}

/// Represents the error messages which may occur when trying
/// to locate or interpret tables inside an sfnt buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableEncodingError {
    #[error("Invalid sfnt container, unexpected signature 0x{0:08X}")]
    InvalidContainer(u32),

    #[error("The '{0}' table was not found in the table directory")]
    TableNotFound(Tag),

    #[error("The cmap table has no Windows Unicode (3/1 or 3/10) subtable")]
    NoSuitableCmapSubtable,

    #[error("Unsupported cmap subtable format {0}, only format 4 is supported")]
    UnsupportedCmapFormat(u16),
}

/// The flavour of sfnt container, taken from the first four bytes of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SfntVersion {
    /// `00 01 00 00`, glyph outlines live in `glyf`
    TrueType,
    /// `OTTO`, glyph outlines live in `CFF `
    Cff,
}

impl SfntVersion {
    pub const TRUE_TYPE: u32 = 0x0001_0000;
    pub const OTTO: u32 = u32::from_be_bytes(*b"OTTO");
}

impl TryFrom<u32> for SfntVersion {
    type Error = TableEncodingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            Self::TRUE_TYPE => Ok(Self::TrueType),
            Self::OTTO => Ok(Self::Cff),
            _ => Err(TableEncodingError::InvalidContainer(value)),
        }
    }
}

/// Represents the offset subtable directory and it's metadata
/// providing us with a important info such as the number of tables
#[derive(Debug, Clone)]
pub struct OffsetTable {
    sfnt_version: SfntVersion,
    num_tables: u16,
    search_range: u16,
    entry_selector: u16,
    range_shift: u16,
}

impl OffsetTable {
    /// The offset table is always 12 bytes, the directory entries follow it.
    pub const SIZE: usize = 12;

    /// Parses the offset table from the start of the buffer.
    ///
    /// The signature is checked before anything else is read, so a buffer
    /// with a bad signature fails with `InvalidContainer` even when it is
    /// too short to hold the rest of the header.
    pub(crate) fn from_reader(reader: &mut FontBufReader<'_>) -> Result<Self, FontMetaError> {
        reader.seek_to(0)?;

        let sfnt_version = SfntVersion::try_from(reader.read_u32()?)?;

        Ok(Self {
            sfnt_version,
            num_tables: reader.read_u16()?,
            search_range: reader.read_u16()?,
            entry_selector: reader.read_u16()?,
            range_shift: reader.read_u16()?,
        })
    }

    pub fn sfnt_version(&self) -> SfntVersion {
        self.sfnt_version
    }

    /// Returns the number of tables exists in the font file
    pub fn num_tables(&self) -> u16 {
        self.num_tables
    }

    pub fn search_range(&self) -> u16 {
        self.search_range
    }

    pub fn entry_selector(&self) -> u16 {
        self.entry_selector
    }

    pub fn range_shift(&self) -> u16 {
        self.range_shift
    }
}

/// Represents metadata for a table within a larger data structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableMetadata {
    /// The checksum of the table. Read but never verified.
    checksum: u32,
    /// The offset of the table, in bytes, from the beginning of the file
    /// or buffer containing the data structure.
    offset: u32,
    /// The length of this table in bytes, not including any padding.
    length: u32,
}

impl TableMetadata {
    /// Size of one directory entry in bytes
    pub const SIZE: usize = 16;

    /// Reads one 16 byte directory entry at the cursor.
    ///
    /// The bytes are interpreted as follows (all values are in big-endian order):
    ///
    /// * Bytes 0-3: Tag
    /// * Bytes 4-7: Checksum of the table
    /// * Bytes 8-11: Offset of the table from the beginning of the file
    /// * Bytes 12-15: Length of the table in bytes
    fn from_reader(reader: &mut FontBufReader<'_>) -> Result<(Tag, Self), FontMetaError> {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(reader.read_bytes(4)?);

        let metadata = Self {
            checksum: reader.read_u32()?,
            offset: reader.read_u32()?,
            length: reader.read_u32()?,
        };

        Ok((Tag(tag), metadata))
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// The byte range of the table inside the font buffer.
    pub fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        start..start.saturating_add(self.length as usize)
    }
}

/// Maps a table tag to it's offset and length in the file / buffer
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    inner: BTreeMap<Tag, TableMetadata>,
    /// Tags in the order they first appear in the directory
    order: Vec<Tag>,
}

impl TableDirectory {
    /// Reads `num_tables` consecutive 16 byte entries starting at the cursor.
    ///
    /// Malformed fonts may list the same tag twice, the last entry wins.
    pub fn from_reader(
        reader: &mut FontBufReader<'_>,
        num_tables: u16,
    ) -> Result<Self, FontMetaError> {
        let mut directory = Self::default();

        for _ in 0..num_tables {
            let (tag, metadata) = TableMetadata::from_reader(reader)?;

            if directory.inner.insert(tag, metadata).is_some() {
                warn!("duplicate '{tag}' entry in table directory, keeping the last one");
            } else {
                directory.order.push(tag);
            }
        }

        Ok(directory)
    }

    pub fn get(&self, tag: Tag) -> Option<&TableMetadata> {
        self.inner.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.inner.contains_key(&tag)
    }

    /// Tags present in the font, in directory order
    pub fn tags(&self) -> &[Tag] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Borrows the bytes of the table `tag` out of `data`.
    ///
    /// # Errors
    ///
    /// * `TableNotFound(tag)` if the directory has no such entry.
    /// * `OutOfBounds` if `offset + length` reaches past the end of `data`.
    pub fn table_data<'a>(&self, data: &'a [u8], tag: Tag) -> Result<&'a [u8], FontMetaError> {
        let metadata = self
            .get(tag)
            .ok_or(TableEncodingError::TableNotFound(tag))?;

        FontBufReader::new(data)
            .read_bytes_at(metadata.offset as usize, metadata.length as usize)
            .map_err(|err| {
                warn!("'{tag}' table range {:?} is outside the font buffer", metadata.range());
                err.into()
            })
    }
}

impl<'a> IntoIterator for &'a TableDirectory {
    type Item = (&'a Tag, &'a TableMetadata);

    type IntoIter = std::collections::btree_map::Iter<'a, Tag, TableMetadata>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// The offset table together with the directory that follows it.
#[derive(Debug, Clone)]
pub struct Tables {
    /// The offset table, which provides the number of tables.
    pub offset: OffsetTable,
    pub directory: TableDirectory,
}

impl Tables {
    /// Parses the sfnt header and table directory out of a whole font buffer.
    ///
    /// # Errors
    ///
    /// * `InvalidContainer` when the first four bytes are neither
    ///   `00 01 00 00` nor `OTTO`.
    /// * `OutOfBounds` when the buffer ends inside the header or the directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use font_meta::tables::Tables;
    ///
    /// let mut font = vec![0x00, 0x01, 0x00, 0x00, 0, 1, 0, 16, 0, 0, 0, 0];
    /// font.extend_from_slice(b"maxp");
    /// font.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 28, 0, 0, 0, 6]);
    /// font.extend_from_slice(&[0, 1, 0, 0, 0x03, 0xE8]);
    ///
    /// let tables = Tables::from_data(&font).unwrap();
    /// assert_eq!(tables.offset.num_tables(), 1);
    /// assert_eq!(tables.directory.get(font_meta::tables::Tag::MAXP).unwrap().length(), 6);
    ///
    /// assert!(Tables::from_data(&[0, 0, 0, 0]).is_err());
    /// ```
    pub fn from_data(data: &[u8]) -> Result<Self, FontMetaError> {
        let mut reader = FontBufReader::new(data);
        let offset_table = OffsetTable::from_reader(&mut reader)?;
        let directory = TableDirectory::from_reader(&mut reader, offset_table.num_tables())?;

        debug!(
            "parsed {:?} table directory with {} tables: {:?}",
            offset_table.sfnt_version(),
            directory.len(),
            directory.tags()
        );

        Ok(Self {
            offset: offset_table,
            directory,
        })
    }
}
