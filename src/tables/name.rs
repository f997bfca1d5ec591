use std::{borrow::Cow, fmt};

use log::{trace, warn};

use crate::{FontMetaError, buffer::FontBufReader};

/// Represents the [name table](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6name.html)
#[derive(Debug)]
pub struct Name<'a> {
    /// The format of the name table
    format: TableFormat,

    /// The amount of name records in the table
    count: u16,

    /// offset in bytes from the table start to the string storage
    string_offset: u16,

    /// A vector of size <count> of the name records, in table order
    records: Vec<NameRecord<'a>>,
}

impl<'a> Name<'a> {
    /// Size of a single name record in bytes
    const RECORD_SIZE: usize = 12;

    /// Parses a name table out of its table region.
    ///
    /// Every record's string is located at
    /// `string_offset + record.offset .. + record.length` inside the table.
    /// A record whose bytes fall outside the table fails the whole decode
    /// with `OutOfBounds`.
    pub fn from_table(data: &'a [u8]) -> Result<Self, FontMetaError> {
        let mut reader = FontBufReader::new(data);

        let format = TableFormat::from(reader.read_u16()?);
        let count = reader.read_u16()?;
        let string_offset = reader.read_u16()?;

        let mut records = Vec::with_capacity(usize::from(count));
        for index in 0..usize::from(count) {
            reader.seek_to(6 + index * Self::RECORD_SIZE)?;
            let record = NameRecord::from_reader(&mut reader, string_offset)?;
            trace!(
                "name record {index}: platform {:?}, encoding {}, name id {}, {} bytes",
                record.platform_id,
                record.encoding_id,
                record.name_id,
                record.bytes.len()
            );
            records.push(record);
        }

        Ok(Self {
            format,
            count,
            string_offset,
            records,
        })
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn string_offset(&self) -> u16 {
        self.string_offset
    }

    pub fn records(&self) -> &[NameRecord<'a>] {
        &self.records
    }

    /// Finds the record for `name_id`, see [`find_preferred`].
    pub fn find(&self, name_id: u16, preferred: PlatformId) -> Option<&NameRecord<'a>> {
        find_preferred(&self.records, name_id, preferred)
    }

    /// Decodes every record into an owned [`NameEntry`], keeping table order.
    pub fn entries(&self) -> Vec<NameEntry> {
        self.records.iter().map(NameEntry::from).collect()
    }
}

/// Represents a name record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord<'a> {
    /// Platform identifier code.
    pub platform_id: PlatformId,

    /// Platform-specific encoding identifier
    pub encoding_id: u16,

    /// Language identifier
    /// not enumed because there are literally DOZENS
    /// [find them here](https://developer.apple.com/fonts/TrueType-Reference-Manual/RM06/Chap6name.html)
    pub language_id: u16,

    /// Name identifier, see [`NameId`]
    pub name_id: u16,

    /// The undecoded string bytes, borrowed from the font buffer
    pub bytes: &'a [u8],
}

impl<'a> NameRecord<'a> {
    fn from_reader(reader: &mut FontBufReader<'a>, string_offset: u16) -> Result<Self, FontMetaError> {
        let platform_id = PlatformId::from(reader.read_u16()?);
        let encoding_id = reader.read_u16()?;
        let language_id = reader.read_u16()?;
        let name_id = reader.read_u16()?;
        let length = reader.read_u16()?;
        let offset = reader.read_u16()?;

        let start = usize::from(string_offset) + usize::from(offset);
        let bytes = reader.read_bytes_at(start, usize::from(length))?;

        Ok(Self {
            platform_id,
            encoding_id,
            language_id,
            name_id,
            bytes,
        })
    }

    pub fn encoding(&self) -> TextEncoding {
        TextEncoding::new(self.platform_id, self.encoding_id)
    }

    /// Decodes the raw bytes into text according to platform and encoding
    pub fn decode(&self) -> String {
        self.encoding().decode(self.bytes)
    }

    pub fn label(&self) -> Cow<'static, str> {
        NameId(self.name_id).label()
    }
}

/// A decoded name record detached from the font buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub name_id: u16,
    /// Human readable label of `name_id`
    pub label: String,
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub value: String,
}

impl From<&NameRecord<'_>> for NameEntry {
    fn from(record: &NameRecord<'_>) -> Self {
        Self {
            name_id: record.name_id,
            label: record.label().into_owned(),
            platform_id: record.platform_id.into(),
            encoding_id: record.encoding_id,
            language_id: record.language_id,
            value: record.decode(),
        }
    }
}

/// Something that can be matched against a name id and a platform.
pub trait NameKey {
    fn name_id(&self) -> u16;
    fn platform_id(&self) -> PlatformId;
}

impl NameKey for NameRecord<'_> {
    fn name_id(&self) -> u16 {
        self.name_id
    }

    fn platform_id(&self) -> PlatformId {
        self.platform_id
    }
}

impl NameKey for NameEntry {
    fn name_id(&self) -> u16 {
        self.name_id
    }

    fn platform_id(&self) -> PlatformId {
        PlatformId::from(self.platform_id)
    }
}

/// Returns the first record with `name_id` on the `preferred` platform,
/// or the first record with `name_id` on any platform if there is none.
pub fn find_preferred<R: NameKey>(records: &[R], name_id: u16, preferred: PlatformId) -> Option<&R> {
    let mut candidates = records.iter().filter(|record| record.name_id() == name_id);
    let first = candidates.clone().next();

    candidates
        .find(|record| record.platform_id() == preferred)
        .or(first)
}

/// Represents the platform identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformId {
    Unicode,
    Macintosh,
    Reserved,
    Microsoft,
    Unknown(u16),
}

impl From<u16> for PlatformId {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Unicode,
            1 => Self::Macintosh,
            2 => Self::Reserved,
            3 => Self::Microsoft,
            _ => Self::Unknown(value),
        }
    }
}

impl From<PlatformId> for u16 {
    fn from(value: PlatformId) -> Self {
        match value {
            PlatformId::Unicode => 0,
            PlatformId::Macintosh => 1,
            PlatformId::Reserved => 2,
            PlatformId::Microsoft => 3,
            PlatformId::Unknown(value) => value,
        }
    }
}

/// Represents a table format
/// the name table can have 2 formats
/// 0 => plain records
/// 1 => records followed by language-tag records (ignored here)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Records,
    LanguageTagged,
    Unknown(u16),
}

impl From<u16> for TableFormat {
    fn from(value: u16) -> Self {
        match value {
            0 => Self::Records,
            1 => Self::LanguageTagged,
            _ => Self::Unknown(value),
        }
    }
}

/// How the bytes of a name record are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// Unicode and Windows platforms
    Utf16Be,
    /// Macintosh platform, single byte Mac OS Roman
    MacRoman,
    /// Anything else, passed through as (lossy) UTF-8
    Unknown,
}

impl TextEncoding {
    /// Every Unicode and Windows encoding id stores its strings as UTF-16BE,
    /// so only the platform decides.
    pub fn new(platform: PlatformId, _encoding_id: u16) -> Self {
        match platform {
            PlatformId::Unicode | PlatformId::Microsoft => Self::Utf16Be,
            PlatformId::Macintosh => Self::MacRoman,
            PlatformId::Reserved | PlatformId::Unknown(_) => Self::Unknown,
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf16Be => decode_utf16_be(bytes),
            Self::MacRoman => bytes.iter().map(|&byte| mac_roman_to_char(byte)).collect(),
            Self::Unknown => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    if bytes.len() % 2 != 0 {
        warn!("odd length UTF-16BE name string ({} bytes), dropping the last byte", bytes.len());
    }

    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

    char::decode_utf16(units)
        .map(|unit| unit.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn mac_roman_to_char(byte: u8) -> char {
    if byte < 0x80 {
        byte as char
    } else {
        let code = MAC_ROMAN_HIGH[usize::from(byte - 0x80)];
        char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER)
    }
}

/// Unicode values for Mac OS Roman bytes 0x80..=0xFF
#[rustfmt::skip]
static MAC_ROMAN_HIGH: [u16; 128] = [
    196, 197, 199, 201, 209, 214, 220, 225, 224, 226, 228, 227, 229, 231, 233,
    232, 234, 235, 237, 236, 238, 239, 241, 243, 242, 244, 246, 245, 250, 249,
    251, 252, 8224, 176, 162, 163, 167, 8226, 182, 223, 174, 169, 8482, 180,
    168, 8800, 198, 216, 8734, 177, 8804, 8805, 165, 181, 8706, 8721, 8719,
    960, 8747, 170, 186, 937, 230, 248, 191, 161, 172, 8730, 402, 8776, 8710,
    171, 187, 8230, 160, 192, 195, 213, 338, 339, 8211, 8212, 8220, 8221, 8216,
    8217, 247, 9674, 255, 376, 8260, 8364, 8249, 8250, 64257, 64258, 8225, 183,
    8218, 8222, 8240, 194, 202, 193, 203, 200, 205, 206, 207, 204, 211, 212,
    63743, 210, 218, 219, 217, 305, 710, 732, 175, 728, 729, 730, 184, 733,
    731, 711,
];

/// A name identifier with its catalog label.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameId(pub u16);

impl NameId {
    pub const COPYRIGHT: Self = Self(0);
    pub const FAMILY: Self = Self(1);
    pub const SUBFAMILY: Self = Self(2);
    pub const UNIQUE_ID: Self = Self(3);
    pub const FULL_NAME: Self = Self(4);
    pub const VERSION: Self = Self(5);
    pub const POSTSCRIPT_NAME: Self = Self(6);
    pub const TRADEMARK: Self = Self(7);
    pub const MANUFACTURER: Self = Self(8);
    pub const DESIGNER: Self = Self(9);
    pub const DESCRIPTION: Self = Self(10);
    pub const TYPOGRAPHIC_FAMILY: Self = Self(16);
    pub const TYPOGRAPHIC_SUBFAMILY: Self = Self(17);

    /// The catalog label, if this id has one.
    pub fn known_label(self) -> Option<&'static str> {
        Some(match self.0 {
            0 => "Copyright Notice",
            1 => "Font Family Name",
            2 => "Font Subfamily Name",
            3 => "Unique Font Identifier",
            4 => "Full Font Name",
            5 => "Version String",
            6 => "PostScript Name",
            7 => "Trademark",
            8 => "Manufacturer",
            9 => "Designer",
            10 => "Description",
            11 => "URL Vendor",
            12 => "URL Designer",
            13 => "License Description",
            14 => "License Info URL",
            15 => "Reserved",
            16 => "Typographic Family Name",
            17 => "Typographic Subfamily Name",
            18 => "Compatible Full Name",
            19 => "Sample Text",
            20 => "PostScript CID Findfont Name",
            21 => "WWS Family Name",
            22 => "WWS Subfamily Name",
            23 => "Light Background Palette",
            24 => "Dark Background Palette",
            25 => "Variations PostScript Name Prefix",
            _ => return None,
        })
    }

    /// The catalog label, or `Unknown NameID (<n>)` for ids outside it.
    pub fn label(self) -> Cow<'static, str> {
        match self.known_label() {
            Some(label) => Cow::Borrowed(label),
            None => Cow::Owned(format!("Unknown NameID ({})", self.0)),
        }
    }
}

impl From<u16> for NameId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Debug for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameId({}, {:?})", self.0, self.label())
    }
}
