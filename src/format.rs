//! Container detection and the closed set of font kinds this crate knows.
//!
//! Only sfnt fonts are decoded. WOFF and WOFF2 files are recognised so they
//! can be loaded through the same interface, but every metadata query on
//! them answers [`FontMetaError::Unsupported`].

use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

use crate::{
    FontDocument, FontMetaError,
    buffer::FontBufReader,
    font::read_font_file,
    options::FontOptions,
    tables::{SfntVersion, TableEncodingError, cmap::CharMap, name::NameEntry},
};

/// The container a font file uses, by its leading signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFormat {
    TrueType,
    OpenTypeCff,
    Woff,
    Woff2,
}

impl FontFormat {
    pub const WOFF: u32 = u32::from_be_bytes(*b"wOFF");
    pub const WOFF2: u32 = u32::from_be_bytes(*b"wOF2");

    /// Identifies the container from the first four bytes of `data`.
    pub fn detect(data: &[u8]) -> Result<Self, FontMetaError> {
        let signature = FontBufReader::new(data).read_u32_at(0)?;

        Ok(match signature {
            SfntVersion::TRUE_TYPE => Self::TrueType,
            SfntVersion::OTTO => Self::OpenTypeCff,
            Self::WOFF => Self::Woff,
            Self::WOFF2 => Self::Woff2,
            _ => Err(TableEncodingError::InvalidContainer(signature))?,
        })
    }

    pub fn is_sfnt(self) -> bool {
        matches!(self, Self::TrueType | Self::OpenTypeCff)
    }
}

impl fmt::Display for FontFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TrueType => "TrueType",
            Self::OpenTypeCff => "OpenType (CFF)",
            Self::Woff => "WOFF",
            Self::Woff2 => "WOFF2",
        })
    }
}

/// The metadata queries every font kind answers, possibly with `Unsupported`.
pub trait FontMetadata {
    fn format(&self) -> FontFormat;

    fn font_family_name(&self) -> Result<String, FontMetaError>;

    fn designer_or_author(&self) -> Result<String, FontMetaError>;

    fn all_name_records(&self) -> Result<Cow<'_, [NameEntry]>, FontMetaError>;

    fn glyph_count(&self) -> Result<u16, FontMetaError>;

    fn cmap(&self) -> Result<Cow<'_, CharMap>, FontMetaError>;
}

impl FontMetadata for FontDocument {
    fn format(&self) -> FontFormat {
        match self.sfnt_version() {
            SfntVersion::TrueType => FontFormat::TrueType,
            SfntVersion::Cff => FontFormat::OpenTypeCff,
        }
    }

    fn font_family_name(&self) -> Result<String, FontMetaError> {
        FontDocument::font_family_name(self)
    }

    fn designer_or_author(&self) -> Result<String, FontMetaError> {
        FontDocument::designer_or_author(self)
    }

    fn all_name_records(&self) -> Result<Cow<'_, [NameEntry]>, FontMetaError> {
        FontDocument::all_name_records(self)
    }

    fn glyph_count(&self) -> Result<u16, FontMetaError> {
        FontDocument::glyph_count(self)
    }

    fn cmap(&self) -> Result<Cow<'_, CharMap>, FontMetaError> {
        FontDocument::cmap(self)
    }
}

/// A WOFF or WOFF2 font, kept as raw bytes.
#[derive(Debug, Clone)]
pub struct CompressedFont {
    format: FontFormat,
    data: Vec<u8>,
    path: Option<PathBuf>,
}

impl CompressedFont {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn unsupported<T>(&self, operation: &'static str) -> Result<T, FontMetaError> {
        Err(FontMetaError::Unsupported {
            operation,
            format: self.format,
        })
    }
}

impl FontMetadata for CompressedFont {
    fn format(&self) -> FontFormat {
        self.format
    }

    fn font_family_name(&self) -> Result<String, FontMetaError> {
        self.unsupported("font family name")
    }

    fn designer_or_author(&self) -> Result<String, FontMetaError> {
        self.unsupported("designer or author")
    }

    fn all_name_records(&self) -> Result<Cow<'_, [NameEntry]>, FontMetaError> {
        self.unsupported("name records")
    }

    fn glyph_count(&self) -> Result<u16, FontMetaError> {
        self.unsupported("glyph count")
    }

    fn cmap(&self) -> Result<Cow<'_, CharMap>, FontMetaError> {
        self.unsupported("cmap")
    }
}

/// Any font file this crate can load.
#[derive(Debug)]
pub enum LoadedFont {
    Sfnt(FontDocument),
    Compressed(CompressedFont),
}

impl LoadedFont {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self, FontMetaError> {
        Self::with_options(data, FontOptions::default())
    }

    pub fn with_options(
        data: impl Into<Vec<u8>>,
        options: FontOptions,
    ) -> Result<Self, FontMetaError> {
        let data = data.into();
        let format = FontFormat::detect(&data)?;

        if format.is_sfnt() {
            Ok(Self::Sfnt(FontDocument::with_options(data, options)?))
        } else {
            Ok(Self::Compressed(CompressedFont {
                format,
                data,
                path: None,
            }))
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, FontMetaError> {
        let path = path.as_ref();
        let mut loaded = Self::from_bytes(read_font_file(path)?)?;

        match &mut loaded {
            Self::Sfnt(font) => font.set_path(path),
            Self::Compressed(font) => font.path = Some(path.to_path_buf()),
        }

        Ok(loaded)
    }

    /// The raw bytes, for handing to a rasterizer
    pub fn data(&self) -> &[u8] {
        match self {
            Self::Sfnt(font) => font.data(),
            Self::Compressed(font) => font.data(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Sfnt(font) => font.path(),
            Self::Compressed(font) => font.path(),
        }
    }

    fn inner(&self) -> &dyn FontMetadata {
        match self {
            Self::Sfnt(font) => font,
            Self::Compressed(font) => font,
        }
    }
}

impl FontMetadata for LoadedFont {
    fn format(&self) -> FontFormat {
        self.inner().format()
    }

    fn font_family_name(&self) -> Result<String, FontMetaError> {
        self.inner().font_family_name()
    }

    fn designer_or_author(&self) -> Result<String, FontMetaError> {
        self.inner().designer_or_author()
    }

    fn all_name_records(&self) -> Result<Cow<'_, [NameEntry]>, FontMetaError> {
        self.inner().all_name_records()
    }

    fn glyph_count(&self) -> Result<u16, FontMetaError> {
        self.inner().glyph_count()
    }

    fn cmap(&self) -> Result<Cow<'_, CharMap>, FontMetaError> {
        self.inner().cmap()
    }
}
