use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use log::debug;

use crate::{
    FontMetaError,
    options::{FontOptions, missing_record_text},
    tables::{
        SfntVersion, TableDirectory, Tables, Tag,
        cmap::{CharMap, Cmap},
        maxp::Maxp,
        name::{Name, NameEntry, NameId, find_preferred},
    },
};

/// Returned by [`FontDocument::font_family_name`] when the name table has no family record.
pub const UNKNOWN_FONT_NAME: &str = "Unknown Font Name";

/// An sfnt font loaded into memory.
///
/// The buffer is read once and the table directory parsed once, at
/// construction. Every table is decoded the first time a query needs it
/// and the result is kept, so repeated queries are free. A font lacking
/// some table still answers every query that does not need it.
///
/// All queries take `&self`; the caches are write-once, so a document can
/// be shared between threads without locking. With
/// [`FontOptions::memoize`] turned off nothing is kept and every query
/// decodes its table again, handing back an owned result.
pub struct FontDocument {
    data: Vec<u8>,
    path: Option<PathBuf>,
    tables: Tables,
    options: FontOptions,

    names: OnceLock<Vec<NameEntry>>,
    glyph_count: OnceLock<u16>,
    cmap: OnceLock<CharMap>,
}

impl FontDocument {
    /// Takes ownership of a whole font file.
    ///
    /// Fails right away when the buffer is not an sfnt container, every
    /// other problem is reported by the query that runs into it.
    ///
    /// # Examples
    ///
    /// ```
    /// use font_meta::FontDocument;
    ///
    /// let err = FontDocument::from_bytes(vec![0u8; 12]).unwrap_err();
    /// assert!(err.to_string().contains("Invalid sfnt container"));
    /// ```
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Result<Self, FontMetaError> {
        Self::with_options(data, FontOptions::default())
    }

    pub fn with_options(
        data: impl Into<Vec<u8>>,
        options: FontOptions,
    ) -> Result<Self, FontMetaError> {
        let data = data.into();
        let tables = Tables::from_data(&data)?;

        Ok(Self {
            data,
            path: None,
            tables,
            options,
            names: OnceLock::new(),
            glyph_count: OnceLock::new(),
            cmap: OnceLock::new(),
        })
    }

    /// Reads the file at `path` into memory and parses its directory.
    ///
    /// The file is closed before this returns, whether parsing succeeds or not.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FontMetaError> {
        Self::open_with_options(path, FontOptions::default())
    }

    pub fn open_with_options(
        path: impl AsRef<Path>,
        options: FontOptions,
    ) -> Result<Self, FontMetaError> {
        let path = path.as_ref();
        let data = read_font_file(path)?;

        let mut font = Self::with_options(data, options)?;
        font.set_path(path);

        Ok(font)
    }

    pub(crate) fn set_path(&mut self, path: &Path) {
        self.path = Some(path.to_path_buf());
    }

    /// The raw font bytes, for handing to a rasterizer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The file this font was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &FontOptions {
        &self.options
    }

    pub fn sfnt_version(&self) -> SfntVersion {
        self.tables.offset.sfnt_version()
    }

    pub fn directory(&self) -> &TableDirectory {
        &self.tables.directory
    }

    /// Tags of the tables present, in directory order
    pub fn tables(&self) -> &[Tag] {
        self.tables.directory.tags()
    }

    fn table(&self, tag: Tag) -> Result<&[u8], FontMetaError> {
        self.tables.directory.table_data(&self.data, tag)
    }

    /// Every name record, decoded and labelled, in table order.
    pub fn all_name_records(&self) -> Result<Cow<'_, [NameEntry]>, FontMetaError> {
        let records = memoized(&self.names, self.options.memoize, || {
            let name = Name::from_table(self.table(Tag::NAME)?)?;
            debug!("decoded {} name records", name.count());

            Ok(name.entries())
        })?;

        Ok(match records {
            Cow::Borrowed(records) => Cow::Borrowed(records.as_slice()),
            Cow::Owned(records) => Cow::Owned(records),
        })
    }

    /// The value of `name_id`, or `Unknown Record #<id>` if the font has none.
    pub fn name_record(&self, name_id: u16) -> Result<String, FontMetaError> {
        let records = self.all_name_records()?;

        Ok(find_preferred(&*records, name_id, self.options.preferred_platform)
            .map(|entry| entry.value.clone())
            .unwrap_or_else(|| missing_record_text(name_id)))
    }

    /// The font family name (name id 1), or [`UNKNOWN_FONT_NAME`].
    ///
    /// # Errors
    ///
    /// Only when the name table itself is missing or malformed.
    pub fn font_family_name(&self) -> Result<String, FontMetaError> {
        let records = self.all_name_records()?;

        Ok(
            find_preferred(&*records, NameId::FAMILY.0, self.options.preferred_platform)
                .map(|entry| entry.value.clone())
                .unwrap_or_else(|| UNKNOWN_FONT_NAME.to_string()),
        )
    }

    /// The designer or author, resolved through [`FontOptions::author_fallback`].
    pub fn designer_or_author(&self) -> Result<String, FontMetaError> {
        let records = self.all_name_records()?;
        let fallback = &self.options.author_fallback;

        Ok(fallback
            .resolve(&*records, self.options.preferred_platform)
            .map(|entry| entry.value.clone())
            .unwrap_or_else(|| fallback.missing_text()))
    }

    /// The number of glyphs from `maxp`. There is no default, a missing
    /// table is always an error.
    pub fn glyph_count(&self) -> Result<u16, FontMetaError> {
        memoized(&self.glyph_count, self.options.memoize, || {
            Ok(Maxp::from_table(self.table(Tag::MAXP)?)?.num_glyphs())
        })
        .map(Cow::into_owned)
    }

    /// The Unicode to glyph index mapping of the Windows Unicode format 4 subtable.
    ///
    /// Code points inside a segment with no glyph map to glyph index 0.
    pub fn cmap(&self) -> Result<Cow<'_, CharMap>, FontMetaError> {
        memoized(&self.cmap, self.options.memoize, || {
            let map = Cmap::from_table(self.table(Tag::CMAP)?)?.mappings()?;
            debug!("decoded cmap with {} code points", map.len());

            Ok(map)
        })
    }

    /// The glyph for `codepoint`, `None` when it is unmapped or maps to glyph 0.
    pub fn glyph_index(&self, codepoint: u32) -> Result<Option<u16>, FontMetaError> {
        Ok(self
            .cmap()?
            .get(&codepoint)
            .copied()
            .filter(|&glyph| glyph != 0))
    }

    /// Code points that map to a real glyph, ascending.
    pub fn renderable_codepoints(&self) -> Result<Vec<u32>, FontMetaError> {
        Ok(self
            .cmap()?
            .iter()
            .filter(|&(_, &glyph)| glyph != 0)
            .map(|(&codepoint, _)| codepoint)
            .collect())
    }
}

impl fmt::Debug for FontDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontDocument")
            .field("path", &self.path)
            .field("len", &self.data.len())
            .field("sfnt_version", &self.sfnt_version())
            .field("tables", &self.tables())
            .finish()
    }
}

pub(crate) fn read_font_file(path: &Path) -> Result<Vec<u8>, FontMetaError> {
    let data = std::fs::read(path).map_err(|source| FontMetaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", data.len(), path.display());

    Ok(data)
}

/// Computes the value on first use and stores it; a racing second
/// computation produces the same value and is dropped. When `memoize` is
/// off the cell is never touched and the value is handed back owned.
fn memoized<'s, T: Clone>(
    cell: &'s OnceLock<T>,
    memoize: bool,
    init: impl FnOnce() -> Result<T, FontMetaError>,
) -> Result<Cow<'s, T>, FontMetaError> {
    if !memoize {
        return init().map(Cow::Owned);
    }
    if let Some(value) = cell.get() {
        return Ok(Cow::Borrowed(value));
    }
    let value = init()?;

    Ok(Cow::Borrowed(cell.get_or_init(|| value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        options::NameFallback,
        tables::{TableEncodingError, name::PlatformId},
        test_helpers::{cmap_table, format4, maxp_table, name_table, sfnt, utf16be},
    };
    use pretty_assertions::assert_eq;

    fn sample_font() -> Vec<u8> {
        let family = utf16be("Test Font");
        let designer = utf16be("Jane Doe");
        sfnt(
            SfntVersion::TRUE_TYPE,
            &[
                (
                    Tag::NAME,
                    name_table(&[
                        (1, 0, 0, 1, b"Mac Family"),
                        (3, 1, 0x409, 1, &family),
                        (3, 1, 0x409, 9, &designer),
                        (3, 1, 0x409, 30, &utf16be("odd")),
                    ]),
                ),
                (Tag::MAXP, maxp_table(1000)),
                (
                    Tag::CMAP,
                    cmap_table(&[(3, 1, format4(&[(65, 67, 5, 4)], &[10, 0, 12]))]),
                ),
            ],
        )
    }

    #[test]
    fn answers_every_query() {
        let font = FontDocument::from_bytes(sample_font()).unwrap();

        assert_eq!(font.sfnt_version(), SfntVersion::TrueType);
        assert_eq!(font.tables(), &[Tag::NAME, Tag::MAXP, Tag::CMAP]);
        assert_eq!(font.font_family_name().unwrap(), "Test Font");
        assert_eq!(font.designer_or_author().unwrap(), "Jane Doe");
        assert_eq!(font.glyph_count().unwrap(), 1000);
        assert_eq!(*font.cmap().unwrap(), CharMap::from([(65, 15), (66, 0), (67, 17)]));
        assert_eq!(font.glyph_index(65).unwrap(), Some(15));
        assert_eq!(font.glyph_index(66).unwrap(), None);
        assert_eq!(font.renderable_codepoints().unwrap(), vec![65, 67]);
        assert!(font.path().is_none());
    }

    #[test]
    fn all_records_keep_order_and_labels() {
        let font = FontDocument::from_bytes(sample_font()).unwrap();
        let records = font.all_name_records().unwrap();
        let summary = records
            .iter()
            .map(|entry| (entry.name_id, entry.label.as_str(), entry.platform_id, entry.value.as_str()))
            .collect::<Vec<_>>();

        assert_eq!(
            summary,
            vec![
                (1, "Font Family Name", 1, "Mac Family"),
                (1, "Font Family Name", 3, "Test Font"),
                (9, "Designer", 3, "Jane Doe"),
                (30, "Unknown NameID (30)", 3, "odd"),
            ]
        );
    }

    #[test]
    fn preferred_platform_is_configurable() {
        let options = FontOptions::new().with_preferred_platform(PlatformId::Macintosh);
        let font = FontDocument::with_options(sample_font(), options).unwrap();

        assert_eq!(font.font_family_name().unwrap(), "Mac Family");
    }

    #[test]
    fn name_fallbacks_are_soft() {
        let font = FontDocument::from_bytes(sfnt(
            SfntVersion::TRUE_TYPE,
            &[(Tag::NAME, name_table(&[(3, 1, 0x409, 8, &utf16be("Foundry"))]))],
        ))
        .unwrap();

        assert_eq!(font.font_family_name().unwrap(), UNKNOWN_FONT_NAME);
        assert_eq!(font.designer_or_author().unwrap(), "Foundry");
        assert_eq!(font.name_record(8).unwrap(), "Foundry");
        assert_eq!(font.name_record(4).unwrap(), "Unknown Record #4");
    }

    #[test]
    fn author_without_any_match() {
        let options = FontOptions::new().with_author_fallback(NameFallback::new([NameId::DESIGNER]));
        let font = FontDocument::with_options(
            sfnt(SfntVersion::TRUE_TYPE, &[(Tag::NAME, name_table(&[]))]),
            options,
        )
        .unwrap();

        assert_eq!(font.designer_or_author().unwrap(), "Unknown Record #9");
        assert!(font.all_name_records().unwrap().is_empty());
    }

    #[test]
    fn missing_tables_fail_only_their_queries() {
        let family = utf16be("Only Names");
        let font = FontDocument::from_bytes(sfnt(
            SfntVersion::OTTO,
            &[(Tag::NAME, name_table(&[(3, 1, 0x409, 1, &family)]))],
        ))
        .unwrap();

        assert_eq!(font.font_family_name().unwrap(), "Only Names");
        assert_eq!(
            font.glyph_count().unwrap_err().table_error(),
            Some(&TableEncodingError::TableNotFound(Tag::MAXP))
        );
        assert_eq!(
            font.cmap().unwrap_err().table_error(),
            Some(&TableEncodingError::TableNotFound(Tag::CMAP))
        );
    }

    #[test]
    fn missing_name_table_is_an_error() {
        let font = FontDocument::from_bytes(sfnt(SfntVersion::TRUE_TYPE, &[(Tag::MAXP, maxp_table(3))]))
            .unwrap();

        assert_eq!(
            font.font_family_name().unwrap_err().table_error(),
            Some(&TableEncodingError::TableNotFound(Tag::NAME))
        );
        assert_eq!(font.glyph_count().unwrap(), 3);
    }

    #[test]
    fn results_are_cached() {
        let font = FontDocument::from_bytes(sample_font()).unwrap();

        assert!(matches!(font.cmap().unwrap(), Cow::Borrowed(_)));
        assert!(std::ptr::eq(&*font.cmap().unwrap(), &*font.cmap().unwrap()));
        assert!(std::ptr::eq(
            &*font.all_name_records().unwrap(),
            &*font.all_name_records().unwrap()
        ));
    }

    #[test]
    fn uncached_results_are_fresh() {
        let options = FontOptions::new().with_memoize(false);
        let font = FontDocument::with_options(sample_font(), options).unwrap();

        let first = font.all_name_records().unwrap();
        let second = font.all_name_records().unwrap();
        assert!(matches!(first, Cow::Owned(_)));
        assert!(!std::ptr::eq(&*first, &*second));
        assert_eq!(first, second);

        assert!(matches!(font.cmap().unwrap(), Cow::Owned(_)));
        assert_eq!(*font.cmap().unwrap(), CharMap::from([(65, 15), (66, 0), (67, 17)]));
        assert_eq!(font.glyph_count().unwrap(), 1000);
        assert_eq!(font.font_family_name().unwrap(), "Test Font");
    }

    #[test]
    fn shared_between_threads() {
        let font = FontDocument::from_bytes(sample_font()).unwrap();

        std::thread::scope(|scope| {
            let handles = (0..4)
                .map(|_| scope.spawn(|| font.cmap().unwrap().len()))
                .collect::<Vec<_>>();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), 3);
            }
        });
    }

    #[test]
    fn open_reports_missing_file() {
        let err = FontDocument::open("/definitely/not/here.ttf").unwrap_err();

        assert!(matches!(err, FontMetaError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.ttf"));
    }

    #[test]
    fn open_keeps_the_path() {
        let path = std::env::temp_dir().join(format!("font_meta_open_{}.ttf", std::process::id()));
        std::fs::write(&path, sample_font()).unwrap();

        let font = FontDocument::open(&path);
        std::fs::remove_file(&path).unwrap();
        let font = font.unwrap();

        assert_eq!(font.path(), Some(path.as_path()));
        assert_eq!(font.data(), sample_font().as_slice());
        assert_eq!(font.glyph_count().unwrap(), 1000);
    }
}
