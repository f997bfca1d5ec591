use thiserror::Error;

macro_rules! impl_read {
    ($fn_name:ident, $at_name:ident, $typ:ty) => {
        /// Reads a big-endian value at the cursor and advances past it.
        pub fn $fn_name(&mut self) -> Result<$typ, BufReaderError> {
            let value = self.$at_name(self.pos)?;
            self.pos += size_of::<$typ>();

            Ok(value)
        }

        /// Reads a big-endian value at an absolute offset, leaving the cursor alone.
        pub fn $at_name(&self, offset: usize) -> Result<$typ, BufReaderError> {
            let bytes = self.read_bytes_at(offset, size_of::<$typ>())?;
            let mut raw = [0u8; size_of::<$typ>()];
            raw.copy_from_slice(bytes);

            Ok(<$typ>::from_be_bytes(raw))
        }
    };
}

/// Represents the possible errors that can occur when using `FontBufReader`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufReaderError {
    /// A read of `len` bytes starting at `offset` does not fit into the
    /// `available` bytes of the underlying buffer.
    #[error("Read of {len} bytes at offset {offset} is out of bounds, buffer holds {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },
}

/// A Struct which encapsulates and provides a robust API
/// for reading big-endian fields out of a borrowed byte buffer.
///
/// Every read is checked against the length of the buffer, nothing is
/// ever sliced without validating `offset + width` first.
#[derive(Debug, Clone, Copy)]
pub struct FontBufReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FontBufReader<'a> {
    /// Returns a new reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns a reader over `[offset, offset + len)` of this buffer.
    ///
    /// This is how table decoders get a view of their own table region,
    /// offsets inside the returned reader are relative to `offset`.
    ///
    /// # Examples
    ///
    /// ```
    /// use font_meta::buffer::FontBufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let reader = FontBufReader::new(&data);
    ///
    /// let second = reader.sub_reader(4, 4).unwrap();
    /// assert_eq!(second.read_u32_at(0).unwrap(), 20);
    /// assert!(reader.sub_reader(6, 4).is_err());
    /// ```
    pub fn sub_reader(&self, offset: usize, len: usize) -> Result<Self, BufReaderError> {
        Ok(Self::new(self.read_bytes_at(offset, len)?))
    }

    /// Seeks to a specifc place in the buffer
    /// from the start of the buffer
    ///
    /// # Examples
    ///
    /// ```
    /// use font_meta::buffer::FontBufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20]; // Represents two u32 values: 10 and 20 in big-endian
    /// let mut reader = FontBufReader::new(&data);
    ///
    /// // Seek to the beginning of the second u32 (at index 4)
    /// reader.seek_to(4).unwrap();
    /// let second_value = reader.read_u32().unwrap();
    /// assert_eq!(second_value, 20);
    /// ```
    pub fn seek_to(&mut self, pos: usize) -> Result<(), BufReaderError> {
        if pos > self.data.len() {
            return Err(self.out_of_bounds(pos, 0));
        }
        self.pos = pos;

        Ok(())
    }

    /// Skips n bytes from the CURRENT cursor positon
    ///
    /// # Examples
    ///
    /// ```
    /// use font_meta::buffer::FontBufReader;
    ///
    /// let data = [0, 0, 0, 10, 0, 0, 0, 20];
    /// let mut reader = FontBufReader::new(&data);
    ///
    /// let first_value = reader.read_u32().unwrap();
    /// assert_eq!(first_value, 10);
    ///
    /// // Skip the next 4 bytes (the second u32)
    /// reader.skip(4).unwrap();
    ///
    /// // Attempting to read should now result in an out of bounds error
    /// assert!(reader.read_u32().is_err());
    /// ```
    pub fn skip(&mut self, n: usize) -> Result<(), BufReaderError> {
        let target = self
            .pos
            .checked_add(n)
            .ok_or_else(|| self.out_of_bounds(self.pos, n))?;

        self.seek_to(target)
    }

    /// Current cursor position
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The whole buffer this reader was built over.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Reads `len` bytes at the cursor and advances past them.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], BufReaderError> {
        let bytes = self.read_bytes_at(self.pos, len)?;
        self.pos += len;

        Ok(bytes)
    }

    /// Borrows `len` bytes starting at `offset`.
    ///
    /// Fails with [`BufReaderError::OutOfBounds`] when the range leaves the
    /// buffer, including when `offset + len` overflows.
    pub fn read_bytes_at(&self, offset: usize, len: usize) -> Result<&'a [u8], BufReaderError> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(offset, len))?;

        self.data
            .get(offset..end)
            .ok_or_else(|| self.out_of_bounds(offset, len))
    }

    impl_read!(read_u8, read_u8_at, u8);
    impl_read!(read_u16, read_u16_at, u16);
    impl_read!(read_i16, read_i16_at, i16);
    impl_read!(read_u32, read_u32_at, u32);

    fn out_of_bounds(&self, offset: usize, len: usize) -> BufReaderError {
        BufReaderError::OutOfBounds {
            offset,
            len,
            available: self.data.len(),
        }
    }
}
