//! The byte source contract consumed by the navigator.
//!
//! The core performs positional reads only: every suspension point is a
//! `seek` followed by `read`s. Anything implementing [`std::io::Read`] +
//! [`std::io::Seek`] (a [`File`](std::fs::File), a
//! [`Cursor`](std::io::Cursor), a custom big-data storage handle) is a
//! source out of the box through the blanket impl.

use std::io::{Read, Seek, SeekFrom};

use crate::error::Error;

/// A seekable byte source with short-read semantics.
///
/// A source handle carries a cursor which the header parser and the HDU
/// decoders mutate. The handle must therefore not be shared across
/// threads; a concurrent reader opens one independent handle per worker
/// and re-runs the (cheap) catalog walk on each.
pub trait SeekableByteSource {
    /// Move the cursor to an absolute byte offset.
    fn seek(&mut self, offset: u64) -> Result<(), Error>;

    /// Current absolute byte offset of the cursor.
    fn position(&mut self) -> Result<u64, Error>;

    /// Read into `buf` starting at the cursor, returning the number of
    /// bytes read. Zero means end of data.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Fill `buf` entirely, failing with [`Error::UnexpectedEof`] if the
    /// source is exhausted first. The error carries how many bytes were
    /// actually read.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut filled = 0;
        while filled < buf.len() {
            let num_bytes_read = self.read(&mut buf[filled..])?;
            if num_bytes_read == 0 {
                return Err(Error::UnexpectedEof(buf.len() as u64, filled as u64));
            }
            filled += num_bytes_read;
        }
        Ok(())
    }

    /// Seek to `offset` then fill `buf` entirely.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<(), Error> {
        self.seek(offset)?;
        self.read_exact(buf)
    }
}

impl<T> SeekableByteSource for T
where
    T: Read + Seek,
{
    fn seek(&mut self, offset: u64) -> Result<(), Error> {
        Seek::seek(self, SeekFrom::Start(offset))?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64, Error> {
        Ok(self.stream_position()?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        Ok(Read::read(self, buf)?)
    }
}
