//! Row and column decoding of a binary-table HDU.

use crate::error::Error;
use crate::hdu::catalog::HduBoundaries;
use crate::hdu::data::{decode_value, TypedValue};
use crate::hdu::header::Header;
use crate::hdu::schema::BinaryTableLayout;
use crate::source::SeekableByteSource;

/// A located binary-table HDU: the parsed header, the derived layout and
/// an exclusive borrow of the source handle.
///
/// Rows are fixed width (`NAXIS1` bytes), so any row or any column cell
/// is one seek away; the handle's cursor is mutated on every read, which
/// is why the view is single-threaded by construction. Dropping the view
/// releases the handle with nothing else to clean up.
#[derive(Debug)]
pub struct BinaryTableHdu<'a, R> {
    reader: &'a mut R,
    boundaries: HduBoundaries,
    header: Header,
    layout: BinaryTableLayout,
}

impl<'a, R> BinaryTableHdu<'a, R>
where
    R: SeekableByteSource,
{
    pub(crate) fn new(
        reader: &'a mut R,
        boundaries: HduBoundaries,
        header: Header,
        layout: BinaryTableLayout,
    ) -> Self {
        Self {
            reader,
            boundaries,
            header,
            layout,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn boundaries(&self) -> HduBoundaries {
        self.boundaries
    }

    pub fn layout(&self) -> &BinaryTableLayout {
        &self.layout
    }

    /// Number of rows (NAXIS2).
    pub fn row_count(&self) -> u64 {
        self.layout.row_count
    }

    /// Read and decode one row, leftmost column first.
    pub fn read_row(&mut self, row_index: u64) -> Result<Vec<TypedValue>, Error> {
        if row_index >= self.layout.row_count {
            return Err(Error::RowIndexOutOfRange(row_index, self.layout.row_count));
        }

        let row_bytes = self.layout.row_bytes as usize;
        let offset = self.boundaries.data_start + row_index * row_bytes as u64;
        let mut buf = vec![0_u8; row_bytes];
        self.reader.read_exact_at(offset, &mut buf)?;

        self.read_row_from_buffer(&buf)
    }

    /// Decode one row out of `buf` without touching the source. The
    /// outer ingestion layer uses this on rows it bulk-read itself.
    pub fn read_row_from_buffer(&self, buf: &[u8]) -> Result<Vec<TypedValue>, Error> {
        let row_bytes = self.layout.row_bytes as usize;
        if buf.len() < row_bytes {
            return Err(Error::UnexpectedEof(row_bytes as u64, buf.len() as u64));
        }

        // A plain left-to-right pass over the split offsets.
        let mut row = Vec::with_capacity(self.layout.columns.len());
        for column in &self.layout.columns {
            let start = self.layout.split_offsets[column.index as usize] as usize;
            let stop = self.layout.split_offsets[column.index as usize + 1] as usize;
            row.push(decode_value(&column.form, &buf[start..stop])?);
        }
        Ok(row)
    }

    /// Read one column over `row_start..row_stop`, seeking with a stride
    /// of `row_bytes` between cells. This is the access path a
    /// partitioned reader takes to pull disjoint row ranges through
    /// independent handles.
    pub fn read_column_range(
        &mut self,
        col_index: usize,
        row_start: u64,
        row_stop: u64,
    ) -> Result<Vec<TypedValue>, Error> {
        let column = self
            .layout
            .columns
            .get(col_index)
            .ok_or(Error::ColumnIndexOutOfRange(
                col_index,
                self.layout.columns.len(),
            ))?;
        if row_stop > self.layout.row_count {
            return Err(Error::RowIndexOutOfRange(row_stop, self.layout.row_count));
        }
        if row_start >= row_stop {
            return Ok(Vec::new());
        }

        let row_bytes = u64::from(self.layout.row_bytes);
        let col_offset = u64::from(self.layout.split_offsets[col_index]);
        let mut buf = vec![0_u8; column.form.byte_size() as usize];
        let mut values = Vec::with_capacity((row_stop - row_start) as usize);
        for row_index in row_start..row_stop {
            let offset = self.boundaries.data_start + row_index * row_bytes + col_offset;
            self.reader.read_exact_at(offset, &mut buf)?;
            values.push(decode_value(&column.form, &buf)?);
        }
        Ok(values)
    }
}
