//! Entry point: own a source, walk its HDUs, hand out typed views.

use crate::error::{Error, Warning};
use crate::hdu::catalog::{HduBoundaries, HduCatalog};
use crate::hdu::data::{BinaryTableHdu, ImageHdu};
use crate::hdu::header::Header;
use crate::hdu::schema::{Field, Schema};
use crate::source::SeekableByteSource;

/// A FITS file seen through one source handle.
///
/// The handle and its cursor are exclusive to this value; the catalog it
/// builds is cached, so locating the same HDU twice costs one header
/// re-parse and no re-walk. Workers wanting parallelism open independent
/// handles and build one `Fits` each.
#[derive(Debug)]
pub struct Fits<R> {
    reader: R,
    catalog: HduCatalog,
}

impl<R> Fits<R>
where
    R: SeekableByteSource,
{
    /// Wrap a source positioned anywhere; all reads are positional.
    pub fn from_source(reader: R) -> Self {
        Self {
            reader,
            catalog: HduCatalog::new(),
        }
    }

    /// Number of HDUs, walking the whole file. A torn trailing HDU stops
    /// the walk without being counted.
    pub fn count(&mut self) -> usize {
        self.catalog.count(&mut self.reader)
    }

    /// Byte boundaries of the `index`-th HDU.
    pub fn boundaries(&mut self, index: usize) -> Result<HduBoundaries, Error> {
        self.catalog.locate(&mut self.reader, index)
    }

    /// Non-fatal diagnostics accumulated by the walk so far.
    pub fn warnings(&self) -> &[Warning] {
        self.catalog.warnings()
    }

    /// Locate the `index`-th HDU, parse its header, derive its schema
    /// and return the matching typed view.
    pub fn hdu(&mut self, index: usize) -> Result<HDU<'_, R>, Error> {
        let boundaries = self.catalog.locate(&mut self.reader, index)?;
        let header = Header::parse_at(&mut self.reader, boundaries.header_start)?;

        Ok(match Schema::build(&header)? {
            Schema::Image(layout) => {
                HDU::Image(ImageHdu::new(&mut self.reader, boundaries, header, layout))
            }
            Schema::BinaryTable(layout) => HDU::BinaryTable(BinaryTableHdu::new(
                &mut self.reader,
                boundaries,
                header,
                layout,
            )),
        })
    }

    /// Release the source handle.
    pub fn into_source(self) -> R {
        self.reader
    }
}

/// A located, typed HDU view. Borrows the source handle mutably for as
/// long as it lives: decoding mutates the cursor.
#[derive(Debug)]
pub enum HDU<'a, R> {
    /// The primary HDU or an IMAGE extension.
    Image(ImageHdu<'a, R>),
    /// A BINTABLE extension.
    BinaryTable(BinaryTableHdu<'a, R>),
}

impl<'a, R> HDU<'a, R>
where
    R: SeekableByteSource,
{
    pub fn header(&self) -> &Header {
        match self {
            HDU::Image(hdu) => hdu.header(),
            HDU::BinaryTable(hdu) => hdu.header(),
        }
    }

    pub fn boundaries(&self) -> HduBoundaries {
        match self {
            HDU::Image(hdu) => hdu.boundaries(),
            HDU::BinaryTable(hdu) => hdu.boundaries(),
        }
    }

    /// The emitted schema of this HDU: per-column fields for a table,
    /// one array field for an image.
    pub fn fields(&self) -> Vec<Field> {
        match self {
            HDU::Image(hdu) => hdu.layout().fields(),
            HDU::BinaryTable(hdu) => hdu.layout().fields(),
        }
    }
}
