//! Element and slab decoding of an image HDU.
//!
//! FITS orders image elements column-major: NAXIS1 varies fastest, then
//! NAXIS2, and so on. Every coordinate taken or returned by this module
//! follows that convention, with `coord[0]` indexing the NAXIS1 axis.

use crate::error::Error;
use crate::hdu::catalog::HduBoundaries;
use crate::hdu::data::{decode_value, TypedValue};
use crate::hdu::header::Header;
use crate::hdu::schema::ImageLayout;
use crate::source::SeekableByteSource;

/// A located image HDU (the primary included): parsed header, derived
/// layout and an exclusive borrow of the source handle.
#[derive(Debug)]
pub struct ImageHdu<'a, R> {
    reader: &'a mut R,
    boundaries: HduBoundaries,
    header: Header,
    layout: ImageLayout,
}

impl<'a, R> ImageHdu<'a, R>
where
    R: SeekableByteSource,
{
    pub(crate) fn new(
        reader: &'a mut R,
        boundaries: HduBoundaries,
        header: Header,
        layout: ImageLayout,
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

    pub fn layout(&self) -> &ImageLayout {
        &self.layout
    }

    /// Axis sizes in FITS order: `dimensions()[0]` is NAXIS1.
    pub fn dimensions(&self) -> &[u64] {
        &self.layout.axes
    }

    /// Total number of elements, zero for an empty (NAXIS = 0) image.
    pub fn element_count(&self) -> u64 {
        self.layout.element_count()
    }

    /// Read and decode the element at `coord` (one index per axis,
    /// NAXIS1 first).
    pub fn read_element(&mut self, coord: &[u64]) -> Result<TypedValue, Error> {
        let index = self.linear_index(coord)?;
        let offset = self.boundaries.data_start + index * u64::from(self.layout.element_bytes);

        let mut buf = [0_u8; 8];
        let element = &mut buf[..self.layout.element_bytes as usize];
        self.reader.read_exact_at(offset, element)?;
        decode_value(&self.layout.element_type, element)
    }

    /// Read a contiguous rectangular region: `extent[i]` elements along
    /// axis `i` starting at `origin[i]`.
    ///
    /// The returned vector is ordered column-major like the file itself,
    /// so the run along NAXIS1 comes out contiguously; a slab covering
    /// the whole image returns the elements in storage order.
    pub fn read_slab(
        &mut self,
        origin: &[u64],
        extent: &[u64],
    ) -> Result<Vec<TypedValue>, Error> {
        let axes = &self.layout.axes;
        if origin.len() != axes.len() || extent.len() != axes.len() {
            return Err(Error::ElementOutOfBounds(origin.to_vec(), axes.clone()));
        }
        for axis in 0..axes.len() {
            let stop = origin[axis]
                .checked_add(extent[axis])
                .ok_or_else(|| Error::ElementOutOfBounds(origin.to_vec(), axes.clone()))?;
            if stop > axes[axis] {
                return Err(Error::ElementOutOfBounds(origin.to_vec(), axes.clone()));
            }
        }
        if axes.is_empty() || extent.iter().any(|&e| e == 0) {
            return Ok(Vec::new());
        }

        let element_bytes = self.layout.element_bytes as usize;
        let run_len = extent[0] as usize;
        let mut run_buf = vec![0_u8; run_len * element_bytes];
        let mut values = Vec::with_capacity(extent.iter().product::<u64>() as usize);

        // Odometer over the outer axes; the innermost run is contiguous
        // in the file and read in one shot.
        let mut offsets = vec![0_u64; axes.len()];
        loop {
            let coord: Vec<u64> = origin
                .iter()
                .zip(&offsets)
                .map(|(start, delta)| start + delta)
                .collect();
            let index = self.linear_index(&coord)?;
            let offset = self.boundaries.data_start + index * element_bytes as u64;
            self.reader.read_exact_at(offset, &mut run_buf)?;
            for element in run_buf.chunks_exact(element_bytes) {
                values.push(decode_value(&self.layout.element_type, element)?);
            }

            let mut axis = 1;
            loop {
                if axis >= axes.len() {
                    return Ok(values);
                }
                offsets[axis] += 1;
                if offsets[axis] < extent[axis] {
                    break;
                }
                offsets[axis] = 0;
                axis += 1;
            }
        }
    }

    /// Linear element index of `coord` under column-major ordering:
    /// `coord[0] + coord[1] * NAXIS1 + coord[2] * NAXIS1 * NAXIS2 + ...`
    fn linear_index(&self, coord: &[u64]) -> Result<u64, Error> {
        let axes = &self.layout.axes;
        // An empty (NAXIS = 0) image has no addressable element.
        if coord.len() != axes.len() || axes.is_empty() {
            return Err(Error::ElementOutOfBounds(coord.to_vec(), axes.clone()));
        }

        let mut index = 0_u64;
        let mut stride = 1_u64;
        for (&position, &size) in coord.iter().zip(axes.iter()) {
            if position >= size {
                return Err(Error::ElementOutOfBounds(coord.to_vec(), axes.clone()));
            }
            index += position * stride;
            stride *= size;
        }
        Ok(index)
    }
}
