//! Linear HDU walk computing byte boundaries.
//!
//! FITS has no central directory: the only way to find the N-th HDU is to
//! parse the header of every HDU before it and add up the data lengths
//! they declare. The walk is cheap (a handful of block reads per HDU), so
//! a concurrent reader opens one source handle per worker and re-runs it
//! rather than sharing state.

use log::warn;
use serde::Serialize;

use crate::error::{Error, Warning};
use crate::hdu::header::{Header, BLOCK_SIZE};
use crate::source::SeekableByteSource;

/// The byte extent of one HDU.
///
/// `header_start <= data_start <= data_stop <= hdu_stop`, with
/// `data_start - header_start` and `hdu_stop - header_start` both
/// multiples of 2880. An empty HDU (e.g. a primary with `NAXIS = 0`) has
/// `data_start == data_stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HduBoundaries {
    /// First byte of the header.
    pub header_start: u64,
    /// First byte of the data area, right after the header padding.
    pub data_start: u64,
    /// One past the last meaningful data byte.
    pub data_stop: u64,
    /// One past the data padding; the next HDU starts here.
    pub hdu_stop: u64,
}

impl HduBoundaries {
    /// Meaningful data bytes, padding excluded.
    pub fn data_len(&self) -> u64 {
        self.data_stop - self.data_start
    }
}

/// The incrementally built list of HDU boundaries of one file.
///
/// The catalog caches every boundary it has computed; `locate` and
/// `count` only extend the walk when asked past what is cached. It holds
/// no reference to the source, so one catalog can follow a handle through
/// its whole life while staying plain data.
#[derive(Debug, Default, Clone, Serialize)]
pub struct HduCatalog {
    boundaries: Vec<HduBoundaries>,
    warnings: Vec<Warning>,
    /// Where the next unparsed HDU starts.
    cursor: u64,
    /// Set once the walk hit a clean end of file or a terminal error.
    exhausted: bool,
}

impl HduCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Boundaries of the `index`-th HDU, walking forward as needed.
    ///
    /// Fails with [`Error::HduIndexOutOfRange`] when the file holds fewer
    /// HDUs, or with the walk error if the file is torn before `index`.
    pub fn locate<R>(&mut self, reader: &mut R, index: usize) -> Result<HduBoundaries, Error>
    where
        R: SeekableByteSource,
    {
        while self.boundaries.len() <= index && !self.exhausted {
            self.walk_one(reader)?;
        }
        self.boundaries
            .get(index)
            .copied()
            .ok_or(Error::HduIndexOutOfRange(index, self.boundaries.len()))
    }

    /// Number of HDUs in the file.
    ///
    /// Walks to the end, swallowing the terminating condition: a torn
    /// trailing HDU does not make the HDUs before it unreachable.
    pub fn count<R>(&mut self, reader: &mut R) -> usize
    where
        R: SeekableByteSource,
    {
        while !self.exhausted {
            if self.walk_one(reader).is_err() {
                break;
            }
        }
        self.boundaries.len()
    }

    /// Boundaries walked so far.
    pub fn boundaries(&self) -> &[HduBoundaries] {
        &self.boundaries
    }

    /// Non-fatal diagnostics accumulated while walking.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Parse one more header and push its boundaries.
    fn walk_one<R>(&mut self, reader: &mut R) -> Result<(), Error>
    where
        R: SeekableByteSource,
    {
        let header_start = self.cursor;
        let header = match Header::parse_at(reader, header_start) {
            Ok(header) => header,
            // Not a single byte past the previous HDU: clean end of file.
            Err(Error::UnexpectedEof(_, 0)) => {
                self.exhausted = true;
                return Ok(());
            }
            Err(err) => {
                self.exhausted = true;
                return Err(err);
            }
        };

        let data_start = header_start + header.byte_size();
        let data_len = match self.data_len_of(&header) {
            Ok(data_len) => data_len,
            Err(err) => {
                self.exhausted = true;
                return Err(err);
            }
        };
        let data_stop = data_start + data_len;
        let hdu_stop = data_start + data_len.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64;

        self.boundaries.push(HduBoundaries {
            header_start,
            data_start,
            data_stop,
            hdu_stop,
        });
        self.cursor = hdu_stop;
        Ok(())
    }

    /// Length in bytes of the data area declared by `header`.
    fn data_len_of(&mut self, header: &Header) -> Result<u64, Error> {
        use crate::hdu::header::{require_int, require_uint};

        match header.xtension() {
            // The primary HDU is an image; IUEIMAGE is a legacy alias.
            None | Some("IMAGE") | Some("IUEIMAGE") => {
                let naxis = require_uint(header, "NAXIS")?;
                if naxis == 0 {
                    return Ok(0);
                }
                let bitpix = require_int(header, "BITPIX")?;
                let element_bytes = bitpix.unsigned_abs() / 8;
                let mut num_elements = 1_u64;
                for axis in 1..=naxis {
                    num_elements *= require_uint(header, &format!("NAXIS{axis}"))?;
                }
                Ok(element_bytes * num_elements)
            }
            Some("BINTABLE") => {
                Ok(require_uint(header, "NAXIS1")? * require_uint(header, "NAXIS2")?)
            }
            Some(other) => {
                // TABLE (ASCII tables) and the conventions beyond land
                // here: NAXIS1 * NAXIS2 keeps the walk on track even if
                // this crate cannot decode the payload.
                warn!("unknown XTENSION {other:?}, boundaries from NAXIS1 * NAXIS2");
                self.warnings.push(Warning::UnknownHduType {
                    hdu: self.boundaries.len(),
                    xtension: other.to_owned(),
                });
                let naxis1 = require_uint(header, "NAXIS1").unwrap_or(0);
                let naxis2 = require_uint(header, "NAXIS2").unwrap_or(0);
                Ok(naxis1 * naxis2)
            }
        }
    }
}
