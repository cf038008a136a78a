use serde::Serialize;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// The underlying byte source failed to read or seek
        Io(err: std::io::Error) {
            from()
            source(err)
            display("i/o error: {}", err)
        }
        /// Fewer bytes were available than a header block, a row or an element requires
        UnexpectedEof(needed: u64, got: u64) {
            display("unexpected end of data: needed {} bytes, got {}", needed, got)
        }
        /// A mandatory card (e.g. TFORM3 in a BINTABLE) is absent from the header
        MissingRequiredCard(keyword: String) {
            display("missing required card {}", keyword)
        }
        /// The value area of a card could not be parsed where a value was required
        MalformedCard(line: String) {
            display("malformed card: {:?}", line)
        }
        /// The TFORM letter code is not one this crate decodes
        UnsupportedTForm(token: String) {
            display("unsupported TFORM {:?}", token)
        }
        /// Repeat counts on numeric TFORMs (e.g. 3E) are a known limitation
        UnsupportedRepeat(token: String) {
            display("TFORM {:?} carries a repeat count, which is not supported", token)
        }
        /// The column widths given by the TFORMs do not sum up to NAXIS1
        RowSizeMismatch(declared: u64, computed: u64) {
            display("NAXIS1 = {} but the TFORMs sum up to {} bytes per row", declared, computed)
        }
        /// Asked for an HDU past the end of the file
        HduIndexOutOfRange(requested: usize, total: usize) {
            display("HDU index {} out of range: the file holds {} HDUs", requested, total)
        }
        /// The XTENSION value names an HDU flavor this crate does not decode
        UnknownHduType(xtension: String) {
            display("unknown XTENSION {:?}", xtension)
        }
        /// A logical byte was neither 'T', 'F' nor 0x00
        MalformedBool(byte: u8) {
            display("malformed logical byte 0x{:02X}", byte)
        }
        /// Asked for a row past NAXIS2
        RowIndexOutOfRange(requested: u64, total: u64) {
            display("row {} out of range: the table holds {} rows", requested, total)
        }
        /// Asked for a column past TFIELDS
        ColumnIndexOutOfRange(requested: usize, total: usize) {
            display("column {} out of range: the table holds {} columns", requested, total)
        }
        /// An image coordinate or slab lies outside the NAXISn axes
        ElementOutOfBounds(coord: Vec<u64>, axes: Vec<u64>) {
            display("coordinate {:?} out of bounds for an image of axes {:?}", coord, axes)
        }
    }
}

/// A non-fatal diagnostic recorded while walking the HDUs of a file.
///
/// Warnings never abort the walk. They are accumulated by the
/// [catalog](crate::hdu::catalog::HduCatalog) and surfaced alongside the
/// boundaries instead of being written to any output stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// An XTENSION value other than IMAGE or BINTABLE was encountered.
    ///
    /// The HDU boundaries are still computed, from `NAXIS1 * NAXIS2` as a
    /// best effort, so that the HDUs following it stay reachable.
    UnknownHduType { hdu: usize, xtension: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::UnknownHduType { hdu, xtension } => {
                write!(f, "HDU {hdu} has an unknown XTENSION {xtension:?}")
            }
        }
    }
}
