//! This crate implements a seek-based FITS HDU navigator and decoder
//!
//! A FITS file is a sequence of Header-Data Units with no central
//! directory: the byte boundaries of the N-th HDU only exist once the
//! headers of the HDUs before it have been parsed. [`Fits`] walks a
//! [`SeekableByteSource`] to compute those boundaries, parses each ASCII
//! header into typed cards, derives a column or element schema, and
//! decodes binary-table rows and image elements to [`TypedValue`]s,
//! big-endian and unscaled.
//!
//! # Examples
//!
//! Basic usage:
//!
//! ```
//! use std::io::Cursor;
//!
//! use fitsnav::{Fits, HDU};
//!
//! // An empty primary HDU: one bare header block.
//! let mut raw = Vec::new();
//! for line in [
//!     "SIMPLE  =                    T",
//!     "BITPIX  =                    8",
//!     "NAXIS   =                    0",
//!     "END",
//! ] {
//!     let mut card = line.as_bytes().to_vec();
//!     card.resize(80, b' ');
//!     raw.extend_from_slice(&card);
//! }
//! raw.resize(2880, b' ');
//!
//! let mut fits = Fits::from_source(Cursor::new(raw));
//! assert_eq!(fits.count(), 1);
//!
//! match fits.hdu(0)? {
//!     HDU::Image(image) => assert_eq!(image.element_count(), 0),
//!     HDU::BinaryTable(_) => unreachable!(),
//! }
//! # Ok::<(), fitsnav::Error>(())
//! ```

#![doc = include_str!("../README.md")]
#![warn(
    trivial_casts,
    trivial_numeric_casts,
    clippy::uninlined_format_args,
    clippy::match_same_arms
)]

#[macro_use]
extern crate quick_error;

pub mod card;
pub mod error;
pub mod fits;
pub mod hdu;
pub mod source;

pub use card::{Card, CardValue, Value};
pub use error::{Error, Warning};
pub use fits::{Fits, HDU};
pub use hdu::catalog::{HduBoundaries, HduCatalog};
pub use hdu::data::{decode_value, BinaryTableHdu, ImageHdu, TypedValue};
pub use hdu::header::Header;
pub use hdu::schema::{
    BinaryTableLayout, Bitpix, ColumnSpec, Field, FieldForm, ImageLayout, Schema, TForm,
};
pub use source::SeekableByteSource;

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::fits::{Fits, HDU};
    use crate::hdu::header::BLOCK_SIZE;
    use crate::hdu::schema::{FieldForm, TForm};
    use crate::hdu::data::TypedValue;

    use std::io::Cursor;

    /// Lay out `lines` as 80-byte cards padded to a whole header block.
    fn header_block(lines: &[&str]) -> Vec<u8> {
        let mut raw = Vec::new();
        for line in lines {
            let mut card = line.as_bytes().to_vec();
            card.resize(80, b' ');
            raw.extend_from_slice(&card);
        }
        let padded = raw.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        raw.resize(padded, b' ');
        raw
    }

    /// Pad a data area with zeros up to the block boundary.
    fn data_block(mut data: Vec<u8>) -> Vec<u8> {
        let padded = data.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
        data.resize(padded, 0);
        data
    }

    fn empty_primary() -> Vec<u8> {
        header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                    8",
            "NAXIS   =                    0",
            "END",
        ])
    }

    /// One 34-byte row of the sky-survey table below.
    fn survey_row(target: &str, ra: f32, dec: f64, index: i64, run_id: i32) -> Vec<u8> {
        let mut row = target.as_bytes().to_vec();
        row.resize(10, b' ');
        row.extend_from_slice(&ra.to_be_bytes());
        row.extend_from_slice(&dec.to_be_bytes());
        row.extend_from_slice(&index.to_be_bytes());
        row.extend_from_slice(&run_id.to_be_bytes());
        row
    }

    /// An empty primary followed by a five-row, five-column BINTABLE.
    fn sky_survey_file() -> Vec<u8> {
        let mut raw = empty_primary();
        raw.extend_from_slice(&header_block(&[
            "XTENSION= 'BINTABLE'           / binary table extension",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   34",
            "NAXIS2  =                    5",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "TFIELDS =                    5",
            "TTYPE1  = 'target  '",
            "TFORM1  = '10A     '",
            "TTYPE2  = 'RA      '",
            "TFORM2  = 'E       '",
            "TTYPE3  = 'Dec     '",
            "TFORM3  = 'D       '",
            "TTYPE4  = 'Index   '",
            "TFORM4  = 'K       '",
            "TTYPE5  = 'RunId   '",
            "TFORM5  = 'J       '",
            "END",
        ]));
        let mut data = Vec::new();
        for row in 0..5_i64 {
            data.extend_from_slice(&survey_row(
                &format!("NGC000000{row}"),
                3.448297 + row as f32,
                -0.338_748_632_478_464_1 - row as f64,
                row,
                row as i32 + 1,
            ));
        }
        raw.extend_from_slice(&data_block(data));
        raw
    }

    fn table_hdu(fits: &mut Fits<Cursor<Vec<u8>>>) -> crate::BinaryTableHdu<'_, Cursor<Vec<u8>>> {
        match fits.hdu(1).unwrap() {
            HDU::BinaryTable(table) => table,
            HDU::Image(_) => panic!("HDU 1 should be a binary table"),
        }
    }

    #[test]
    fn test_survey_boundaries_and_schema() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        assert_eq!(fits.count(), 2);
        assert!(fits.warnings().is_empty());

        let bounds = fits.boundaries(1).unwrap();
        assert_eq!(bounds.header_start, 2880);
        assert_eq!(bounds.data_start, 5760);
        assert_eq!(bounds.data_stop, 5760 + 34 * 5);
        assert_eq!(bounds.hdu_stop, 8640);

        let table = table_hdu(&mut fits);
        assert_eq!(table.row_count(), 5);
        assert_eq!(table.layout().row_bytes, 34);
        let forms: Vec<_> = table
            .layout()
            .columns
            .iter()
            .map(|column| column.form)
            .collect();
        assert_eq!(
            forms,
            vec![
                TForm::FixedString(10),
                TForm::Float32,
                TForm::Float64,
                TForm::Int64,
                TForm::Int32,
            ]
        );
    }

    #[test]
    fn test_survey_first_row() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let mut table = table_hdu(&mut fits);

        let row = table.read_row(0).unwrap();
        assert_eq!(
            row,
            vec![
                TypedValue::String("NGC0000000".to_owned()),
                TypedValue::Float32(3.448297),
                TypedValue::Float64(-0.338_748_632_478_464_1),
                TypedValue::Int64(0),
                TypedValue::Int32(1),
            ]
        );
    }

    #[test]
    fn test_survey_fields() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let hdu = fits.hdu(1).unwrap();

        let fields = hdu.fields();
        let names: Vec<_> = fields.iter().map(|field| field.name.as_str()).collect();
        assert_eq!(names, vec!["target", "RA", "Dec", "Index", "RunId"]);
        assert!(fields.iter().all(|field| field.nullable));
        assert_eq!(fields[1].form, FieldForm::Scalar(TForm::Float32));
    }

    /// Invariants 1-3: block alignment of every boundary and the
    /// count/locate contract.
    #[test]
    fn test_boundary_invariants() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let total = fits.count();
        assert_eq!(total, 2);

        for index in 0..total {
            let bounds = fits.boundaries(index).unwrap();
            let header_len = bounds.data_start - bounds.header_start;
            let hdu_len = bounds.hdu_stop - bounds.header_start;
            assert!(header_len > 0 && header_len % 2880 == 0);
            assert!(hdu_len > 0 && hdu_len % 2880 == 0);
        }

        assert!(fits.boundaries(total - 1).is_ok());
        match fits.boundaries(total) {
            Err(Error::HduIndexOutOfRange(requested, found)) => {
                assert_eq!((requested, found), (total, total));
            }
            other => panic!("expected HduIndexOutOfRange, got {:?}", other),
        }
    }

    /// Scenario: asking for HDU 7 of a two-HDU file.
    #[test]
    fn test_locate_far_out_of_range() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        match fits.boundaries(7) {
            Err(Error::HduIndexOutOfRange(requested, total)) => {
                assert_eq!((requested, total), (7, 2));
            }
            other => panic!("expected HduIndexOutOfRange, got {:?}", other),
        }
    }

    /// A 17-byte row table: 85 payload bytes, one padded data block.
    #[test]
    fn test_data_padding() {
        let mut raw = empty_primary();
        raw.extend_from_slice(&header_block(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   17",
            "NAXIS2  =                    5",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "TFIELDS =                    4",
            "TFORM1  = '10A     '",
            "TFORM2  = 'E       '",
            "TFORM3  = 'I       '",
            "TFORM4  = 'L       '",
            "END",
        ]));
        raw.extend_from_slice(&data_block(vec![0_u8; 17 * 5]));

        let mut fits = Fits::from_source(Cursor::new(raw));
        let bounds = fits.boundaries(1).unwrap();
        assert_eq!(bounds.data_stop - bounds.data_start, 85);
        assert_eq!(bounds.hdu_stop - bounds.data_start, 2880);
    }

    fn logical_column_file(bytes: &[u8]) -> Vec<u8> {
        let mut raw = empty_primary();
        raw.extend_from_slice(&header_block(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                    1",
            &format!("NAXIS2  =                    {}", bytes.len()),
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "TFIELDS =                    1",
            "TTYPE1  = 'flag    '",
            "TFORM1  = 'L       '",
            "END",
        ]));
        raw.extend_from_slice(&data_block(bytes.to_vec()));
        raw
    }

    #[test]
    fn test_logical_column() {
        let mut fits = Fits::from_source(Cursor::new(logical_column_file(b"TFTTF")));
        let mut table = table_hdu(&mut fits);

        let flags = table.read_column_range(0, 0, 5).unwrap();
        assert_eq!(
            flags,
            vec![
                TypedValue::Bool(true),
                TypedValue::Bool(false),
                TypedValue::Bool(true),
                TypedValue::Bool(true),
                TypedValue::Bool(false),
            ]
        );
    }

    #[test]
    fn test_logical_column_null_and_malformed() {
        let mut fits = Fits::from_source(Cursor::new(logical_column_file(&[b'T', 0x00, 0x42])));
        let mut table = table_hdu(&mut fits);

        assert_eq!(table.read_row(1).unwrap(), vec![TypedValue::Null]);
        match table.read_row(2) {
            Err(Error::MalformedBool(byte)) => assert_eq!(byte, 0x42),
            other => panic!("expected MalformedBool, got {:?}", other),
        }
    }

    /// Scenario: an unsupported TFORM letter aborts the schema, no
    /// partial schema comes back.
    #[test]
    fn test_unsupported_tform_aborts_schema() {
        let mut raw = empty_primary();
        raw.extend_from_slice(&header_block(&[
            "XTENSION= 'BINTABLE'",
            "BITPIX  =                    8",
            "NAXIS   =                    2",
            "NAXIS1  =                   12",
            "NAXIS2  =                    1",
            "PCOUNT  =                    0",
            "GCOUNT  =                    1",
            "TFIELDS =                    2",
            "TFORM1  = '10A     '",
            "TFORM2  = 'Z       '",
            "END",
        ]));
        raw.extend_from_slice(&data_block(vec![0_u8; 12]));

        let mut fits = Fits::from_source(Cursor::new(raw));
        match fits.hdu(1) {
            Err(Error::UnsupportedTForm(token)) => assert_eq!(token, "Z"),
            other => panic!("expected UnsupportedTForm, got {:?}", other),
        }
    }

    /// Scenario: a 3x2 f32 image comes back in FITS column-major order,
    /// NAXIS1 varying fastest.
    #[test]
    fn test_image_column_major() {
        let pixels: [f32; 6] = [0.5, 1.5, 2.5, 3.5, 4.5, 5.5];
        let mut data = Vec::new();
        for pixel in pixels {
            data.extend_from_slice(&pixel.to_be_bytes());
        }
        let mut raw = header_block(&[
            "SIMPLE  =                    T",
            "BITPIX  =                  -32",
            "NAXIS   =                    2",
            "NAXIS1  =                    3",
            "NAXIS2  =                    2",
            "END",
        ]);
        raw.extend_from_slice(&data_block(data));

        let mut fits = Fits::from_source(Cursor::new(raw));
        let mut image = match fits.hdu(0).unwrap() {
            HDU::Image(image) => image,
            HDU::BinaryTable(_) => panic!("the primary HDU is an image"),
        };

        assert_eq!(image.dimensions(), &[3, 2]);
        assert_eq!(image.element_count(), 6);

        let all = image.read_slab(&[0, 0], &[3, 2]).unwrap();
        let expected: Vec<_> = pixels.iter().map(|&p| TypedValue::Float32(p)).collect();
        assert_eq!(all, expected);

        // (2, 1) is the last element of the storage order.
        assert_eq!(
            image.read_element(&[2, 1]).unwrap(),
            TypedValue::Float32(5.5)
        );
        // A 2x1 slab out of the middle.
        assert_eq!(
            image.read_slab(&[1, 1], &[2, 1]).unwrap(),
            vec![TypedValue::Float32(4.5), TypedValue::Float32(5.5)]
        );

        match image.read_element(&[3, 0]) {
            Err(Error::ElementOutOfBounds(coord, axes)) => {
                assert_eq!(coord, vec![3, 0]);
                assert_eq!(axes, vec![3, 2]);
            }
            other => panic!("expected ElementOutOfBounds, got {:?}", other),
        }
    }

    /// Invariant 6: a column range equals the per-row reads of that
    /// column, in order.
    #[test]
    fn test_column_range_matches_rows() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let mut table = table_hdu(&mut fits);

        let rows: Vec<Vec<TypedValue>> = (0..table.row_count())
            .map(|row| table.read_row(row).unwrap())
            .collect();
        for col in 0..table.layout().columns.len() {
            let column = table.read_column_range(col, 0, 5).unwrap();
            let from_rows: Vec<TypedValue> =
                rows.iter().map(|row| row[col].clone()).collect();
            assert_eq!(column, from_rows);
        }
    }

    /// Invariant 5: decoding a hand-encoded row buffer round-trips
    /// elementwise, NaN compared bitwise.
    #[test]
    fn test_row_buffer_round_trip() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let table = table_hdu(&mut fits);

        let nan32 = f32::from_bits(0x7FC0_1234);
        let nan64 = f64::from_bits(0x7FF8_0000_0000_BEEF);
        let buf = survey_row("J1745-2900", nan32, nan64, i64::MIN, -7);

        let row = table.read_row_from_buffer(&buf).unwrap();
        assert_eq!(row[0], TypedValue::String("J1745-2900".to_owned()));
        match (&row[1], &row[2]) {
            (TypedValue::Float32(ra), TypedValue::Float64(dec)) => {
                assert_eq!(ra.to_bits(), nan32.to_bits());
                assert_eq!(dec.to_bits(), nan64.to_bits());
            }
            other => panic!("expected floats, got {:?}", other),
        }
        assert_eq!(row[3], TypedValue::Int64(i64::MIN));
        assert_eq!(row[4], TypedValue::Int32(-7));

        // A short buffer never decodes half a row.
        assert!(matches!(
            table.read_row_from_buffer(&buf[..20]),
            Err(Error::UnexpectedEof(34, 20))
        ));
    }

    #[test]
    fn test_row_and_column_bounds() {
        let mut fits = Fits::from_source(Cursor::new(sky_survey_file()));
        let mut table = table_hdu(&mut fits);

        assert!(matches!(
            table.read_row(5),
            Err(Error::RowIndexOutOfRange(5, 5))
        ));
        assert!(matches!(
            table.read_column_range(9, 0, 5),
            Err(Error::ColumnIndexOutOfRange(9, 5))
        ));
        assert!(matches!(
            table.read_column_range(0, 0, 6),
            Err(Error::RowIndexOutOfRange(6, 5))
        ));
        assert_eq!(table.read_column_range(0, 3, 3).unwrap(), Vec::new());
    }

    /// The walk of one handle is deterministic: a second independent
    /// handle over the same bytes computes the same boundaries.
    #[test]
    fn test_walk_is_idempotent() {
        let raw = sky_survey_file();
        let mut first = Fits::from_source(Cursor::new(raw.clone()));
        let mut second = Fits::from_source(Cursor::new(raw));

        assert_eq!(first.count(), second.count());
        for index in 0..2 {
            assert_eq!(
                first.boundaries(index).unwrap(),
                second.boundaries(index).unwrap()
            );
        }
    }

    /// A worker reading a disjoint row range through its own handle, the
    /// access pattern of the partitioned outer layer.
    #[test]
    fn test_disjoint_row_ranges() {
        let raw = sky_survey_file();
        let mut head = Fits::from_source(Cursor::new(raw.clone()));
        let mut tail = Fits::from_source(Cursor::new(raw));

        let mut head_table = table_hdu(&mut head);
        let mut tail_table = table_hdu(&mut tail);
        let head_ids = head_table.read_column_range(4, 0, 2).unwrap();
        let tail_ids = tail_table.read_column_range(4, 2, 5).unwrap();

        let ids: Vec<_> = head_ids.into_iter().chain(tail_ids).collect();
        assert_eq!(
            ids,
            (1..=5).map(TypedValue::Int32).collect::<Vec<_>>()
        );
    }
}
