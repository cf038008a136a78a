//! Binary-table layout: TFORM parsing, column specs and split offsets.

use serde::Serialize;

use crate::error::Error;
use crate::hdu::header::{require_string, require_uint, Header};

/// A column (or image element) form, the decoded counterpart of the FITS
/// one-letter TFORM codes `I J K E D L A`.
///
/// Repeat counts on numeric forms (`3E`, `2J`, ...) are a known
/// limitation: they fail with [`Error::UnsupportedRepeat`] instead of
/// silently decoding the first element. A count on `A` is the string
/// length, per the FITS convention.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum TForm {
    /// 'I': signed 16-bit integer
    Int16,
    /// 'J': signed 32-bit integer
    Int32,
    /// 'K': signed 64-bit integer
    Int64,
    /// 'E': IEEE-754 binary32
    Float32,
    /// 'D': IEEE-754 binary64
    Float64,
    /// 'L': one logical byte
    Bool,
    /// 'nA': a fixed-width ASCII field of n bytes
    FixedString(u32),
}

impl TForm {
    /// Parse a trimmed TFORM token, e.g. `"E"`, `"10A"`.
    pub fn parse(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        let split = token
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| Error::UnsupportedTForm(token.to_owned()))?;
        let (digits, rest) = token.split_at(split);

        let mut chars = rest.chars();
        let letter = match chars.next() {
            Some(letter) if chars.as_str().is_empty() => letter,
            // Trailing material (display widths, array descriptors) is
            // beyond what this crate decodes.
            _ => return Err(Error::UnsupportedTForm(token.to_owned())),
        };
        let repeat: u32 = if digits.is_empty() {
            1
        } else {
            digits
                .parse()
                .map_err(|_| Error::UnsupportedTForm(token.to_owned()))?
        };

        let form = match letter {
            'A' => return Ok(TForm::FixedString(repeat)),
            'I' => TForm::Int16,
            'J' => TForm::Int32,
            'K' => TForm::Int64,
            'E' => TForm::Float32,
            'D' => TForm::Float64,
            'L' => TForm::Bool,
            _ => return Err(Error::UnsupportedTForm(token.to_owned())),
        };
        if repeat != 1 {
            return Err(Error::UnsupportedRepeat(token.to_owned()));
        }
        Ok(form)
    }

    /// Width in bytes of one cell of this form.
    pub fn byte_size(&self) -> u32 {
        match self {
            TForm::Int16 => 2,
            TForm::Int32 | TForm::Float32 => 4,
            TForm::Int64 | TForm::Float64 => 8,
            TForm::Bool => 1,
            TForm::FixedString(len) => *len,
        }
    }
}

/// One column of a binary table.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ColumnSpec {
    /// Zero-based column position.
    pub index: u32,
    /// The TTYPE{index+1} value, or `col{index+1}` when absent.
    pub name: String,
    pub form: TForm,
}

/// The byte layout of a binary table, derived from `TFIELDS`, the
/// `TFORMn`/`TTYPEn` cards and `NAXIS1`/`NAXIS2`.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct BinaryTableLayout {
    pub columns: Vec<ColumnSpec>,
    /// Bytes per row (NAXIS1).
    pub row_bytes: u32,
    /// Number of rows (NAXIS2).
    pub row_count: u64,
    /// `columns.len() + 1` cumulative offsets: column `i` occupies
    /// `split_offsets[i]..split_offsets[i + 1]` within a row.
    pub split_offsets: Vec<u32>,
}

impl BinaryTableLayout {
    pub(crate) fn from_header(header: &Header) -> Result<Self, Error> {
        let tfields = require_uint(header, "TFIELDS")?;
        let row_bytes = require_uint(header, "NAXIS1")?;
        let row_count = require_uint(header, "NAXIS2")?;

        let mut columns = Vec::with_capacity(tfields as usize);
        let mut split_offsets = Vec::with_capacity(tfields as usize + 1);
        let mut offset = 0_u64;
        split_offsets.push(0);
        for index in 0..tfields as u32 {
            let name = match header.get_parsed::<String>(&format!("TTYPE{}", index + 1)) {
                Some(name) => name?,
                None => format!("col{}", index + 1),
            };
            let form = TForm::parse(&require_string(header, &format!("TFORM{}", index + 1))?)?;

            offset += u64::from(form.byte_size());
            split_offsets.push(offset as u32);
            columns.push(ColumnSpec { index, name, form });
        }

        if offset != row_bytes {
            return Err(Error::RowSizeMismatch(row_bytes, offset));
        }

        Ok(BinaryTableLayout {
            columns,
            row_bytes: row_bytes as u32,
            row_count,
            split_offsets,
        })
    }

    /// The emitted schema: one nullable scalar field per column.
    pub fn fields(&self) -> Vec<super::Field> {
        self.columns
            .iter()
            .map(|column| super::Field {
                name: column.name.clone(),
                form: super::FieldForm::Scalar(column.form),
                nullable: true,
            })
            .collect()
    }
}
