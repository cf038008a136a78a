//! Image layout: BITPIX, axes and the element form they imply.

use serde::Serialize;
use serde_repr::Serialize_repr;

use crate::card::malformed;
use crate::error::Error;
use crate::hdu::header::{require_uint, Header};
use crate::hdu::schema::TForm;

/// The legal values of the BITPIX card; negative means floating point.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr)]
#[repr(i32)]
pub enum Bitpix {
    U8 = 8,
    I16 = 16,
    I32 = 32,
    I64 = 64,
    F32 = -32,
    F64 = -64,
}

impl Bitpix {
    /// Width in bytes of one element: `|BITPIX| / 8`.
    pub fn byte_size(&self) -> u32 {
        (*self as i32).unsigned_abs() / 8
    }

    /// The element form pixels decode to.
    ///
    /// `BITPIX = 8` maps to the one-byte logical form, so its pixels go
    /// through the `T`/`F`/`0x00` rule like table logicals do; an image
    /// holding arbitrary byte values is outside this decode contract.
    pub fn element_type(&self) -> TForm {
        match self {
            Bitpix::U8 => TForm::Bool,
            Bitpix::I16 => TForm::Int16,
            Bitpix::I32 => TForm::Int32,
            Bitpix::I64 => TForm::Int64,
            Bitpix::F32 => TForm::Float32,
            Bitpix::F64 => TForm::Float64,
        }
    }
}

/// The element layout of an image HDU (the primary included), derived
/// from `BITPIX`, `NAXIS` and the `NAXISn` cards.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct ImageLayout {
    pub bitpix: Bitpix,
    /// `|bitpix| / 8`.
    pub element_bytes: u32,
    /// Axis sizes in FITS order: `axes[0]` is NAXIS1, the fastest
    /// varying axis of the column-major element ordering.
    pub axes: Vec<u64>,
    pub element_type: TForm,
}

impl ImageLayout {
    pub(crate) fn from_header(header: &Header) -> Result<Self, Error> {
        let bitpix_card = header
            .card("BITPIX")
            .ok_or_else(|| Error::MissingRequiredCard("BITPIX".to_owned()))?;
        let bitpix = match crate::hdu::header::require_int(header, "BITPIX")? {
            8 => Bitpix::U8,
            16 => Bitpix::I16,
            32 => Bitpix::I32,
            64 => Bitpix::I64,
            -32 => Bitpix::F32,
            -64 => Bitpix::F64,
            _ => return Err(malformed(bitpix_card)),
        };

        let naxis = require_uint(header, "NAXIS")?;
        let axes = (1..=naxis)
            .map(|axis| require_uint(header, &format!("NAXIS{axis}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ImageLayout {
            bitpix,
            element_bytes: bitpix.byte_size(),
            axes,
            element_type: bitpix.element_type(),
        })
    }

    /// Total element count: the product of the axes, zero for an empty
    /// (NAXIS = 0) image.
    pub fn element_count(&self) -> u64 {
        if self.axes.is_empty() {
            return 0;
        }
        self.axes.iter().product()
    }

    /// Total meaningful data bytes.
    pub fn byte_size(&self) -> u64 {
        u64::from(self.element_bytes) * self.element_count()
    }

    /// The emitted schema: a single array field named `Image`.
    pub fn fields(&self) -> Vec<super::Field> {
        vec![super::Field {
            name: "Image".to_owned(),
            form: super::FieldForm::ArrayOf(self.element_type),
            nullable: true,
        }]
    }
}
