//! Typed values and the big-endian cell codec shared by both HDU
//! flavors. FITS stores all binary numeric data in network byte order.

pub mod bintable;
pub mod image;

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use crate::error::Error;
use crate::hdu::schema::TForm;

pub use bintable::BinaryTableHdu;
pub use image::ImageHdu;

/// One decoded table cell or image element. Values are returned
/// unscaled: BSCALE/BZERO are left to the caller.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum TypedValue {
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    String(String),
    /// A logical cell holding the 0x00 null byte.
    Null,
}

/// Decode the leading `form.byte_size()` bytes of `buf`, big-endian.
///
/// NaN bit patterns pass through untouched. Logical bytes follow the
/// `T` / `F` / `0x00` rule; anything else is [`Error::MalformedBool`].
/// Fixed strings are UTF-8, right-trimmed of ASCII spaces and NULs only,
/// so identifiers carrying tabs survive.
pub fn decode_value(form: &TForm, buf: &[u8]) -> Result<TypedValue, Error> {
    let size = form.byte_size() as usize;
    if buf.len() < size {
        return Err(Error::UnexpectedEof(size as u64, buf.len() as u64));
    }

    Ok(match form {
        TForm::Int16 => TypedValue::Int16(BigEndian::read_i16(buf)),
        TForm::Int32 => TypedValue::Int32(BigEndian::read_i32(buf)),
        TForm::Int64 => TypedValue::Int64(BigEndian::read_i64(buf)),
        TForm::Float32 => TypedValue::Float32(BigEndian::read_f32(buf)),
        TForm::Float64 => TypedValue::Float64(BigEndian::read_f64(buf)),
        TForm::Bool => match buf[0] {
            b'T' => TypedValue::Bool(true),
            b'F' => TypedValue::Bool(false),
            0x00 => TypedValue::Null,
            byte => return Err(Error::MalformedBool(byte)),
        },
        TForm::FixedString(_) => {
            let bytes = &buf[..size];
            let end = bytes
                .iter()
                .rposition(|&byte| byte != b' ' && byte != 0x00)
                .map_or(0, |pos| pos + 1);
            TypedValue::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
    })
}
