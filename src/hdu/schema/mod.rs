//! Schema derivation: from a parsed header to typed column or element
//! descriptions.

pub mod bintable;
pub mod image;

use serde::Serialize;

use crate::error::Error;
use crate::hdu::header::Header;

pub use bintable::{BinaryTableLayout, ColumnSpec, TForm};
pub use image::{Bitpix, ImageLayout};

/// The typed layout of one HDU, derived once from its header and
/// immutable thereafter. Freely shareable across threads; only the
/// source handle is exclusive.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum Schema {
    Image(ImageLayout),
    BinaryTable(BinaryTableLayout),
}

impl Schema {
    /// Dispatch on the XTENSION card: absent (the primary) or `IMAGE`
    /// builds an image layout, `BINTABLE` a table layout. Any other
    /// flavor is the terminal [`Error::UnknownHduType`] here, unlike in
    /// the catalog walk where it only degrades to a warning.
    pub fn build(header: &Header) -> Result<Self, Error> {
        match header.xtension() {
            None | Some("IMAGE") | Some("IUEIMAGE") => {
                ImageLayout::from_header(header).map(Schema::Image)
            }
            Some("BINTABLE") => BinaryTableLayout::from_header(header).map(Schema::BinaryTable),
            Some(other) => Err(Error::UnknownHduType(other.to_owned())),
        }
    }

    /// The language-neutral field list the outer layer adapts.
    pub fn fields(&self) -> Vec<Field> {
        match self {
            Schema::Image(layout) => layout.fields(),
            Schema::BinaryTable(layout) => layout.fields(),
        }
    }
}

/// One entry of the emitted schema.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Field {
    pub name: String,
    pub form: FieldForm,
    /// Always true: any logical cell may hold the 0x00 null byte.
    pub nullable: bool,
}

/// Shape of an emitted field: table columns are scalars, an image is one
/// array field of its element form.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum FieldForm {
    Scalar(TForm),
    ArrayOf(TForm),
}
