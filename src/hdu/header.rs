//! Header parsing: 2880-byte blocks of thirty-six 80-byte cards.
//!
//! Cards are consumed until the first `END` card (inclusive). Blocks keep
//! being read while `END` has not been seen; trailing blank cards of the
//! closing block are dropped. A short read anywhere fails with
//! [`Error::UnexpectedEof`] carrying how many bytes of the header were
//! actually available.

use indexmap::IndexMap;
use serde::Serialize;

use crate::card::{malformed, Card, CardValue, Value, CARD_SIZE};
use crate::error::Error;
use crate::source::SeekableByteSource;

/// Number of bytes of a FITS block. Headers and data areas are both
/// padded to a multiple of it.
pub const BLOCK_SIZE: usize = 2880;
/// Number of cards per header block.
pub const CARDS_PER_BLOCK: usize = BLOCK_SIZE / CARD_SIZE;

/// An ordered sequence of cards terminated by the `END` sentinel.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Header {
    /// Non-blank cards in file order, `END` included.
    cards: Vec<Card>,
    /// Keyword to card position. When a keyword repeats, the last card
    /// wins, as astronomy tooling conventionally resolves duplicates.
    index: IndexMap<String, usize>,
    /// Bytes the header occupies on disk, padding included. Always a
    /// multiple of [`BLOCK_SIZE`].
    byte_size: u64,
}

impl Header {
    /// Read and parse one header starting at `offset`.
    pub fn parse_at<R>(reader: &mut R, offset: u64) -> Result<Self, Error>
    where
        R: SeekableByteSource,
    {
        reader.seek(offset)?;

        let mut cards = Vec::new();
        let mut index = IndexMap::new();
        let mut byte_size = 0_u64;
        let mut block = [0_u8; BLOCK_SIZE];

        'blocks: loop {
            match reader.read_exact(&mut block) {
                Ok(()) => (),
                // Re-anchor the byte counts on the whole header so the
                // caller can tell a clean EOF (got = 0) from a torn one.
                Err(Error::UnexpectedEof(_, got)) => {
                    return Err(Error::UnexpectedEof(
                        byte_size + BLOCK_SIZE as u64,
                        byte_size + got,
                    ));
                }
                Err(err) => return Err(err),
            }
            byte_size += BLOCK_SIZE as u64;

            for raw in block.chunks_exact(CARD_SIZE) {
                if raw.iter().all(|&byte| byte == b' ') {
                    continue;
                }
                let card = Card::parse(raw);
                if card.value.is_some() {
                    index.insert(card.keyword.clone(), cards.len());
                }
                let end = card.is_end();
                cards.push(card);
                if end {
                    break 'blocks;
                }
            }
        }

        Ok(Header {
            cards,
            index,
            byte_size,
        })
    }

    /// All retained cards in file order.
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// The last value card carrying `keyword`, if any.
    pub fn card(&self, keyword: &str) -> Option<&Card> {
        self.index.get(keyword).map(|&pos| &self.cards[pos])
    }

    /// The value of a card, `None` when the card is absent or valueless.
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.card(keyword).and_then(|card| card.value.as_ref())
    }

    /// Typed card access. `None` when the card is absent; `Some(Err)`
    /// when it is present but its value does not have the asked type
    /// (e.g. an integer requested from a float card).
    pub fn get_parsed<T>(&self, keyword: &str) -> Option<Result<T, Error>>
    where
        T: CardValue,
    {
        self.card(keyword).map(|card| {
            card.value
                .as_ref()
                .and_then(<T as CardValue>::parse)
                .ok_or_else(|| malformed(card))
        })
    }

    /// The trimmed XTENSION string, absent on the primary HDU.
    pub fn xtension(&self) -> Option<&str> {
        match self.get("XTENSION") {
            Some(Value::CharacterString(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// On-disk size of the header in bytes, padding included.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

/// Read a mandatory integer card, e.g. `NAXIS2` on a table.
pub(crate) fn require_int(header: &Header, keyword: &str) -> Result<i64, Error> {
    header
        .get_parsed::<i64>(keyword)
        .ok_or_else(|| Error::MissingRequiredCard(keyword.to_owned()))?
}

/// Read a mandatory string card, e.g. `TFORM3` on a table.
pub(crate) fn require_string(header: &Header, keyword: &str) -> Result<String, Error> {
    header
        .get_parsed::<String>(keyword)
        .ok_or_else(|| Error::MissingRequiredCard(keyword.to_owned()))?
}

/// A mandatory non-negative integer, converted for offset arithmetic.
pub(crate) fn require_uint(header: &Header, keyword: &str) -> Result<u64, Error> {
    let card = header
        .card(keyword)
        .ok_or_else(|| Error::MissingRequiredCard(keyword.to_owned()))?;
    card.value
        .as_ref()
        .and_then(<i64 as CardValue>::parse)
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| malformed(card))
}
