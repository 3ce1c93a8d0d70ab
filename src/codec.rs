//! Compact, URL-safe board tokens.
//!
//! Each tile is replaced by its index in the canonically sorted alphabet. The
//! indexes are packed into one bitstream at the minimum width the alphabet needs,
//! most significant bit first, and the stream is cut back into 6-bit symbols drawn
//! from [`SYMBOLS`]. Decoding reverses this and keeps the largest perfect square
//! number of tiles, since boards are square.

use crate::{
    alphabet::Alphabet,
    grid::{self, floor_sqrt, Grid},
};

/// The 64 token symbols, indexed by 6-bit value.
pub const SYMBOLS: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-_";

const SYMBOL_BITS: u32 = 6;

fn symbol_value(symbol: char) -> Option<u32> {
    let value = match symbol {
        '0'..='9' => symbol as u32 - '0' as u32,
        'a'..='z' => symbol as u32 - 'a' as u32 + 10,
        'A'..='Z' => symbol as u32 - 'A' as u32 + 36,
        '-' => 62,
        '_' => 63,
        _ => return None,
    };
    Some(value)
}

fn mask(bits: u32) -> u64 {
    if bits == 0 {
        0
    } else {
        (1 << bits) - 1
    }
}

/// Reinterpret a stream of `from_bits`-wide values as `to_bits`-wide values.
///
/// Values are read most significant bit first. Only the low `from_bits` bits of
/// each input value are used. A final partial group is completed with zero bits
/// on its low end.
///
/// # Panics
///
/// Panics unless `from_bits <= 32` and `1 <= to_bits <= 32`.
pub fn repack_bits(values: &[u32], from_bits: u32, to_bits: u32) -> Vec<u32> {
    assert!(from_bits <= 32, "cannot read {from_bits}-bit values");
    assert!((1..=32).contains(&to_bits), "cannot write {to_bits}-bit values");

    let total_bits = values.len() * from_bits as usize;
    let mut repacked = Vec::with_capacity(total_bits.div_ceil(to_bits as usize));

    // holds fewer than `to_bits` pending bits between input values
    let mut pending = 0_u64;
    let mut pending_bits = 0;

    for &value in values {
        pending = (pending << from_bits) | (u64::from(value) & mask(from_bits));
        pending_bits += from_bits;

        while pending_bits >= to_bits {
            pending_bits -= to_bits;
            repacked.push(((pending >> pending_bits) & mask(to_bits)) as u32);
        }
        pending &= mask(pending_bits);
    }

    if pending_bits > 0 {
        repacked.push(((pending << (to_bits - pending_bits)) & mask(to_bits)) as u32);
    }

    repacked
}

fn check_alphabet(alphabet: &Alphabet) -> Result<(), Error> {
    if alphabet.len() < 2 {
        return Err(Error::AlphabetTooSmall {
            size: alphabet.len(),
        });
    }
    Ok(())
}

/// Encode a row-major sequence of tiles into a token.
///
/// Any length is accepted, but only square-length sequences survive a round trip
/// through [`decode`].
pub fn encode<Tiles, Letter>(tiles: Tiles, alphabet: &Alphabet) -> Result<String, Error>
where
    Tiles: IntoIterator<Item = Letter>,
    Letter: AsRef<str>,
{
    check_alphabet(alphabet)?;

    let indexes = tiles
        .into_iter()
        .map(|letter| {
            let letter = letter.as_ref();
            alphabet
                .index_of(letter)
                .map(|idx| idx as u32)
                .ok_or_else(|| Error::UnknownLetter(letter.to_owned()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let token = repack_bits(&indexes, alphabet.min_bits(), SYMBOL_BITS)
        .into_iter()
        .map(|value| char::from(SYMBOLS[value as usize]))
        .collect();
    Ok(token)
}

/// Decode a token back into its row-major sequence of tiles.
///
/// The result is trimmed to the largest perfect square number of tiles; anything
/// past that is padding.
pub fn decode(token: &str, alphabet: &Alphabet) -> Result<Vec<String>, Error> {
    check_alphabet(alphabet)?;

    let values = token
        .chars()
        .map(|symbol| symbol_value(symbol).ok_or(Error::UnknownSymbol(symbol)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut indexes = repack_bits(&values, SYMBOL_BITS, alphabet.min_bits());
    let side = floor_sqrt(indexes.len());
    indexes.truncate(side * side);

    indexes
        .into_iter()
        .map(|index| {
            alphabet
                .letter(index as usize)
                .map(str::to_owned)
                .ok_or(Error::IndexOutOfRange {
                    index,
                    size: alphabet.len(),
                })
        })
        .collect()
}

/// Encode every tile of `grid`, row by row.
pub fn encode_grid(grid: &Grid, alphabet: &Alphabet) -> Result<String, Error> {
    encode(grid.letters(), alphabet)
}

/// Decode a token into a square board.
pub fn decode_grid(token: &str, alphabet: &Alphabet) -> Result<Grid, Error> {
    let letters = decode(token, alphabet)?;
    Ok(Grid::square(letters)?)
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("an alphabet needs at least 2 letters to encode boards, this one has {size}")]
    AlphabetTooSmall { size: usize },
    #[error("\"{0}\" is not a letter of the alphabet")]
    UnknownLetter(String),
    #[error("'{0}' is not a valid token symbol")]
    UnknownSymbol(char),
    #[error("decoded letter index {index} is past the end of a {size}-letter alphabet")]
    IndexOutOfRange { index: u32, size: usize },
    #[error(transparent)]
    Grid(#[from] grid::Error),
}
