//! A word-search puzzle engine: find every dictionary word traceable on a board
//! of letter tiles, list the paths spelling each one, and pack boards into short
//! URL-safe tokens.

mod alphabet;
pub mod codec;
pub mod dispatch;
pub mod grid;
mod hints;
mod neighbors;
mod search;

pub use alphabet::Alphabet;
pub use dispatch::{Answer, Dispatcher, Pending, Query};
pub use grid::{Coordinates, Grid, Tile};
pub use hints::{find_hints, letter_hints, letter_hints_excluding, HintPath, Hints};
pub use neighbors::neighbors;
pub use search::find_words;
