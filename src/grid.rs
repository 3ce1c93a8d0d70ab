use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// One cell of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// The letter token shown on this tile. May span several characters, e.g. `"qu"`.
    pub letter: String,
    /// Set only while a search path passes through this tile.
    #[serde(default)]
    pub visited: bool,
}

impl Tile {
    pub fn new(letter: impl Into<String>) -> Self {
        Self {
            letter: letter.into(),
            visited: false,
        }
    }
}

/// The position of a tile. `(0, 0)` is the top left corner.
///
/// The canonical string form is `"{row}-{column}"`, which is also how
/// coordinates are serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinates {
    pub row: usize,
    pub column: usize,
}

impl Coordinates {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// `true` when `other` is one of the up-to-8 cells surrounding this one.
    pub fn is_adjacent(self, other: Coordinates) -> bool {
        self != other
            && self.row.abs_diff(other.row) <= 1
            && self.column.abs_diff(other.column) <= 1
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.column)
    }
}

impl FromStr for Coordinates {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || Error::InvalidCoordinates(s.to_owned());
        let (row, column) = s.split_once('-').ok_or_else(err)?;
        let row = row.parse().map_err(|_| err())?;
        let column = column.parse().map_err(|_| err())?;
        Ok(Self { row, column })
    }
}

impl Serialize for Coordinates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A representation of a 2d board of tiles.
///
/// Rows are outermost. Dimensions are fixed once constructed; `clone` produces a
/// fully independent copy, so marking a tile visited in one copy never leaks into
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Tile>>", into = "Vec<Vec<Tile>>")]
pub struct Grid {
    tiles: Vec<Tile>,
    rows: usize,
    columns: usize,
}

impl Grid {
    /// Build a grid from rows of letter tokens. Every row must have the same length.
    pub fn new<Rows, Row, Letter>(rows: Rows) -> Result<Self, Error>
    where
        Rows: IntoIterator<Item = Row>,
        Row: IntoIterator<Item = Letter>,
        Letter: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Tile::new).collect())
            .collect::<Vec<Vec<_>>>();
        Self::try_from(rows)
    }

    /// Build a square grid from a flat, row-major line of letter tokens.
    pub fn square<Letters, Letter>(letters: Letters) -> Result<Self, Error>
    where
        Letters: IntoIterator<Item = Letter>,
        Letter: Into<String>,
    {
        let letters = letters.into_iter().map(Into::into).collect::<Vec<String>>();
        let side = floor_sqrt(letters.len());
        if side * side != letters.len() {
            return Err(Error::NotSquare { len: letters.len() });
        }
        if side == 0 {
            return Err(Error::Empty);
        }
        Self::new(letters.chunks(side).map(<[String]>::to_vec))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Get the internal index where the desired tile is stored,
    /// or `None` if it is out of bounds.
    pub fn idx(&self, coords: Coordinates) -> Option<usize> {
        (coords.row < self.rows && coords.column < self.columns)
            .then_some(coords.row * self.columns + coords.column)
    }

    pub fn get(&self, coords: Coordinates) -> Option<&Tile> {
        self.idx(coords).map(|idx| &self.tiles[idx])
    }

    pub fn get_mut(&mut self, coords: Coordinates) -> Option<&mut Tile> {
        self.idx(coords).map(|idx| &mut self.tiles[idx])
    }

    /// Iterate over every coordinate in row-major order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinates> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| Coordinates::new(row, column)))
    }

    /// Iterate over the letter tokens in row-major order.
    pub fn letters(&self) -> impl Iterator<Item = &str> {
        self.tiles.iter().map(|tile| tile.letter.as_str())
    }

    /// A copy of this grid with every visited marker cleared.
    pub fn unvisited(&self) -> Self {
        let mut grid = self.clone();
        for tile in &mut grid.tiles {
            tile.visited = false;
        }
        grid
    }
}

impl TryFrom<Vec<Vec<Tile>>> for Grid {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Tile>>) -> Result<Self, Self::Error> {
        let columns = rows.first().map(Vec::len).unwrap_or_default();
        if columns == 0 {
            return Err(Error::Empty);
        }

        let mut tiles = Vec::with_capacity(rows.len() * columns);
        for (row, row_tiles) in rows.iter().enumerate() {
            if row_tiles.len() != columns {
                return Err(Error::Ragged {
                    row,
                    expected: columns,
                    found: row_tiles.len(),
                });
            }
            if let Some(column) = row_tiles.iter().position(|tile| tile.letter.is_empty()) {
                return Err(Error::EmptyLetter { row, column });
            }
        }
        let rows_count = rows.len();
        tiles.extend(rows.into_iter().flatten());

        Ok(Self {
            tiles,
            rows: rows_count,
            columns,
        })
    }
}

impl From<Grid> for Vec<Vec<Tile>> {
    fn from(grid: Grid) -> Self {
        grid.tiles.chunks(grid.columns).map(<[Tile]>::to_vec).collect()
    }
}

impl Index<Coordinates> for Grid {
    type Output = Tile;

    fn index(&self, coords: Coordinates) -> &Self::Output {
        self.get(coords).unwrap()
    }
}

impl IndexMut<Coordinates> for Grid {
    fn index_mut(&mut self, coords: Coordinates) -> &mut Self::Output {
        self.get_mut(coords).unwrap()
    }
}

#[cfg(test)]
impl Grid {
    /// A grid claiming more tiles than it holds. Reading past the first tile panics.
    pub(crate) fn truncated(rows: usize, columns: usize) -> Self {
        Grid {
            tiles: vec![Tile::new("a")],
            rows,
            columns,
        }
    }
}

/// The largest `n` such that `n * n <= value`.
pub(crate) fn floor_sqrt(value: usize) -> usize {
    let fits = |root: usize| root.checked_mul(root).is_some_and(|square| square <= value);

    let mut root = (value as f64).sqrt() as usize;
    // float rounding can land one off in either direction
    while !fits(root) {
        root -= 1;
    }
    while fits(root + 1) {
        root += 1;
    }
    root
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("a board needs at least one tile")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("{len} tiles cannot form a square board")]
    NotSquare { len: usize },
    #[error("the tile at `{row}-{column}` has no letter")]
    EmptyLetter { row: usize, column: usize },
    #[error("\"{0}\" is not of the form `row-column`")]
    InvalidCoordinates(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0-0", Coordinates::new(0, 0))]
    #[case("3-12", Coordinates::new(3, 12))]
    fn parse_coordinates(#[case] input: &str, #[case] expected: Coordinates) {
        let coords = input.parse::<Coordinates>().unwrap();
        assert_eq!(coords, expected);
        assert_eq!(coords.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("3")]
    #[case("a-1")]
    #[case("1-")]
    #[case("-1-2")]
    fn reject_bad_coordinates(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Coordinates>(),
            Err(Error::InvalidCoordinates(s)) if s == input
        ));
    }

    #[test]
    fn square_board_is_row_major() {
        let grid = Grid::square(["a", "b", "c", "d"]).unwrap();
        assert_eq!((grid.rows(), grid.columns()), (2, 2));
        assert_eq!(grid[Coordinates::new(0, 1)].letter, "b");
        assert_eq!(grid[Coordinates::new(1, 0)].letter, "c");
        assert_eq!(grid.letters().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
    }

    #[rstest]
    #[case(3)]
    #[case(5)]
    #[case(15)]
    fn non_square_line_is_rejected(#[case] len: usize) {
        let letters = vec!["a"; len];
        assert!(matches!(Grid::square(letters), Err(Error::NotSquare { len: l }) if l == len));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Grid::new(vec![vec!["a", "b"], vec!["c"]]).unwrap_err();
        assert!(matches!(
            err,
            Error::Ragged {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn empty_boards_and_letters_are_rejected() {
        assert!(matches!(Grid::square(Vec::<String>::new()), Err(Error::Empty)));
        assert!(matches!(
            Grid::new(vec![vec!["a", ""]]),
            Err(Error::EmptyLetter { row: 0, column: 1 })
        ));
    }

    #[test]
    fn rectangular_boards_are_allowed() {
        let grid = Grid::new(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]).unwrap();
        assert_eq!((grid.rows(), grid.columns()), (2, 3));
        assert_eq!(grid.get(Coordinates::new(2, 0)), None);
        assert_eq!(grid.get(Coordinates::new(0, 3)), None);
        assert_eq!(grid.coordinates().last(), Some(Coordinates::new(1, 2)));
    }

    #[test]
    fn clones_are_independent() {
        let grid = Grid::square(["a", "b", "c", "d"]).unwrap();
        let mut copy = grid.clone();
        copy[Coordinates::new(1, 1)].visited = true;
        assert!(!grid[Coordinates::new(1, 1)].visited);
        assert!(!copy.unvisited()[Coordinates::new(1, 1)].visited);
    }

    #[test]
    fn serializes_as_nested_tiles() {
        let grid = Grid::square(["a", "qu", "c", "d"]).unwrap();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                [{"letter": "a", "visited": false}, {"letter": "qu", "visited": false}],
                [{"letter": "c", "visited": false}, {"letter": "d", "visited": false}],
            ])
        );

        let wire = r#"[[{"letter":"a"},{"letter":"qu"}],[{"letter":"c"},{"letter":"d"}]]"#;
        let parsed: Grid = serde_json::from_str(wire).unwrap();
        assert_eq!(parsed, grid);

        assert!(serde_json::from_str::<Grid>(r#"[[{"letter":"a"}],[]]"#).is_err());
    }

    #[test]
    fn coordinates_serialize_as_strings() {
        let json = serde_json::to_string(&Coordinates::new(2, 5)).unwrap();
        assert_eq!(json, "\"2-5\"");
        assert_eq!(serde_json::from_str::<Coordinates>(&json).unwrap(), Coordinates::new(2, 5));
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(15, 3)]
    #[case(16, 4)]
    #[case(17, 4)]
    #[case(36, 6)]
    #[case(usize::MAX, (1 << (usize::BITS / 2)) - 1)]
    fn floor_sqrt_rounds_down(#[case] value: usize, #[case] expected: usize) {
        assert_eq!(floor_sqrt(value), expected);
    }
}
