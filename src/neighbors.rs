use crate::grid::{Coordinates, Grid, Tile};

// row-major around the center, which is skipped
const OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Iterate over the up-to-8 tiles surrounding `coords`, orthogonally and diagonally.
///
/// Cells beyond the edge of the grid are skipped. When `only_unvisited` is set,
/// tiles currently marked visited are skipped as well.
pub fn neighbors(
    grid: &Grid,
    coords: Coordinates,
    only_unvisited: bool,
) -> impl Iterator<Item = (&Tile, Coordinates)> {
    OFFSETS.iter().filter_map(move |&(row_offset, column_offset)| {
        let neighbor = Coordinates::new(
            coords.row.checked_add_signed(row_offset)?,
            coords.column.checked_add_signed(column_offset)?,
        );
        let tile = grid.get(neighbor)?;
        (!only_unvisited || !tile.visited).then_some((tile, neighbor))
    })
}
