use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{
    grid::{Coordinates, Grid},
    neighbors::neighbors,
    search::longer_with_prefix,
};

/// The tiles of one trace of a word, from its first letter to its last.
pub type HintPath = Vec<Coordinates>;

/// Every trace of every word, keyed by word.
pub type Hints = BTreeMap<String, Vec<HintPath>>;

/// Find every path spelling each of `words_on_board`.
///
/// This walks the board the same way [`find_words`][crate::find_words] does, so
/// it should only be given words already known to be on the board; absent words
/// just cost search time. A word traceable several ways gets one path per trace.
pub fn find_hints<Word>(grid: &Grid, words_on_board: &[Word]) -> Hints
where
    Word: AsRef<str>,
{
    let words = words_on_board
        .iter()
        .map(AsRef::as_ref)
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect::<Vec<_>>();

    let mut search = HintSearch {
        grid: grid.unvisited(),
        chain: String::new(),
        path: Vec::new(),
        hints: Hints::new(),
    };

    for start in grid.coordinates() {
        let letter = grid[start].letter.as_str();
        search.chain.push_str(letter);
        search.path.push(start);

        if words.contains(&letter) {
            search.record();
        }

        let candidates = longer_with_prefix(&words, letter);
        if !candidates.is_empty() {
            search.visit_neighbors(start, &candidates);
        }

        search.chain.clear();
        search.path.clear();
    }

    debug!(
        "found {} paths for {} words",
        search.hints.values().map(Vec::len).sum::<usize>(),
        search.hints.len()
    );
    search.hints
}

struct HintSearch {
    // visited markers always match the tiles of `path`
    grid: Grid,
    chain: String,
    path: HintPath,
    hints: Hints,
}

impl HintSearch {
    fn record(&mut self) {
        self.hints
            .entry(self.chain.clone())
            .or_default()
            .push(self.path.clone());
    }

    fn visit_neighbors(&mut self, coords: Coordinates, candidates: &[&str]) {
        self.grid[coords].visited = true;

        let next_steps = neighbors(&self.grid, coords, true)
            .map(|(_, next)| next)
            .collect::<Vec<_>>();

        for next in next_steps {
            let chain_len = self.chain.len();
            self.chain.push_str(&self.grid[next].letter);
            self.path.push(next);

            if candidates.iter().any(|&word| word == self.chain) {
                self.record();
            }

            let narrowed = longer_with_prefix(candidates, &self.chain);
            if !narrowed.is_empty() {
                self.visit_neighbors(next, &narrowed);
            }

            self.path.pop();
            self.chain.truncate(chain_len);
        }

        self.grid[coords].visited = false;
    }
}

/// Count, for every tile, how many hinted words pass through it.
///
/// Every coordinate of `grid` is present; tiles no word touches count 0. A word
/// counts once per tile even if several of its paths share that tile.
pub fn letter_hints(grid: &Grid, hints: &Hints) -> BTreeMap<Coordinates, usize> {
    letter_hints_excluding::<&str>(grid, hints, &[])
}

/// Like [`letter_hints`], skipping the words in `found_words`.
pub fn letter_hints_excluding<Word>(
    grid: &Grid,
    hints: &Hints,
    found_words: &[Word],
) -> BTreeMap<Coordinates, usize>
where
    Word: AsRef<str>,
{
    let mut counts = grid
        .coordinates()
        .map(|coords| (coords, 0))
        .collect::<BTreeMap<_, _>>();

    let found_words = found_words.iter().map(AsRef::as_ref).collect::<BTreeSet<&str>>();

    for (word, paths) in hints {
        if found_words.contains(word.as_str()) {
            continue;
        }

        let tiles = paths.iter().flatten().copied().collect::<BTreeSet<_>>();
        for coords in tiles {
            *counts.entry(coords).or_default() += 1;
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(row: usize, column: usize) -> Coordinates {
        Coordinates::new(row, column)
    }

    fn checkerboard() -> Grid {
        Grid::square(["a", "b", "b", "a"]).unwrap()
    }

    #[test]
    fn every_trace_is_kept() {
        let hints = find_hints(&checkerboard(), &["ab"]);
        assert_eq!(
            hints["ab"],
            [
                vec![c(0, 0), c(0, 1)],
                vec![c(0, 0), c(1, 0)],
                vec![c(1, 1), c(0, 1)],
                vec![c(1, 1), c(1, 0)],
            ]
        );
    }

    #[test]
    fn longer_words_share_prefix_search() {
        let hints = find_hints(&checkerboard(), &["ab", "aba", "abab"]);
        assert_eq!(hints["ab"].len(), 4);
        assert_eq!(
            hints["aba"],
            [
                vec![c(0, 0), c(0, 1), c(1, 1)],
                vec![c(0, 0), c(1, 0), c(1, 1)],
                vec![c(1, 1), c(0, 1), c(0, 0)],
                vec![c(1, 1), c(1, 0), c(0, 0)],
            ]
        );
        assert_eq!(hints["abab"].len(), 4);
    }

    #[test]
    fn single_letter_words() {
        let hints = find_hints(&checkerboard(), &["a"]);
        assert_eq!(hints["a"], [vec![c(0, 0)], vec![c(1, 1)]]);
    }

    #[test]
    fn absent_words_have_no_entry() {
        let hints = find_hints(&checkerboard(), &["ab", "abc", "c"]);
        assert_eq!(hints.keys().collect::<Vec<_>>(), ["ab"]);
    }

    #[test]
    fn repeated_input_words_do_not_repeat_paths() {
        let hints = find_hints(&checkerboard(), &["ab", "ab"]);
        assert_eq!(hints["ab"].len(), 4);
    }

    #[test]
    fn counts_words_through_each_tile() {
        let grid = Grid::square(["c", "a", "t", "x", "o", "g", "d", "z", "s"]).unwrap();
        let hints = find_hints(&grid, &["cat", "cog", "dog"]);
        let counts = letter_hints(&grid, &hints);

        assert_eq!(counts.len(), 9);
        assert_eq!(counts[&c(0, 0)], 2);
        assert_eq!(counts[&c(0, 1)], 1);
        assert_eq!(counts[&c(1, 1)], 2);
        assert_eq!(counts[&c(1, 2)], 2);
        assert_eq!(counts[&c(2, 0)], 1);
        assert_eq!(counts[&c(1, 0)], 0);
        assert_eq!(counts[&c(2, 2)], 0);

        let counts = letter_hints_excluding(&grid, &hints, &["cog"]);
        assert_eq!(counts[&c(0, 0)], 1);
        assert_eq!(counts[&c(1, 1)], 1);
        assert_eq!(counts[&c(1, 2)], 1);
    }

    #[test]
    fn word_with_many_paths_counts_once_per_tile() {
        let grid = checkerboard();
        let hints = find_hints(&grid, &["ab"]);
        let counts = letter_hints(&grid, &hints);
        assert!(counts.values().all(|&count| count == 1));
    }
}
