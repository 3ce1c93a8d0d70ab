use std::collections::{BTreeSet, HashSet};

use log::{debug, trace};

use crate::{
    grid::{Coordinates, Grid},
    neighbors::neighbors,
};

/// Find every dictionary word that can be traced on `grid`.
///
/// A word is traced by starting on any tile and repeatedly stepping to an
/// adjacent tile (diagonals included) that the path has not used yet,
/// concatenating letter tokens along the way. Words shorter than
/// `min_word_length` characters are ignored.
///
/// `grid` itself is never modified; the search marks tiles on a private copy.
pub fn find_words<Word>(
    grid: &Grid,
    dictionary: &[Word],
    min_word_length: usize,
) -> BTreeSet<String>
where
    Word: AsRef<str>,
{
    let mut remaining = dictionary
        .iter()
        .map(AsRef::as_ref)
        .filter(|word| word.chars().count() >= min_word_length)
        .collect::<Vec<&str>>();

    let mut search = WordSearch {
        grid: grid.unvisited(),
        chain: String::new(),
        found: HashSet::new(),
    };
    let mut found_words = BTreeSet::new();

    for start in grid.coordinates() {
        if remaining.is_empty() {
            trace!("every word found before reaching {start}");
            break;
        }

        let letter = grid[start].letter.as_str();
        if remaining.contains(&letter) {
            search.found.insert(letter);
        }

        let candidates = longer_with_prefix(&remaining, letter);
        if !candidates.is_empty() {
            search.chain.push_str(letter);
            search.visit_neighbors(start, &candidates);
            search.chain.clear();
        }

        if !search.found.is_empty() {
            trace!("{} new words starting from {start}", search.found.len());
            remaining.retain(|word| !search.found.contains(word));
            found_words.extend(search.found.drain().map(str::to_owned));
        }
    }

    debug!(
        "found {} of {} dictionary words on a {}x{} board",
        found_words.len(),
        dictionary.len(),
        grid.rows(),
        grid.columns()
    );
    found_words
}

/// The candidates which strictly extend `chain`.
pub(crate) fn longer_with_prefix<'d>(candidates: &[&'d str], chain: &str) -> Vec<&'d str> {
    candidates
        .iter()
        .copied()
        .filter(|word| word.len() > chain.len() && word.starts_with(chain))
        .collect()
}

struct WordSearch<'d> {
    // visited markers always match the tiles of the current chain
    grid: Grid,
    chain: String,
    found: HashSet<&'d str>,
}

impl<'d> WordSearch<'d> {
    /// Extend the chain ending at `coords` into each unvisited neighbor, recording
    /// every candidate the longer chain spells and descending while any
    /// candidate still extends it.
    fn visit_neighbors(&mut self, coords: Coordinates, candidates: &[&'d str]) {
        self.grid[coords].visited = true;

        let next_steps = neighbors(&self.grid, coords, true)
            .map(|(_, next)| next)
            .collect::<Vec<_>>();

        for next in next_steps {
            let chain_len = self.chain.len();
            self.chain.push_str(&self.grid[next].letter);

            if let Some(&word) = candidates.iter().find(|&&word| word == self.chain) {
                self.found.insert(word);
            }

            let narrowed = longer_with_prefix(candidates, &self.chain);
            if !narrowed.is_empty() {
                self.visit_neighbors(next, &narrowed);
            }

            self.chain.truncate(chain_len);
        }

        self.grid[coords].visited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn board() -> Grid {
        Grid::new(vec![
            vec!["c", "a", "t"],
            vec!["x", "o", "g"],
            vec!["d", "z", "s"],
        ])
        .unwrap()
    }

    fn words(found: &BTreeSet<String>) -> Vec<&str> {
        found.iter().map(String::as_str).collect()
    }

    #[test]
    fn finds_connected_words_only() {
        let dictionary = [
            "cat", "cats", "dog", "dogs", "cog", "tag", "tat", "act", "zoo", "gas", "cox", "taco",
        ];
        let found = find_words(&board(), &dictionary, 3);
        assert_eq!(words(&found), ["cat", "cog", "cox", "dog", "dogs", "taco", "tag"]);
    }

    #[rstest]
    #[case(1, &["a", "at", "cat", "o"])]
    #[case(2, &["at", "cat"])]
    #[case(3, &["cat"])]
    #[case(4, &[])]
    fn minimum_word_length(#[case] min_word_length: usize, #[case] expected: &[&str]) {
        let dictionary = ["a", "o", "q", "at", "cat"];
        let found = find_words(&board(), &dictionary, min_word_length);
        assert_eq!(words(&found), expected);
    }

    #[test]
    fn empty_dictionary() {
        assert!(find_words::<&str>(&board(), &[], 1).is_empty());
    }

    #[test]
    fn duplicates_are_reported_once() {
        let found = find_words(&board(), &["cat", "cat", "tag", "cat"], 3);
        assert_eq!(words(&found), ["cat", "tag"]);
    }

    #[test]
    fn multi_letter_tokens() {
        let grid = Grid::square(["qu", "i", "t", "e", "a", "x", "s", "o", "n"]).unwrap();
        let found = find_words(&grid, &["quit", "quiet", "quite", "qit", "tax", "son", "quits"], 3);
        assert_eq!(words(&found), ["quit", "son", "tax"]);
    }

    #[test]
    fn paths_never_reuse_a_tile() {
        let grid = Grid::square(["a", "b", "c", "d"]).unwrap();
        let found = find_words(&grid, &["aba", "abcd", "abdca", "dcba"], 1);
        assert_eq!(words(&found), ["abcd", "dcba"]);
    }

    #[test]
    fn words_found_from_any_start() {
        // "ab" can only start on the bottom right tile
        let grid = Grid::square(["x", "x", "x", "x", "x", "x", "x", "b", "a"]).unwrap();
        let found = find_words(&grid, &["ab", "xa"], 2);
        assert_eq!(words(&found), ["ab", "xa"]);
    }

    #[test]
    fn callers_grid_is_untouched() {
        let grid = board();
        let before = grid.clone();
        find_words(&grid, &["cat", "dog"], 3);
        assert_eq!(grid, before);
    }

    #[test]
    fn stale_visited_markers_are_ignored() {
        let mut grid = board();
        grid[Coordinates::new(0, 1)].visited = true;
        let found = find_words(&grid, &["cat"], 3);
        assert_eq!(words(&found), ["cat"]);
    }
}
