/// The letter tokens valid for one language or script, in canonical order.
///
/// Tokens are kept sorted (by `str` ordering, i.e. code point order) and
/// deduplicated, so alphabets built from the same tokens in any order are equal
/// and assign every letter the same index. The board codec depends on this.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alphabet(
    // We maintain the invariant that this vector is sorted and has no duplicates
    Vec<String>,
);

impl Alphabet {
    pub fn new<Tokens, Token>(tokens: Tokens) -> Self
    where
        Tokens: IntoIterator<Item = Token>,
        Token: Into<String>,
    {
        let mut alphabet = Self::default();
        alphabet.extend(tokens.into_iter().map(Into::into).collect());
        alphabet
    }

    /// The reference English alphabet: `a` through `z`, with `qu` in place of `q`.
    pub fn english() -> Self {
        Self::new(('a'..='z').map(|letter| {
            if letter == 'q' {
                "qu".to_owned()
            } else {
                letter.to_string()
            }
        }))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the tokens in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Get the canonical index of `letter`, if it belongs to this alphabet.
    pub fn index_of(&self, letter: &str) -> Option<usize> {
        self.0.binary_search_by(|token| token.as_str().cmp(letter)).ok()
    }

    /// Get the letter at canonical index `idx`.
    pub fn letter(&self, idx: usize) -> Option<&str> {
        self.0.get(idx).map(String::as_str)
    }

    /// The minimum number of bits able to hold any index into this alphabet.
    pub fn min_bits(&self) -> u32 {
        let mut count = 1_usize;
        let mut bits = 0;
        while count < self.len() {
            count <<= 1;
            bits += 1;
        }
        bits
    }

    /// Insert all provided tokens into this alphabet.
    ///
    /// Note that provided tokens must be pre-collected into a vector. This avoids
    /// hiding the collection costs which would otherwise happen under the hood.
    pub fn extend(&mut self, mut tokens: Vec<String>) {
        let mut merged = Vec::with_capacity(self.0.len() + tokens.len());

        let mut left = std::mem::take(&mut self.0).into_iter().peekable();

        tokens.sort_unstable();
        let mut right = tokens.into_iter().peekable();

        // merge sort
        loop {
            let next = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) if l <= r => left.next(),
                (Some(_), Some(_)) => right.next(),
                (Some(_), None) => left.next(),
                (None, Some(_)) => right.next(),
                (None, None) => break,
            };
            let Some(next) = next else { break };

            // incoming tokens may repeat each other or existing ones
            if merged.last() != Some(&next) {
                merged.push(next);
            }
        }

        self.0 = merged;
    }
}

impl<Token> FromIterator<Token> for Alphabet
where
    Token: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        Self::new(iter)
    }
}
