//! Letter ⇄ fold-set mapping and device token parsing.
//!
//! The glove reports raw fold digits, one token per line: `"145"` means fingers
//! 1, 4 and 5 are curled. `"0"` is the release frame sent when the hand opens.

use indexmap::IndexMap;
use waive_domain::{FoldSet, TeachError};

/// Reference six-finger alphabet, fingers numbered left ring (1) to right ring (6).
const REFERENCE_ALPHABET: [(char, &[u8]); 26] = [
    ('a', &[1]),
    ('b', &[1, 2]),
    ('c', &[1, 4]),
    ('d', &[1, 4, 5]),
    ('e', &[1, 5]),
    ('f', &[1, 2, 4]),
    ('g', &[1, 2, 4, 5]),
    ('h', &[1, 2, 5]),
    ('i', &[2, 4]),
    ('j', &[2, 4, 5]),
    ('k', &[1, 3]),
    ('l', &[1, 2, 3]),
    ('m', &[1, 3, 4]),
    ('n', &[1, 3, 4, 5]),
    ('o', &[1, 3, 5]),
    ('p', &[1, 2, 3, 4]),
    ('q', &[1, 2, 3, 4, 5]),
    ('r', &[1, 2, 3, 5]),
    ('s', &[2, 3, 4]),
    ('t', &[2, 3, 4, 5]),
    ('u', &[1, 3, 6]),
    ('v', &[1, 2, 3, 6]),
    ('w', &[2, 4, 5, 6]),
    ('x', &[1, 3, 4, 6]),
    ('y', &[1, 3, 4, 5, 6]),
    ('z', &[1, 3, 5, 6]),
];

/// One decoded device frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// All fingers open.
    Release,
    Folds(FoldSet),
}

/// Immutable finger-fold map. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureCodec {
    table: IndexMap<char, FoldSet>,
}

impl Default for GestureCodec {
    fn default() -> Self {
        Self::reference()
    }
}

impl GestureCodec {
    /// The a–z reference alphabet.
    pub fn reference() -> Self {
        let table = REFERENCE_ALPHABET
            .iter()
            .map(|(letter, fingers)| {
                let mut set = FoldSet::EMPTY;
                for &n in fingers.iter() {
                    if let Some(finger) = waive_domain::FingerId::new(n) {
                        set = set.with(finger);
                    }
                }
                (*letter, set)
            })
            .collect();
        Self { table }
    }

    /// Custom alphabet. Every letter needs a distinct, non-empty fold set.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, TeachError>
    where
        I: IntoIterator<Item = (char, FoldSet)>,
    {
        let mut table = IndexMap::new();
        for (letter, folds) in pairs {
            let letter = letter.to_ascii_lowercase();
            if !letter.is_ascii_lowercase() {
                return Err(TeachError::UnknownLetter(letter));
            }
            if folds.is_empty() {
                return Err(TeachError::Configuration(format!(
                    "letter {letter} has an empty fold set"
                )));
            }
            if let Some((other, _)) = table.iter().find(|(_, f)| **f == folds) {
                return Err(TeachError::Configuration(format!(
                    "letters {other} and {letter} share the fold set {folds}"
                )));
            }
            if table.insert(letter, folds).is_some() {
                return Err(TeachError::Configuration(format!(
                    "letter {letter} is defined twice"
                )));
            }
        }
        if table.is_empty() {
            return Err(TeachError::Configuration(
                "alphabet cannot be empty".to_string(),
            ));
        }
        Ok(Self { table })
    }

    /// Letters in curriculum order.
    pub fn alphabet(&self) -> impl Iterator<Item = char> + '_ {
        self.table.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Letter at curriculum position `index`.
    pub fn letter_at(&self, index: usize) -> Option<char> {
        self.table.get_index(index).map(|(letter, _)| *letter)
    }

    pub fn contains(&self, letter: char) -> bool {
        self.table.contains_key(&letter.to_ascii_lowercase())
    }

    /// Fold set for `letter`, case-insensitive.
    pub fn required_folds(&self, letter: char) -> Result<FoldSet, TeachError> {
        self.table
            .get(&letter.to_ascii_lowercase())
            .copied()
            .ok_or(TeachError::UnknownLetter(letter))
    }

    /// Exact set equality.
    #[inline]
    pub fn matches(&self, required: FoldSet, observed: FoldSet) -> bool {
        required == observed
    }

    /// Reverse lookup.
    pub fn letter_for(&self, folds: FoldSet) -> Option<char> {
        self.table
            .iter()
            .find_map(|(letter, f)| (*f == folds).then_some(*letter))
    }

    /// Decode one trimmed device token.
    pub fn parse_gesture(&self, token: &str) -> Result<Gesture, TeachError> {
        let token = token.trim();
        if token == "0" {
            return Ok(Gesture::Release);
        }
        FoldSet::parse_digits(token).map(Gesture::Folds)
    }
}
