//! Set of folded fingers encoding one letter.
use crate::error::TeachError;
use crate::finger::FingerId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fingers that must be curled together, stored as a six-bit mask.
///
/// Equality is set equality: `{1,4,5}` equals `{4,1,5}` and differs from
/// both `{1,4}` and `{1,4,5,6}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct FoldSet(u8);

impl FoldSet {
    /// No fingers folded (the glove's release frame).
    pub const EMPTY: FoldSet = FoldSet(0);

    /// Build from finger numbers. Fails on anything outside 1..=6.
    pub fn from_numbers(numbers: &[u8]) -> Result<Self, TeachError> {
        numbers.iter().try_fold(Self::EMPTY, |set, &n| {
            FingerId::new(n)
                .map(|finger| set.with(finger))
                .ok_or_else(|| TeachError::UnrecognizedGesture(format!("finger {n}")))
        })
    }

    /// Parse a device token made of fold digits, e.g. `"145"`.
    ///
    /// Rejects empty tokens, non-digits, digits outside 1..=6 and repeated digits.
    pub fn parse_digits(token: &str) -> Result<Self, TeachError> {
        let unrecognized = || TeachError::UnrecognizedGesture(token.to_string());
        if token.is_empty() {
            return Err(unrecognized());
        }

        let mut set = Self::EMPTY;
        for ch in token.chars() {
            let finger = ch
                .to_digit(10)
                .and_then(|d| FingerId::new(d as u8))
                .ok_or_else(unrecognized)?;
            if set.contains(finger) {
                return Err(unrecognized());
            }
            set = set.with(finger);
        }
        Ok(set)
    }

    /// Copy of this set with `finger` added.
    #[inline]
    pub const fn with(self, finger: FingerId) -> Self {
        Self(self.0 | (1 << (finger.number() - 1)))
    }

    #[inline]
    pub const fn contains(self, finger: FingerId) -> bool {
        self.0 & (1 << (finger.number() - 1)) != 0
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Fingers in ascending glove order.
    pub fn fingers(self) -> impl Iterator<Item = FingerId> {
        FingerId::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Digit form sent over the wire, e.g. `"145"`.
    pub fn to_digits(self) -> String {
        self.fingers().map(|f| f.to_string()).collect()
    }

    /// Spoken form, e.g. `"1 and 4 and 5"`.
    pub fn spoken(self) -> String {
        self.fingers()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl TryFrom<Vec<u8>> for FoldSet {
    type Error = TeachError;

    fn try_from(numbers: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_numbers(&numbers)
    }
}

impl From<FoldSet> for Vec<u8> {
    fn from(set: FoldSet) -> Self {
        set.fingers().map(FingerId::number).collect()
    }
}

impl fmt::Display for FoldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers: Vec<String> = self.fingers().map(|f| f.to_string()).collect();
        write!(f, "{{{}}}", numbers.join(", "))
    }
}
