//! Learning (A–Z) and practice (word list) curricula.

use waive_domain::{FoldSet, LearningMode, TeachError};

use super::state::SessionState;
use crate::gesture_codec::GestureCodec;

/// What the learner is being asked for right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub letter: char,
    /// Word being spelled, practice mode only.
    pub word: Option<String>,
    pub folds: FoldSet,
}

/// How the position moved after a correct answer or a skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextLetter,
    NextInWord,
    WordCompleted { word: String, next_word: String },
}

/// Static curriculum content.
#[derive(Debug, Clone)]
pub struct Curriculum {
    codec: GestureCodec,
    words: Vec<String>,
}

impl Curriculum {
    /// Every word letter must exist in `codec`.
    pub fn new(codec: GestureCodec, words: Vec<String>) -> Result<Self, TeachError> {
        if codec.is_empty() {
            return Err(TeachError::Configuration("alphabet cannot be empty".to_string()));
        }
        if words.is_empty() {
            return Err(TeachError::Configuration("word list cannot be empty".to_string()));
        }
        for word in &words {
            if word.is_empty() {
                return Err(TeachError::Configuration("empty practice word".to_string()));
            }
            if let Some(letter) = word.chars().find(|c| !codec.contains(*c)) {
                return Err(TeachError::UnknownLetter(letter));
            }
        }
        Ok(Self { codec, words })
    }

    pub fn codec(&self) -> &GestureCodec {
        &self.codec
    }

    pub fn alphabet_len(&self) -> usize {
        self.codec.len()
    }

    /// Current target for `state`.
    pub fn target(&self, state: &SessionState) -> Result<Target, TeachError> {
        let (letter, word) = match state.mode {
            LearningMode::Learning => {
                let index = state.current_letter_index % self.codec.len();
                let letter = self.codec.letter_at(index).ok_or_else(|| {
                    TeachError::Configuration(format!("no letter at position {index}"))
                })?;
                (letter, None)
            }
            LearningMode::Practice => {
                let word = &self.words[state.current_word_index % self.words.len()];
                let letter = word
                    .chars()
                    .nth(state.current_word_letter_index)
                    .ok_or_else(|| {
                        TeachError::Configuration(format!(
                            "position {} is past the end of {word}",
                            state.current_word_letter_index
                        ))
                    })?;
                (letter, Some(word.clone()))
            }
        };
        let folds = self.codec.required_folds(letter)?;
        Ok(Target {
            letter,
            word,
            folds,
        })
    }

    /// Move one step forward. Learning wraps after the last letter, practice
    /// moves to the next word (wrapping) when the current one is spelled.
    pub fn advance(&self, state: &mut SessionState) -> Advance {
        match state.mode {
            LearningMode::Learning => {
                state.current_letter_index = (state.current_letter_index + 1) % self.codec.len();
                Advance::NextLetter
            }
            LearningMode::Practice => {
                let word_index = state.current_word_index % self.words.len();
                let word = &self.words[word_index];
                state.current_word_letter_index += 1;
                if state.current_word_letter_index < word.chars().count() {
                    return Advance::NextInWord;
                }
                state.current_word_letter_index = 0;
                state.current_word_index = (word_index + 1) % self.words.len();
                Advance::WordCompleted {
                    word: word.clone(),
                    next_word: self.words[state.current_word_index].clone(),
                }
            }
        }
    }
}
