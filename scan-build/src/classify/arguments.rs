// SPDX-License-Identifier: GPL-3.0-or-later

use super::ClassifyError;

/// A forward-only cursor over the arguments of a compiler invocation.
///
/// The cursor starts before the first token: `advance` has to be called
/// once before `current` returns anything. Empty tokens are dropped at
/// construction, build systems tend to produce them from unset variables.
#[derive(Debug, Clone)]
pub struct Arguments {
    tokens: Vec<String>,
    position: Option<usize>,
}

impl Arguments {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens = tokens.into_iter().map(Into::into).filter(|token: &String| !token.is_empty()).collect();
        Self { tokens, position: None }
    }

    /// The token the cursor points at.
    pub fn current(&self) -> Result<&str, ClassifyError> {
        self.position
            .and_then(|index| self.tokens.get(index))
            .map(String::as_str)
            .ok_or(ClassifyError::OutOfBounds)
    }

    /// Moves the cursor one token forward and returns the new current token.
    ///
    /// Returns `None` when the sequence is exhausted. The cursor stays past
    /// the end from then on.
    pub fn advance(&mut self) -> Option<&str> {
        let next = self.position.map_or(0, |index| index + 1);
        // Never move further than one past the end.
        self.position = Some(next.min(self.tokens.len()));
        self.tokens.get(next).map(String::as_str)
    }

    /// Advances and returns the token, or reports which flag was left without a value.
    pub(super) fn value_of(&mut self, flag: &str) -> Result<String, ClassifyError> {
        self.advance()
            .map(str::to_string)
            .ok_or_else(|| ClassifyError::MissingValue { flag: flag.to_string() })
    }
}
