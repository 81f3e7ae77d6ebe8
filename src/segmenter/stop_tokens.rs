use std::collections::HashSet;
use std::fs;
use std::path::Path;

use stop_words::{get, LANGUAGE};
use tracing::info;

use crate::error::{EngineError, Result};

/// Tokens that are neither indexed nor searched
#[derive(Clone, Debug, Default)]
pub struct StopTokens {
    tokens: HashSet<String>,
}

impl StopTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load one stop token per line, ignoring blank lines
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|source| EngineError::StopTokensUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let mut stop_tokens = Self::new();
        stop_tokens.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty()),
        );
        info!(path = %path.display(), tokens = stop_tokens.len(), "loaded stop tokens");
        Ok(stop_tokens)
    }

    /// Built-in English stop word list
    pub fn english() -> Self {
        let mut stop_tokens = Self::new();
        stop_tokens.extend(get(LANGUAGE::English).into_iter().map(|s| s.to_lowercase()));
        stop_tokens
    }

    pub fn extend<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    pub fn is_stop_token(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
