// The keyword list: a JSON array of lower-cased terms in `<data_dir>/keywords.json`.

use gigscout_sdk::IOUtil;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum KeywordError {
    #[error("keyword list is empty; expected comma-separated words such as 'сантехник, электрик'")]
    Empty,

    #[error("failed to read keywords from '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("keywords file '{path}' is not a JSON array of strings: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write keywords: {0:#}")]
    Write(anyhow::Error),
}

/// Split operator input on commas into a keyword list.
///
/// Entries are trimmed and lower-cased; blanks and repeats are dropped while
/// the first-seen order is kept.
pub fn parse_keyword_list(input: &str) -> Result<Vec<String>, KeywordError> {
    let keywords = normalize(input.split(','));
    if keywords.is_empty() {
        return Err(KeywordError::Empty);
    }
    Ok(keywords)
}

fn normalize<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for value in values {
        let keyword = value.trim().to_lowercase();
        if keyword.is_empty() || keywords.contains(&keyword) {
            continue;
        }
        keywords.push(keyword);
    }
    keywords
}

#[derive(Debug, Clone)]
pub struct KeywordStore {
    path: PathBuf,
}

impl KeywordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current keywords. A missing file is an empty list.
    pub fn load(&self) -> Result<Vec<String>, KeywordError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(KeywordError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let stored: Vec<String> =
            serde_json::from_str(&json).map_err(|source| KeywordError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(normalize(stored.iter().map(String::as_str)))
    }

    /// Replace the whole list. An empty list is refused and leaves the file untouched.
    pub fn replace(&self, keywords: &[String]) -> Result<(), KeywordError> {
        let keywords = normalize(keywords.iter().map(String::as_str));
        if keywords.is_empty() {
            return Err(KeywordError::Empty);
        }
        IOUtil::save_object(&self.path, &keywords).map_err(KeywordError::Write)
    }

    /// Parse operator input and store it. Returns the stored list.
    pub fn replace_from_input(&self, input: &str) -> Result<Vec<String>, KeywordError> {
        let keywords = parse_keyword_list(input)?;
        self.replace(&keywords)?;
        Ok(keywords)
    }
}
