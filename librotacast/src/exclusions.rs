//! Permanently excluded item identifiers
//!
//! Loaded fresh each run from a newline-delimited file of integers. The file
//! is operator-maintained; this system only reads it.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{ExclusionError, Result};

#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    indices: HashSet<usize>,
}

impl ExclusionSet {
    /// Load exclusions from a file. A missing file yields an empty set;
    /// a line that is not a non-negative integer is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(ExclusionError::ReadError)?;
        Self::parse(&content)
    }

    /// Parse newline-delimited identifiers. Blank lines are ignored.
    pub fn parse(content: &str) -> Result<Self> {
        let mut indices = HashSet::new();
        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let index = trimmed
                .parse::<usize>()
                .map_err(|_| ExclusionError::Parse {
                    line_no: line_no + 1,
                    text: trimmed.to_string(),
                })?;
            indices.insert(index);
        }
        Ok(Self { indices })
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl FromIterator<usize> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            indices: iter.into_iter().collect(),
        }
    }
}
