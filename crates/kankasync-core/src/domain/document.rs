//! Document text model
//!
//! A document is a Markdown file with an optional YAML front matter block
//! delimited by `---` lines. The front matter is kept as an ordered mapping
//! so that rewriting it does not shuffle keys the sync never touches.

use serde_yaml::{Mapping, Value};

use super::errors::DomainError;

/// Ordered front matter mapping
pub type FrontMatter = Mapping;

const DELIMITER: &str = "---";

/// A parsed document: front matter plus Markdown body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    /// Splits raw file text into front matter and body
    ///
    /// Text without an opening delimiter is all body. An opening delimiter
    /// without a closing one is treated the same way.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidField` if the front matter block is not
    /// a YAML mapping.
    pub fn parse(text: &str) -> Result<Self, DomainError> {
        let Some((yaml, body)) = split_front_matter(text) else {
            return Ok(Self {
                front_matter: FrontMatter::new(),
                body: text.to_string(),
            });
        };

        let front_matter = match serde_yaml::from_str::<Value>(yaml) {
            Ok(Value::Mapping(map)) => map,
            Ok(Value::Null) => FrontMatter::new(),
            Ok(_) => {
                return Err(DomainError::InvalidField {
                    field: "front matter".to_string(),
                    message: "expected a mapping".to_string(),
                })
            }
            Err(e) => {
                return Err(DomainError::InvalidField {
                    field: "front matter".to_string(),
                    message: e.to_string(),
                })
            }
        };

        Ok(Self {
            front_matter,
            body: body.to_string(),
        })
    }

    /// Joins front matter and body back into file text
    ///
    /// An empty front matter mapping is omitted entirely.
    ///
    /// # Errors
    /// Returns `DomainError::ValidationFailed` if the mapping cannot be
    /// serialized.
    pub fn render(&self) -> Result<String, DomainError> {
        if self.front_matter.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.front_matter)
            .map_err(|e| DomainError::ValidationFailed(e.to_string()))?;
        Ok(format!("{DELIMITER}\n{yaml}{DELIMITER}\n{}", self.body))
    }
}

/// Returns `(yaml, body)` when the text opens with a front matter block
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\r\n")
        .or_else(|| text.strip_prefix("---\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}
