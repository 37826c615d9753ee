//! Body segments produced by splitting a document on level-1 headings

use std::ops::Range;

use serde_json::{json, Value};

use super::newtypes::RemoteId;

/// A level-1 heading located in a document body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading text with the `#` marker and surrounding whitespace removed
    pub text: String,
    /// Byte range of the heading line, excluding its line terminator
    pub line: Range<usize>,
    /// Byte range of the content following the heading, up to the next
    /// level-1 heading or the end of the body
    pub body: Range<usize>,
}

/// One heading-delimited section of a document, uploaded as a remote post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Zero-based position among the document's posts
    pub order: usize,
    /// Post title, without any identifier suffix
    pub name: String,
    /// Remote identifier recovered from the `^<id>` suffix
    pub id: Option<RemoteId>,
    /// Markdown source between this heading and the next one
    pub content: String,
}

impl Post {
    /// Builds the create/update request body for this post
    pub fn to_payload(&self, entity_id: RemoteId, entry: &str) -> Value {
        json!({
            "name": self.name,
            "entry": entry,
            "entity_id": entity_id,
            "position": self.order,
            "visibility_id": 1,
        })
    }
}

/// Result of splitting a document body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segmentation {
    /// Text preceding the first level-1 heading
    pub body: String,
    /// Posts in document order
    pub posts: Vec<Post>,
    /// Located headings, parallel to `posts`
    pub headings: Vec<Heading>,
}
