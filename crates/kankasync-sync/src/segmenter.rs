//! Document segmentation
//!
//! Splits a document body on its level-1 headings into an entity body and
//! an ordered list of posts, and writes server-assigned post identifiers
//! back into the heading lines afterwards.
//!
//! A heading may carry its post's remote id as a trailing ` ^<digits>`
//! token. Headings without one, or with `^0`, are new posts.

use std::ops::Range;

use thiserror::Error;

use kankasync_core::domain::{Heading, Post, RemoteId, Segmentation};

use crate::markdown::{find_headings, heading_text};

/// Errors raised while splitting or restamping a document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// A heading has no title text
    #[error("Heading at byte {offset} has an empty title")]
    EmptyTitle {
        /// Byte offset of the heading line
        offset: usize,
    },

    /// A heading ends in a `^` token that is not a valid identifier
    #[error("Heading '{heading}' has a malformed identifier '{token}'")]
    MalformedIdentifier {
        /// Full heading text
        heading: String,
        /// The offending trailing token
        token: String,
    },

    /// A heading can no longer be found in the live document
    #[error("Heading '{title}' (read at byte {offset}) is no longer in the document")]
    StaleOffset {
        /// Post title expected at the offset
        title: String,
        /// Byte offset of the heading line when it was found
        offset: usize,
    },

    /// Restamping was given a different number of posts than headings
    #[error("Found {headings} headings but {posts} posts")]
    PostCountMismatch { headings: usize, posts: usize },
}

/// Splits heading text into its title and optional trailing identifier
///
/// # Errors
/// Returns `SegmentError::MalformedIdentifier` when the last
/// whitespace-separated token starts with `^` but is not `^<digits>`, and
/// `SegmentError::EmptyTitle` when no title remains. A zero id marks a new
/// post and is stripped like any other.
pub fn parse_title(text: &str, offset: usize) -> Result<(String, Option<RemoteId>), SegmentError> {
    let text = text.trim();
    let (head, last) = match text.rsplit_once(char::is_whitespace) {
        Some((head, last)) => (head.trim_end(), last),
        None => ("", text),
    };

    let (title, id) = match last.strip_prefix('^') {
        Some(digits) => {
            let value = digits
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| digits.parse::<u64>().ok())
                .flatten()
                .ok_or_else(|| SegmentError::MalformedIdentifier {
                    heading: text.to_string(),
                    token: last.to_string(),
                })?;
            (head, RemoteId::new(value).ok())
        }
        None => (text, None),
    };

    if title.is_empty() {
        return Err(SegmentError::EmptyTitle { offset });
    }
    Ok((title.to_string(), id))
}

/// Heading line written back after a sync
pub fn stamp_line(post: &Post) -> String {
    match post.id {
        Some(id) => format!("# {} ^{id}", post.name),
        None => format!("# {}", post.name),
    }
}

/// Splits `text` on the headings located by [`find_headings`]
pub fn segment(text: &str) -> Result<Segmentation, SegmentError> {
    segment_with(text, find_headings(text))
}

/// Splits `text` on a given set of level-1 headings
///
/// The entity body is `text` with every heading's span (heading line plus
/// its body) removed. Posts follow heading order and carry the source
/// between the heading line and the next heading, with trailing line
/// breaks trimmed.
///
/// # Errors
/// Fails on the first heading whose title cannot be parsed; no partial
/// result is returned.
pub fn segment_with(text: &str, mut headings: Vec<Heading>) -> Result<Segmentation, SegmentError> {
    headings.sort_by_key(|h| h.line.start);

    let mut posts = Vec::with_capacity(headings.len());
    for (order, heading) in headings.iter().enumerate() {
        let (name, id) = parse_title(&heading.text, heading.line.start)?;
        let content = text
            .get(heading.body.clone())
            .unwrap_or_default()
            .trim_end_matches(['\r', '\n'])
            .to_string();
        posts.push(Post {
            order,
            name,
            id,
            content,
        });
    }

    let mut body = String::with_capacity(text.len());
    let mut cursor = 0;
    for heading in &headings {
        let span_end = heading.body.end.max(heading.line.end);
        if heading.line.start > cursor {
            body.push_str(&text[cursor..heading.line.start]);
        }
        cursor = cursor.max(span_end);
    }
    if cursor < text.len() {
        body.push_str(&text[cursor..]);
    }

    Ok(Segmentation {
        body,
        posts,
        headings,
    })
}

/// Whether `range` in `text` still holds a heading titled `title`
fn holds_title(text: &str, range: &Range<usize>, title: &str) -> bool {
    text.get(range.clone())
        .and_then(|source| parse_title(&heading_text(source), range.start).ok())
        .is_some_and(|(found, _)| found == title)
}

/// Heading line ranges in `live` for `posts`, matched by order and title
///
/// Each post takes the first unclaimed heading after the previous match
/// whose title equals the post's name.
fn relocate(
    live: &str,
    headings: &[Heading],
    posts: &[Post],
) -> Result<Vec<Range<usize>>, SegmentError> {
    let current = find_headings(live);
    let mut candidates = current.iter();
    headings
        .iter()
        .zip(posts)
        .map(|(recorded, post)| {
            candidates
                .by_ref()
                .find(|h| holds_title(live, &h.line, &post.name))
                .map(|h| h.line.clone())
                .ok_or_else(|| SegmentError::StaleOffset {
                    title: post.name.clone(),
                    offset: recorded.line.start,
                })
        })
        .collect()
}

/// Rewrites heading lines in the live document with the posts' identifiers
///
/// `headings` and `posts` are parallel, as produced by [`segment_with`].
/// When every heading still sits at its recorded offset those ranges are
/// used; otherwise the live body is rescanned and headings are matched to
/// posts by order and title, so text inserted elsewhere during a sync does
/// not lose the new identifiers. Replacements run in descending offset
/// order so earlier offsets stay valid. Nothing is returned unless every
/// heading could be rewritten.
///
/// # Errors
/// Returns `SegmentError::StaleOffset` when some post's heading can no
/// longer be found in `live`.
pub fn restamp(live: &str, headings: &[Heading], posts: &[Post]) -> Result<String, SegmentError> {
    if headings.len() != posts.len() {
        return Err(SegmentError::PostCountMismatch {
            headings: headings.len(),
            posts: posts.len(),
        });
    }

    let in_place = headings
        .iter()
        .zip(posts)
        .all(|(heading, post)| holds_title(live, &heading.line, &post.name));
    let ranges = if in_place {
        headings.iter().map(|h| h.line.clone()).collect()
    } else {
        relocate(live, headings, posts)?
    };

    let mut pairs: Vec<(Range<usize>, &Post)> = ranges.into_iter().zip(posts).collect();
    pairs.sort_by(|a, b| b.0.start.cmp(&a.0.start));

    let mut out = live.to_string();
    for (range, post) in pairs {
        out.replace_range(range, &stamp_line(post));
    }
    Ok(out)
}
