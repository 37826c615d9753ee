//! Markdown scanning and rendering
//!
//! - [`find_headings`] locates level-1 headings with their byte ranges using
//!   pulldown-cmark's offset iterator, so headings inside code blocks or
//!   HTML are never mistaken for section breaks.
//! - [`MarkdownRenderer`] converts document source into the HTML the remote
//!   API stores, after flattening `[[wiki-links]]` to their display text.

use std::ops::Range;
use std::sync::OnceLock;

use pulldown_cmark::{html, Event, HeadingLevel, Options, Parser, Tag};
use regex::{Captures, Regex};

use kankasync_core::domain::Heading;
use kankasync_core::ports::IMarkdownRenderer;

// ============================================================================
// Heading scanner
// ============================================================================

/// Finds every level-1 heading in `body`, in document order
///
/// Each heading's `line` range excludes the trailing line terminator; its
/// `body` range runs from the start of the following line up to the next
/// level-1 heading (or the end of the text).
pub fn find_headings(body: &str) -> Vec<Heading> {
    let lines: Vec<Range<usize>> = Parser::new_ext(body, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => Some(trim_line_end(body, range)),
            _ => None,
        })
        .collect();

    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let body_start = skip_line_break(body, line.end);
            let body_end = lines.get(idx + 1).map_or(body.len(), |next| next.start);
            Heading {
                text: heading_text(&body[line.clone()]),
                line: line.clone(),
                body: body_start.min(body_end)..body_end,
            }
        })
        .collect()
}

/// Drops trailing `\r`/`\n` bytes from a block range
fn trim_line_end(text: &str, range: Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();
    let mut end = range.end.min(text.len());
    while end > range.start && matches!(bytes[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    range.start..end
}

/// Returns the offset just past the line break at `pos`, if there is one
fn skip_line_break(text: &str, pos: usize) -> usize {
    let rest = &text[pos..];
    if rest.starts_with("\r\n") {
        pos + 2
    } else if rest.starts_with('\n') {
        pos + 1
    } else {
        pos
    }
}

/// Extracts the raw title text from a heading's source
///
/// Handles ATX (`# Title #`) and setext (`Title` underlined with `=`)
/// forms. Inline markup is kept verbatim.
pub(crate) fn heading_text(source: &str) -> String {
    let first_line = source.lines().next().unwrap_or_default().trim();

    let Some(rest) = first_line.strip_prefix('#') else {
        // Setext: the title is the first line.
        return first_line.to_string();
    };

    let rest = rest.trim();
    // Optional closing sequence: whitespace followed only by '#'.
    let without_closing = rest.trim_end_matches('#');
    if without_closing.len() == rest.len() {
        return rest.to_string();
    }
    if without_closing.is_empty() {
        return String::new();
    }
    if without_closing.ends_with(char::is_whitespace) {
        without_closing.trim_end().to_string()
    } else {
        rest.to_string()
    }
}

// ============================================================================
// Renderer
// ============================================================================

fn wiki_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(!?)\[\[(?:[^\]|]*\|)?([^\]]+)\]\]").expect("valid wiki-link regex")
    })
}

/// Replaces `[[target|alias]]` with `alias` and `[[target]]` with `target`
///
/// Embeds (`![[target]]`) are left as written.
pub fn normalize_wiki_links(source: &str) -> String {
    wiki_link_pattern()
        .replace_all(source, |caps: &Captures<'_>| {
            if caps[1].is_empty() {
                caps[2].to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Markdown-to-HTML renderer backed by pulldown-cmark
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl IMarkdownRenderer for MarkdownRenderer {
    fn render(&self, source: &str) -> String {
        let source = normalize_wiki_links(source);

        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        let parser = Parser::new_ext(&source, options);
        let mut out = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod headings {
        use super::*;

        #[test]
        fn test_atx_headings_with_ranges() {
            let text = "# Intro ^5\nHello\n# Rules\nBe nice";
            let headings = find_headings(text);
            assert_eq!(headings.len(), 2);

            assert_eq!(headings[0].text, "Intro ^5");
            assert_eq!(&text[headings[0].line.clone()], "# Intro ^5");
            assert_eq!(&text[headings[0].body.clone()], "Hello\n");

            assert_eq!(headings[1].text, "Rules");
            assert_eq!(&text[headings[1].line.clone()], "# Rules");
            assert_eq!(&text[headings[1].body.clone()], "Be nice");
        }

        #[test]
        fn test_ignores_lower_levels_and_code() {
            let text = "intro\n## Sub\n```\n# not a heading\n```\n# Real\nbody\n### deep\n";
            let headings = find_headings(text);
            assert_eq!(headings.len(), 1);
            assert_eq!(headings[0].text, "Real");
            assert_eq!(&text[headings[0].body.clone()], "body\n### deep\n");
        }

        #[test]
        fn test_setext_heading() {
            let text = "Title\n=====\ncontent";
            let headings = find_headings(text);
            assert_eq!(headings.len(), 1);
            assert_eq!(headings[0].text, "Title");
            assert_eq!(&text[headings[0].line.clone()], "Title\n=====");
            assert_eq!(&text[headings[0].body.clone()], "content");
        }

        #[test]
        fn test_heading_at_end_without_newline() {
            let text = "text\n# Last";
            let headings = find_headings(text);
            assert_eq!(headings.len(), 1);
            assert_eq!(headings[0].body, text.len()..text.len());
        }

        #[test]
        fn test_crlf_lines() {
            let text = "# A\r\none\r\n# B\r\ntwo";
            let headings = find_headings(text);
            assert_eq!(&text[headings[0].line.clone()], "# A");
            assert_eq!(&text[headings[0].body.clone()], "one\r\n");
            assert_eq!(&text[headings[1].body.clone()], "two");
        }

        #[test]
        fn test_no_headings() {
            assert!(find_headings("just some text\n\nmore").is_empty());
            assert!(find_headings("").is_empty());
        }

        #[test]
        fn test_heading_text_closing_sequence() {
            assert_eq!(heading_text("# Title ##"), "Title");
            assert_eq!(heading_text("#   Spaced   "), "Spaced");
            assert_eq!(heading_text("# C#"), "C#");
            assert_eq!(heading_text("#"), "");
            assert_eq!(heading_text("# ###"), "");
        }
    }

    mod rendering {
        use super::*;

        #[test]
        fn test_wiki_links() {
            assert_eq!(normalize_wiki_links("see [[Bob]]"), "see Bob");
            assert_eq!(
                normalize_wiki_links("ask [[People/Bob|the smith]] now"),
                "ask the smith now"
            );
            assert_eq!(
                normalize_wiki_links("[[a]] and [[b|c]]"),
                "a and c"
            );
            assert_eq!(normalize_wiki_links("no links [here]"), "no links [here]");
        }

        #[test]
        fn test_embeds_left_alone() {
            assert_eq!(normalize_wiki_links("![[map.png]]"), "![[map.png]]");
            assert_eq!(
                normalize_wiki_links("![[map.png|small]] near [[Harbor]]"),
                "![[map.png|small]] near Harbor"
            );
        }

        #[test]
        fn test_render_html() {
            let renderer = MarkdownRenderer::new();
            assert_eq!(renderer.render("Hello *there*"), "<p>Hello <em>there</em></p>\n");
            assert_eq!(renderer.render("Meet [[Bob|the smith]]"), "<p>Meet the smith</p>\n");
            assert_eq!(renderer.render(""), "");
        }

        #[test]
        fn test_render_table() {
            let html = MarkdownRenderer.render("| a | b |\n|---|---|\n| 1 | 2 |\n");
            assert!(html.contains("<table>"));
        }
    }
}
