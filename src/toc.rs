//! Extracts a table of contents from a record body: one [`TocEntry`] per
//! markdown heading, in document order, each with an anchor id unique within
//! the body.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashMap;

/// A heading in a record body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,

    /// Heading text, with inline markup stripped.
    pub title: String,

    /// Anchor id for linking. Headings with an explicit `{#id}` keep it;
    /// others get a slug of their title, suffixed `-1`, `-2`, ... on repeats.
    pub id: String,
}

/// Lists the headings in `markdown`.
pub fn extract(markdown: &str) -> Vec<TocEntry> {
    let mut toc = Vec::new();
    let mut ids = Ids::default();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, Options::ENABLE_HEADING_ATTRIBUTES) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((level_number(level), id.map(|id| id.into_string()), String::new()));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit_id, text)) = current.take() {
                    let title = text.trim().to_owned();
                    let id = match explicit_id {
                        Some(id) => ids.claim(id),
                        None => ids.claim(anchor(&title)),
                    };
                    toc.push(TocEntry { level, title, id });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, buf)) = &mut current {
                    buf.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, _, buf)) = &mut current {
                    buf.push(' ');
                }
            }
            _ => {}
        }
    }
    toc
}

/// Counts the ids handed out so far.
#[derive(Default)]
struct Ids(HashMap<String, usize>);

impl Ids {
    fn claim(&mut self, base: String) -> String {
        let count = self.0.entry(base.clone()).or_insert(0);
        *count += 1;
        match *count {
            1 => base,
            n => format!("{}-{}", base, n - 1),
        }
    }
}

/// Lowercases ASCII letters and digits, joins words with single dashes, and
/// drops everything else.
fn anchor(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            dash = false;
        } else if !dash && (c.is_whitespace() || c == '-' || c == '_') {
            out.push('-');
            dash = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

fn level_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
