//! Defines the [`Parser`] which loads [`ContentRecord`]s from the content
//! directory and assembles them into a [`ContentGraph`]. Loading is the only
//! I/O in the crate; everything downstream is a pure function of the
//! resulting [`QueryResult`].

use std::{
    fs::File,
    path::{Component, Path},
};

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::reading_time;
use crate::record::{ContentGraph, ContentRecord, RecordKind};
use crate::slug;

/// Parses [`ContentRecord`]s from source files.
pub struct Parser {
    /// Reading speed used to compute each record's
    /// [`ContentRecord::time_to_read_minutes`].
    words_per_minute: u32,
}

impl Parser {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(words_per_minute: u32) -> Parser {
        Parser { words_per_minute }
    }

    /// Walks `content_directory` and loads every post (a source file with a
    /// `posts` directory in its path) and page (a `pages` directory in its
    /// path). Source files end in `.md` or `.mdx` and are structured as
    /// follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with fields `title`, `date` (required for posts),
    ///    and optionally `description`, `category`, `updated` and `showToc`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// category: Meta
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    ///
    /// A file that fails to load doesn't stop the walk. Its error is
    /// collected into [`QueryResult::errors`] so that every problem is
    /// reported at once.
    pub fn parse_content(&self, content_directory: &Path) -> QueryResult {
        let mut posts = Vec::new();
        let mut pages = Vec::new();
        let mut errors = Vec::new();

        for result in WalkDir::new(content_directory).sort_by_file_name() {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    errors.push(Error::from(e));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_source_file(entry.path()) {
                continue;
            }

            // strip_prefix() should never fail since WalkDir yields
            // descendants of `content_directory`
            let relative_path = match entry.path().strip_prefix(content_directory) {
                Ok(relative_path) => relative_path,
                Err(_) => continue,
            };
            let kind = match record_kind(relative_path) {
                Some(kind) => kind,
                None => {
                    debug!(path = %relative_path.display(), "ignoring file outside posts/ and pages/");
                    continue;
                }
            };

            match self.parse_record(content_directory, relative_path, kind) {
                Ok(record) => match kind {
                    RecordKind::Post => posts.push(record),
                    RecordKind::Page => pages.push(record),
                },
                Err(e) => errors.push(e),
            }
        }

        info!(
            posts = posts.len(),
            pages = pages.len(),
            errors = errors.len(),
            "loaded content"
        );
        QueryResult {
            graph: ContentGraph::new(posts, pages),
            errors,
        }
    }

    /// Parses a single record and annotates any error with the offending
    /// path.
    fn parse_record(
        &self,
        content_directory: &Path,
        relative_path: &Path,
        kind: RecordKind,
    ) -> Result<ContentRecord> {
        match self._parse_record(content_directory, relative_path, kind) {
            Ok(record) => Ok(record),
            Err(e) => Err(Error::Annotated(
                format!("parsing `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_record(
        &self,
        content_directory: &Path,
        relative_path: &Path,
        kind: RecordKind,
    ) -> Result<ContentRecord> {
        use std::io::Read;
        let full_path = content_directory.join(relative_path);
        let mut contents = String::new();
        File::open(&full_path)?.read_to_string(&mut contents)?;

        let (frontmatter, body) = split_frontmatter(&contents)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(frontmatter)?;

        let date = frontmatter.date.as_deref().map(parse_date).transpose()?;
        if kind == RecordKind::Post && date.is_none() {
            return Err(Error::MissingDate);
        }
        let updated = frontmatter.updated.as_deref().map(parse_date).transpose()?;

        let record = ContentRecord {
            id: relative_path.to_string_lossy().into_owned(),
            kind,
            slug: slug::derive(relative_path),
            title: frontmatter.title,
            description: match frontmatter.description {
                None => Vec::new(),
                Some(Description::One(paragraph)) => vec![paragraph],
                Some(Description::Many(paragraphs)) => paragraphs,
            },
            category: match kind {
                RecordKind::Post => frontmatter.category,
                RecordKind::Page => None,
            },
            date,
            updated,
            show_toc: frontmatter.show_toc,
            time_to_read_minutes: reading_time::estimate(body, self.words_per_minute)
                .whole_minutes(),
            body: body.to_owned(),
            content_file_path: full_path,
        };
        debug!(id = %record.id, slug = ?record.slug, "parsed record");
        Ok(record)
    }
}

const SOURCE_EXTENSIONS: [&str; 2] = ["md", "mdx"];

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Posts live under a `posts` directory and pages under a `pages` directory,
/// at any depth.
fn record_kind(relative_path: &Path) -> Option<RecordKind> {
    let parent = relative_path.parent()?;
    parent.components().find_map(|c| match c {
        Component::Normal(name) if name == "posts" => Some(RecordKind::Post),
        Component::Normal(name) if name == "pages" => Some(RecordKind::Page),
        _ => None,
    })
}

/// Splits a source file into its YAML frontmatter and its body. The closing
/// fence must be a line of its own, so `---` inside a frontmatter value (or a
/// longer `----` rule) doesn't end the frontmatter.
fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    const CLOSING_FENCE: &str = "\n---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    let rest = &input[FENCE.len()..];
    let mut from = 0;
    while let Some(offset) = rest[from..].find(CLOSING_FENCE) {
        let yaml_stop = from + offset;
        let after = &rest[yaml_stop + CLOSING_FENCE.len()..];
        if after.is_empty() || after.starts_with('\n') || after.starts_with("\r\n") {
            return Ok((&rest[..yaml_stop], after.trim_start_matches(['\r', '\n'])));
        }
        from = yaml_stop + 1;
    }
    Err(Error::FrontmatterMissingEndFence)
}

/// Accepts plain dates (`2021-04-16`) and RFC 3339 timestamps, keeping only
/// the date.
fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|d| d.date_naive()))
        .map_err(|err| Error::InvalidDate {
            value: value.to_owned(),
            err,
        })
}

#[derive(Deserialize)]
struct Frontmatter {
    #[serde(default, alias = "Title")]
    title: Option<String>,

    #[serde(default, alias = "Date")]
    date: Option<String>,

    #[serde(default, alias = "Updated")]
    updated: Option<String>,

    #[serde(default, alias = "Category")]
    category: Option<String>,

    #[serde(default, alias = "Description")]
    description: Option<Description>,

    #[serde(default, rename = "showToc")]
    show_toc: bool,
}

/// A description is either a single paragraph or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Description {
    One(String),
    Many(Vec<String>),
}

/// The output of [`Parser::parse_content`]: the graph built from every file
/// that loaded, plus the errors for every file that didn't.
pub struct QueryResult {
    pub graph: ContentGraph,
    pub errors: Vec<Error>,
}

impl QueryResult {
    /// Returns the graph if the query reported no errors.
    pub fn into_graph(self) -> std::result::Result<ContentGraph, ContentQueryError> {
        match self.errors.is_empty() {
            true => Ok(self.graph),
            false => Err(ContentQueryError {
                errors: self.errors,
            }),
        }
    }
}

/// Returned when a content query reported one or more errors.
#[derive(Debug, thiserror::Error)]
#[error("{}", summarize(.errors))]
pub struct ContentQueryError {
    pub errors: Vec<Error>,
}

/// One header line with the error count, then one indented line per error.
fn summarize(errors: &[Error]) -> String {
    errors.iter().fold(
        format!("content query failed with {} error(s)", errors.len()),
        |mut out, err| {
            out.push_str("\n  ");
            out.push_str(&err.to_string());
            out
        },
    )
}

/// Represents the result of a record-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`ContentRecord`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a source file is missing its starting frontmatter fence
    /// (`---`).
    #[error("source file must begin with `---`")]
    FrontmatterMissingStartFence,

    /// Returned when a source file is missing its terminal frontmatter fence
    /// (i.e., the starting fence was found but the ending one was missing).
    #[error("missing closing `---`")]
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    #[error(transparent)]
    DeserializeYaml(#[from] serde_yaml::Error),

    /// Returned when a `date` or `updated` field isn't a date.
    #[error("invalid date `{value}`: {err}")]
    InvalidDate {
        value: String,
        err: chrono::ParseError,
    },

    /// Returned when a post has no `date`.
    #[error("posts must have a `date`")]
    MissingDate,

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Returned for WalkDir I/O errors.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    /// An error with an annotation.
    #[error("{0}: {1}")]
    Annotated(String, Box<Error>),
}
