//! Defines the content graph: [`ContentRecord`]s for posts and pages, the
//! [`PostEdge`]s that link each post to its neighbours, and the
//! [`CategoryGroup`]s that collect posts by category. [`ContentGraph::new`]
//! assembles all three from flat lists of records; this is the shape the
//! planner ([`crate::planner`]) consumes.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Whether a record is a dated post or a standalone page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Post,
    Page,
}

/// One authored document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContentRecord {
    /// Opaque unique identifier. The loader uses the content-relative source
    /// path.
    pub id: String,

    pub kind: RecordKind,

    /// The route path derived from the source file name (see
    /// [`crate::slug::derive`]). Computed once on ingestion and never
    /// recomputed. Records without one produce no route.
    pub slug: Option<String>,

    pub title: Option<String>,

    /// Description paragraphs, in order.
    pub description: Vec<String>,

    /// The post's category, if any. Pages don't have categories.
    pub category: Option<String>,

    /// Publication date (posts only).
    pub date: Option<NaiveDate>,

    /// Revision date, if the record was updated after publication.
    pub updated: Option<NaiveDate>,

    /// Whether the post asks for a table of contents.
    pub show_toc: bool,

    /// The raw body text (everything after the frontmatter).
    #[serde(skip)]
    pub body: String,

    /// Reading time rounded up to whole minutes.
    pub time_to_read_minutes: u32,

    /// The source file backing this record.
    pub content_file_path: PathBuf,
}

/// A reference to a neighbouring post, as attached by the content layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NeighborRef {
    pub slug: Option<String>,
    pub title: Option<String>,
}

impl From<&ContentRecord> for NeighborRef {
    fn from(record: &ContentRecord) -> NeighborRef {
        NeighborRef {
            slug: record.slug.clone(),
            title: record.title.clone(),
        }
    }
}

/// A post together with its neighbours in the date-descending sequence.
/// `previous` is the next-older post and `next` is the next-newer one.
#[derive(Clone, Debug, PartialEq)]
pub struct PostEdge {
    pub node: ContentRecord,
    pub previous: Option<NeighborRef>,
    pub next: Option<NeighborRef>,
}

/// The posts sharing one category value. `field_value` is [`None`] for posts
/// without a category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryGroup {
    pub field_value: Option<String>,
    pub total_count: usize,
    pub nodes: Vec<ContentRecord>,
}

/// Everything the planner needs, already sorted and linked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentGraph {
    pub categories: Vec<CategoryGroup>,
    pub pages: Vec<ContentRecord>,
    pub posts: Vec<PostEdge>,
}

impl ContentGraph {
    /// Builds a graph from unsorted posts and pages. Posts are sorted by date,
    /// most recent first (undated posts last, ties broken by `id` so the order
    /// is deterministic), then linked to their neighbours and grouped by
    /// category. Pages are ordered by `id`.
    pub fn new(mut posts: Vec<ContentRecord>, mut pages: Vec<ContentRecord>) -> ContentGraph {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        pages.sort_by(|a, b| a.id.cmp(&b.id));

        ContentGraph {
            categories: group_by_category(&posts),
            posts: link_neighbors(posts),
            pages,
        }
    }

    /// The number of posts in the graph.
    pub fn total_count(&self) -> usize {
        self.posts.len()
    }

    /// Looks up a category group by its exact name.
    pub fn category(&self, name: &str) -> Option<&CategoryGroup> {
        self.categories
            .iter()
            .find(|g| g.field_value.as_deref() == Some(name))
    }
}

fn link_neighbors(posts: Vec<ContentRecord>) -> Vec<PostEdge> {
    let neighbors: Vec<NeighborRef> = posts.iter().map(NeighborRef::from).collect();
    posts
        .into_iter()
        .enumerate()
        .map(|(i, node)| PostEdge {
            previous: neighbors.get(i + 1).cloned(),
            next: match i {
                0 => None,
                _ => neighbors.get(i - 1).cloned(),
            },
            node,
        })
        .collect()
}

fn group_by_category(posts: &[ContentRecord]) -> Vec<CategoryGroup> {
    let mut groups: BTreeMap<Option<&str>, Vec<ContentRecord>> = BTreeMap::new();
    for post in posts {
        groups
            .entry(post.category.as_deref())
            .or_default()
            .push(post.clone());
    }

    groups
        .into_iter()
        .map(|(name, nodes)| CategoryGroup {
            field_value: name.map(str::to_owned),
            total_count: nodes.len(),
            nodes,
        })
        .collect()
}
