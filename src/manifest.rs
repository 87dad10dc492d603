//! Turns planned [`RouteDescriptor`]s into a [`Manifest`]: everything a
//! rendering layer needs to produce each page, serialized as JSON. Listing
//! routes gain their entries and pagination links; page and post routes gain
//! the display metadata of the record they render.

use crate::listing::{Lister, ListingEntry};
use crate::merge::Resolver;
use crate::pagination::PaginationLinks;
use crate::planner::{PlanOptions, RouteContext, RouteDescriptor};
use crate::record::{ContentGraph, ContentRecord};
use crate::slug::{self, slugify};
use crate::timestamp::{DateFormat, Timestamp};
use crate::toc::{self, TocEntry};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// The file name the manifest is written to inside the output directory.
pub const MANIFEST_FILE: &str = "routes.json";

/// Display metadata for the record behind a page or post route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub title: Option<String>,
    pub description: Vec<String>,
    pub category: Option<String>,
    pub category_link: Option<String>,
    pub date: Option<Timestamp>,
    pub time_to_read_minutes: u32,
    pub show_toc: bool,

    /// The headings of the body. Extracted whether or not `show_toc` is set;
    /// the flag only says whether to display them.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toc: Vec<TocEntry>,

    pub content_file_path: PathBuf,
}

/// A route plus the data its template renders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestRoute {
    #[serde(flatten)]
    pub route: RouteDescriptor,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination_links: Option<PaginationLinks>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<ListingEntry>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordMeta>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub title: String,
    pub routes: Vec<ManifestRoute>,
}

/// Assembles a [`Manifest`] from a graph and the routes planned for it.
pub struct ManifestBuilder<'a> {
    pub graph: &'a ContentGraph,
    pub options: &'a PlanOptions,
    pub resolver: &'a Resolver<'a>,
    pub date_format: DateFormat,
}

impl ManifestBuilder<'_> {
    pub fn build(&self, title: &str, routes: Vec<RouteDescriptor>) -> Manifest {
        let records = Records {
            pages: by_slug(self.graph.pages.iter()),
            posts: by_slug(self.graph.posts.iter().map(|e| &e.node)),
        };
        let lister = Lister {
            resolver: self.resolver,
            category_path: &self.options.category_path,
            date_format: self.date_format,
        };

        Manifest {
            title: self.resolver.resolve_or_raw(title).into_owned(),
            routes: routes
                .into_iter()
                .map(|route| self.route(route, &records, &lister))
                .collect(),
        }
    }

    fn route(&self, route: RouteDescriptor, records: &Records, lister: &Lister) -> ManifestRoute {
        let mut out = ManifestRoute {
            route,
            pagination_links: None,
            entries: Vec::new(),
            record: None,
        };

        match &out.route.context {
            RouteContext::Listing {
                category: None,
                pagination,
            } => {
                let base = format!("/{}", self.options.blog_path.trim_matches('/'));
                out.pagination_links = PaginationLinks::for_context(&base, pagination);
                out.entries = lister.entries(self.graph.posts.iter().map(|e| &e.node), pagination);
            }
            RouteContext::Listing {
                category: Some(name),
                pagination,
            } => {
                let base = format!(
                    "/{}/{}",
                    self.options.category_path.trim_matches('/'),
                    slugify(name)
                );
                out.pagination_links = PaginationLinks::for_context(&base, pagination);
                if let Some(group) = self.graph.category(name) {
                    out.entries = lister.entries(&group.nodes, pagination);
                }
            }
            RouteContext::Page { slug } => {
                out.record = records.pages.get(slug.as_str()).map(|r| self.meta(r));
            }
            RouteContext::Post(nav) => {
                out.record = records.posts.get(nav.slug.as_str()).map(|r| self.meta(r));
            }
        }
        out
    }

    fn meta(&self, record: &ContentRecord) -> RecordMeta {
        RecordMeta {
            title: record
                .title
                .as_deref()
                .map(|t| self.resolver.resolve_or_raw(t).into_owned()),
            description: record
                .description
                .iter()
                .map(|p| self.resolver.resolve_or_raw(p).into_owned())
                .collect(),
            category: record.category.clone(),
            category_link: record
                .category
                .as_deref()
                .map(|c| slug::category_link(&self.options.category_path, c)),
            date: record
                .date
                .map(|d| Timestamp::new(d, record.updated, self.date_format)),
            time_to_read_minutes: record.time_to_read_minutes,
            show_toc: record.show_toc,
            toc: toc::extract(&record.body),
            content_file_path: record.content_file_path.clone(),
        }
    }
}

/// Records by slug. Pages and posts are kept apart since a page and a post
/// may share a slug; the route's context says which one it renders.
struct Records<'g> {
    pages: HashMap<&'g str, &'g ContentRecord>,
    posts: HashMap<&'g str, &'g ContentRecord>,
}

fn by_slug<'g>(
    records: impl Iterator<Item = &'g ContentRecord>,
) -> HashMap<&'g str, &'g ContentRecord> {
    records.filter_map(|r| Some((r.slug.as_deref()?, r))).collect()
}

/// Writes `manifest` as pretty-printed JSON to
/// `{output_directory}/routes.json`, creating the directory if needed.
/// Returns the path written.
pub fn write_manifest(manifest: &Manifest, output_directory: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_directory).map_err(|err| Error::CreateDir {
        path: output_directory.to_owned(),
        err,
    })?;
    let path = output_directory.join(MANIFEST_FILE);
    let mut w = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut w, manifest)?;
    w.write_all(b"\n")?;
    w.flush()?;
    info!(path = %path.display(), routes = manifest.routes.len(), "wrote manifest");
    Ok(path)
}

/// The result of a manifest-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error writing the manifest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the output directory can't be created.
    #[error("creating output directory `{}`: {err}", .path.display())]
    CreateDir { path: PathBuf, err: io::Error },

    /// Returned for errors serializing the manifest.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Returned for other I/O errors.
    #[error(transparent)]
    Io(#[from] io::Error),
}
