//! Builds the entries shown on one page of a listing: the window of posts
//! selected by a [`PaginationContext`], each reduced to a [`ListingEntry`].

use crate::merge::Resolver;
use crate::pagination::PaginationContext;
use crate::record::ContentRecord;
use crate::slug;
use crate::timestamp::{DateFormat, Timestamp};
use serde::Serialize;

/// The maximum number of characters in an excerpt, before the ellipsis.
pub const EXCERPT_LENGTH: usize = 140;

const ELLIPSIS: &str = "&hellip;";

/// A post as summarized on a listing page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    pub id: String,
    pub slug: String,
    pub title: Option<String>,
    pub category: Option<String>,
    pub category_link: Option<String>,
    pub date: Option<Timestamp>,
    pub time_to_read_minutes: u32,
    pub excerpt: String,
}

/// Summarizes listing pages.
pub struct Lister<'a> {
    /// Resolves merge fields in titles and descriptions.
    pub resolver: &'a Resolver<'a>,

    /// The prefix for category listing paths, for category links.
    pub category_path: &'a str,

    pub date_format: DateFormat,
}

impl Lister<'_> {
    /// Summarizes the records of `posts` that fall on the page described by
    /// `pagination`. `posts` must be in listing order. Records without a slug
    /// take up their slot but produce no entry since there is nothing to
    /// link to.
    pub fn entries<'r>(
        &self,
        posts: impl IntoIterator<Item = &'r ContentRecord>,
        pagination: &PaginationContext,
    ) -> Vec<ListingEntry> {
        posts
            .into_iter()
            .skip(pagination.skip)
            .take(pagination.limit)
            .filter_map(|record| self.entry(record))
            .collect()
    }

    fn entry(&self, record: &ContentRecord) -> Option<ListingEntry> {
        Some(ListingEntry {
            id: record.id.clone(),
            slug: record.slug.clone()?,
            title: record
                .title
                .as_deref()
                .map(|t| self.resolver.resolve_or_raw(t).into_owned()),
            category: record.category.clone(),
            category_link: record
                .category
                .as_deref()
                .map(|c| slug::category_link(self.category_path, c)),
            date: record
                .date
                .map(|d| Timestamp::new(d, record.updated, self.date_format)),
            time_to_read_minutes: record.time_to_read_minutes,
            excerpt: self.excerpt(record),
        })
    }

    /// The description paragraphs joined and cut to [`EXCERPT_LENGTH`]
    /// characters, or the start of the body when there is no description.
    pub fn excerpt(&self, record: &ContentRecord) -> String {
        match record.description.is_empty() {
            false => {
                let joined = record.description.join("");
                let description = self.resolver.resolve_or_raw(&joined);
                format!("{}{}", truncate(&description).trim(), ELLIPSIS)
            }
            true => {
                let body = record.body.split_whitespace().collect::<Vec<_>>().join(" ");
                let excerpt = truncate(&body).trim();
                match excerpt.len() < body.len() {
                    true => format!("{}{}", excerpt, ELLIPSIS),
                    false => excerpt.to_owned(),
                }
            }
        }
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_LENGTH) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::merge::MergeContext;
    use crate::pagination::paginate;
    use crate::record::test::post;
    use crate::record::ContentGraph;

    fn with_lister<T>(f: impl FnOnce(&Lister) -> T) -> T {
        let context: MergeContext = [("site", "Field Notes")].into_iter().collect();
        let resolver = Resolver::new(&context);
        let lister = Lister {
            resolver: &resolver,
            category_path: "category",
            date_format: DateFormat::Long,
        };
        f(&lister)
    }

    #[test]
    fn test_entries_window() {
        let posts: Vec<_> = (1..=7)
            .map(|i| post(&format!("p{}", i), &format!("2020-01-0{}", i), None))
            .collect();
        let graph = ContentGraph::new(posts, Vec::new());
        let pages: Vec<_> = paginate(graph.total_count(), 5).collect();

        with_lister(|lister| {
            let nodes = || graph.posts.iter().map(|e| &e.node);
            let first = lister.entries(nodes(), &pages[0]);
            let second = lister.entries(nodes(), &pages[1]);
            assert_eq!(5, first.len());
            assert_eq!("/p7/", first[0].slug);
            assert_eq!(
                vec!["/p2/", "/p1/"],
                second.iter().map(|e| e.slug.as_str()).collect::<Vec<_>>()
            );
        });
    }

    #[test]
    fn test_entry_fields() {
        let mut record = post("tips", "2021-04-16", Some("Front End"));
        record.title = Some(String::from("Tips for {{site}}"));
        with_lister(|lister| {
            let entry = lister.entry(&record).unwrap();
            assert_eq!(Some(String::from("Tips for Field Notes")), entry.title);
            assert_eq!(Some(String::from("/category/frontend")), entry.category_link);
            assert_eq!("April 16, 2021", entry.date.unwrap().display);
        });
    }

    #[test]
    fn test_entry_without_slug() {
        let mut record = post("hidden", "2021-04-16", None);
        record.slug = None;
        with_lister(|lister| assert_eq!(None, lister.entry(&record)));
    }

    #[test]
    fn test_excerpt_from_description() {
        let mut record = post("a", "2021-01-01", None);
        record.description = vec![String::from("About {{site}}. "), String::from("More.")];
        with_lister(|lister| {
            assert_eq!("About Field Notes. More.&hellip;", lister.excerpt(&record));
        });
    }

    #[test]
    fn test_excerpt_truncates_description() {
        let mut record = post("a", "2021-01-01", None);
        record.description = vec!["é".repeat(200)];
        with_lister(|lister| {
            let excerpt = lister.excerpt(&record);
            assert_eq!(format!("{}&hellip;", "é".repeat(140)), excerpt);
        });
    }

    #[test]
    fn test_excerpt_from_body() {
        let mut record = post("a", "2021-01-01", None);
        record.body = String::from("Short\n\nbody.");
        with_lister(|lister| assert_eq!("Short body.", lister.excerpt(&record)));

        record.body = "word ".repeat(100);
        with_lister(|lister| {
            let excerpt = lister.excerpt(&record);
            assert!(excerpt.ends_with("&hellip;"));
            assert!(excerpt.len() <= EXCERPT_LENGTH + ELLIPSIS.len());
        });
    }
}
