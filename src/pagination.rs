//! Pagination arithmetic shared by the blog and category listings, and the
//! links a listing page shows to move between its pages.

use serde::Serialize;

/// The number of posts per listing page unless configured otherwise.
pub const PAGE_SIZE: usize = 5;

/// Where one listing page sits within its listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationContext {
    /// Posts per page.
    pub limit: usize,

    /// Posts before this page: `(current_page - 1) * limit`.
    pub skip: usize,

    /// `ceil(total / limit)`.
    pub page_count: usize,

    /// 1-indexed.
    pub current_page: usize,
}

/// The number of pages needed for `total` items at `limit` per page. An
/// empty listing has no pages.
pub fn page_count(total: usize, limit: usize) -> usize {
    match limit {
        0 => 0,
        _ => total.div_ceil(limit),
    }
}

/// One [`PaginationContext`] per page of a listing with `total` items.
pub fn paginate(total: usize, limit: usize) -> impl Iterator<Item = PaginationContext> {
    let page_count = page_count(total, limit);
    (0..page_count).map(move |i| PaginationContext {
        limit,
        skip: i * limit,
        page_count,
        current_page: i + 1,
    })
}

/// The path of page `current_page` of the listing rooted at `base_path`. The
/// first page is the bare base path and later pages get a numeric suffix
/// (`blog`, `blog/2`, `blog/3`, ...).
pub fn page_path(base_path: &str, current_page: usize) -> String {
    match current_page {
        0 | 1 => base_path.to_owned(),
        n => format!("{}/{}", base_path, n),
    }
}

/// A single pagination link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub text: String,
    pub href: String,

    /// Set on the numbered link for the page being viewed.
    pub active: bool,
}

/// The links rendered beneath a listing page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    /// Link to newer posts, absent on the first page.
    pub previous: Option<PageLink>,

    /// One link per page, in order.
    pub numbers: Vec<PageLink>,

    /// Link to older posts, absent on the last page.
    pub next: Option<PageLink>,
}

impl PaginationLinks {
    /// Builds the links for `current_page` of `total_pages`. Returns [`None`]
    /// when there is at most one page since there is nowhere to go.
    pub fn new(base_path: &str, current_page: usize, total_pages: usize) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }

        let previous = match current_page > 1 {
            false => None,
            true => Some(PageLink {
                text: String::from("Newer Posts"),
                href: page_path(base_path, current_page - 1),
                active: false,
            }),
        };

        let next = match current_page < total_pages {
            false => None,
            true => Some(PageLink {
                text: String::from("Older Posts"),
                href: page_path(base_path, current_page + 1),
                active: false,
            }),
        };

        let numbers = (1..=total_pages)
            .map(|n| PageLink {
                text: n.to_string(),
                href: page_path(base_path, n),
                active: n == current_page,
            })
            .collect();

        Some(PaginationLinks {
            previous,
            numbers,
            next,
        })
    }

    /// Convenience wrapper around [`PaginationLinks::new`] for a
    /// [`PaginationContext`].
    pub fn for_context(base_path: &str, context: &PaginationContext) -> Option<Self> {
        Self::new(base_path, context.current_page, context.page_count)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(0, page_count(0, 5));
        assert_eq!(1, page_count(1, 5));
        assert_eq!(1, page_count(5, 5));
        assert_eq!(2, page_count(6, 5));
        assert_eq!(3, page_count(12, 5));
        assert_eq!(0, page_count(12, 0));
    }

    #[test]
    fn test_page_count_near_usize_max() {
        assert_eq!(usize::MAX / 2 + 1, page_count(usize::MAX, 2));
        assert_eq!(1, page_count(usize::MAX, usize::MAX));
        assert_eq!(usize::MAX, page_count(usize::MAX, 1));
    }

    #[test]
    fn test_paginate_twelve_items() {
        let pages: Vec<_> = paginate(12, 5).collect();
        assert_eq!(3, pages.len());
        assert_eq!(vec![0, 5, 10], pages.iter().map(|p| p.skip).collect::<Vec<_>>());
        assert_eq!(
            vec![1, 2, 3],
            pages.iter().map(|p| p.current_page).collect::<Vec<_>>()
        );
        assert!(pages.iter().all(|p| p.page_count == 3 && p.limit == 5));
    }

    #[test]
    fn test_paginate_empty() {
        assert_eq!(0, paginate(0, 5).count());
    }

    #[test]
    fn test_page_path() {
        assert_eq!("blog", page_path("blog", 1));
        assert_eq!("blog/2", page_path("blog", 2));
        assert_eq!("blog/3", page_path("blog", 3));
    }

    #[test]
    fn test_links_single_page() {
        assert_eq!(None, PaginationLinks::new("/blog", 1, 1));
        assert_eq!(None, PaginationLinks::new("/blog", 1, 0));
    }

    #[test]
    fn test_links_first_page() {
        let links = PaginationLinks::new("/blog", 1, 3).unwrap();
        assert_eq!(None, links.previous);
        assert_eq!("/blog/2", links.next.unwrap().href);
        let hrefs: Vec<_> = links.numbers.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(vec!["/blog", "/blog/2", "/blog/3"], hrefs);
        assert!(links.numbers[0].active);
        assert!(!links.numbers[1].active);
    }

    #[test]
    fn test_links_second_page_previous_is_base() {
        let links = PaginationLinks::new("/blog", 2, 3).unwrap();
        assert_eq!("/blog", links.previous.unwrap().href);
        assert_eq!("/blog/3", links.next.unwrap().href);
    }

    #[test]
    fn test_links_last_page() {
        let links = PaginationLinks::new("/category/rust", 4, 4).unwrap();
        let previous = links.previous.unwrap();
        assert_eq!("/category/rust/3", previous.href);
        assert_eq!("Newer Posts", previous.text);
        assert_eq!(None, links.next);
        assert!(links.numbers[3].active);
    }
}
