//! Plans the site's routes from a [`ContentGraph`]. Each route is a
//! [`RouteDescriptor`]: the path it is served at, the [`Template`] that renders
//! it, and the [`RouteContext`] the template needs.
//!
//! Four groups of routes are planned, in this order:
//!
//! 1. The blog listing, paginated over all posts
//! 2. One paginated listing per named category
//! 3. One route per page
//! 4. One route per post, with links to its neighbours
//!
//! Planning is a pure function of the graph and the [`PlanOptions`].

use crate::pagination::{self, PaginationContext, PAGE_SIZE};
use crate::parser::{ContentQueryError, QueryResult};
use crate::record::{ContentGraph, NeighborRef};
use crate::slug::slugify;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The template a route is rendered with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Blog,
    Category,
    Page,
    Post,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Blog => "blog",
            Template::Category => "category",
            Template::Page => "page",
            Template::Post => "post",
        }
    }
}

/// A link to a neighbouring post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NavLink {
    pub slug: String,

    /// The neighbour's title, if it has one. Templates fall back to
    /// "Previous"/"Next".
    pub title: Option<String>,
}

impl NavLink {
    /// Only neighbours with a slug can be linked to.
    fn from_neighbor(neighbor: &Option<NeighborRef>) -> Option<NavLink> {
        let neighbor = neighbor.as_ref()?;
        Some(NavLink {
            slug: neighbor.slug.clone()?,
            title: neighbor.title.clone(),
        })
    }
}

/// The navigation context of a post route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostNavContext {
    pub slug: String,

    /// The next-older post.
    pub previous: Option<NavLink>,

    /// The next-newer post.
    pub next: Option<NavLink>,
}

/// The data handed to a route's template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RouteContext {
    /// A page of the blog listing or of a category listing. `category` is
    /// the category's display name and is only set for category listings.
    Listing {
        #[serde(skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(flatten)]
        pagination: PaginationContext,
    },

    /// A standalone page.
    Page { slug: String },

    /// A post.
    Post(PostNavContext),
}

/// A planned route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RouteDescriptor {
    pub path: String,
    pub template: Template,
    pub context: RouteContext,
}

/// Knobs for [`plan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanOptions {
    /// Posts per listing page.
    pub page_size: usize,

    /// The path of the first blog listing page.
    pub blog_path: String,

    /// The prefix for category listing paths.
    pub category_path: String,
}

impl Default for PlanOptions {
    fn default() -> Self {
        PlanOptions {
            page_size: PAGE_SIZE,
            blog_path: String::from("blog"),
            category_path: String::from("category"),
        }
    }
}

/// The alias every page whose slug mentions `home` is served at.
const HOME_PATH: &str = "/";

/// Plans all routes for `graph`. Records without a slug and categories without
/// a name are skipped. When two routes share a path, the later one replaces
/// the earlier one in place.
pub fn plan(graph: &ContentGraph, options: &PlanOptions) -> Vec<RouteDescriptor> {
    let mut routes = Routes::default();

    for pagination in pagination::paginate(graph.total_count(), options.page_size) {
        routes.insert(RouteDescriptor {
            path: pagination::page_path(&options.blog_path, pagination.current_page),
            template: Template::Blog,
            context: RouteContext::Listing {
                category: None,
                pagination,
            },
        });
    }

    for group in &graph.categories {
        let name = match group.field_value.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => continue,
        };
        let base = format!("{}/{}", options.category_path, slugify(name));
        for pagination in pagination::paginate(group.total_count, options.page_size) {
            routes.insert(RouteDescriptor {
                path: pagination::page_path(&base, pagination.current_page),
                template: Template::Category,
                context: RouteContext::Listing {
                    category: Some(name.to_owned()),
                    pagination,
                },
            });
        }
    }

    for page in &graph.pages {
        let slug = match &page.slug {
            Some(slug) => slug,
            None => {
                debug!(id = %page.id, "skipping page without a slug");
                continue;
            }
        };
        routes.insert(RouteDescriptor {
            path: match slug.contains("home") {
                true => HOME_PATH.to_owned(),
                false => slug.clone(),
            },
            template: Template::Page,
            context: RouteContext::Page { slug: slug.clone() },
        });
    }

    for edge in &graph.posts {
        let slug = match &edge.node.slug {
            Some(slug) => slug,
            None => {
                debug!(id = %edge.node.id, "skipping post without a slug");
                continue;
            }
        };
        routes.insert(RouteDescriptor {
            path: slug.clone(),
            template: Template::Post,
            context: RouteContext::Post(PostNavContext {
                slug: slug.clone(),
                previous: NavLink::from_neighbor(&edge.previous),
                next: NavLink::from_neighbor(&edge.next),
            }),
        });
    }

    let routes = routes.into_vec();
    info!(routes = routes.len(), "planned routes");
    routes
}

/// Plans routes for the result of a content query. Any query error aborts
/// planning: either every route is returned or none is.
pub fn plan_query(result: QueryResult, options: &PlanOptions) -> Result<Vec<RouteDescriptor>> {
    let graph = result.into_graph()?;
    Ok(plan(&graph, options))
}

/// Planned routes in insertion order, keyed by path.
#[derive(Default)]
struct Routes {
    routes: Vec<RouteDescriptor>,
    by_path: HashMap<String, usize>,
}

impl Routes {
    fn insert(&mut self, route: RouteDescriptor) {
        match self.by_path.get(&route.path) {
            Some(&i) => {
                warn!(
                    path = %route.path,
                    replaced = self.routes[i].template.name(),
                    by = route.template.name(),
                    "route path collision; keeping the later route"
                );
                self.routes[i] = route;
            }
            None => {
                self.by_path.insert(route.path.clone(), self.routes.len());
                self.routes.push(route);
            }
        }
    }

    fn into_vec(self) -> Vec<RouteDescriptor> {
        self.routes
    }
}

/// The result of a planning operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a planning failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when the content query reported errors.
    #[error(transparent)]
    ContentQuery(#[from] ContentQueryError),
}
