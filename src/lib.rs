//! The library code for `quire`, the build-time core of a personal blog. The
//! architecture can be generally broken down into three distinct steps:
//!
//! 1. Loading posts and pages from source files on disk ([`crate::parser`])
//! 2. Planning the site's routes from the loaded content ([`crate::planner`])
//! 3. Writing the planned routes, with the data each page renders, to a JSON
//!    manifest ([`crate::manifest`])
//!
//! Of the three, the second step is the heart of it. Every post lands on a
//! paginated blog listing and, if it has a category, on a paginated category
//! listing; each listing page is described by a
//! [`pagination::PaginationContext`]. Pages and posts get one route each, and
//! post routes carry links to the neighbouring posts.
//!
//! Alongside sits the merge-field resolver ([`crate::merge`]), which
//! substitutes `{{field}}` references in titles and descriptions with values
//! from the project configuration.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod listing;
pub mod manifest;
pub mod merge;
pub mod pagination;
pub mod parser;
pub mod planner;
pub mod reading_time;
pub mod record;
pub mod slug;
pub mod timestamp;
pub mod toc;
