//! Slug derivation for content records and category names.

use std::path::Path;

/// Derives a record's slug from its path relative to the content root. The
/// slug is the last path segment without its extension, wrapped in slashes
/// (e.g., `posts/2021/hello-world.md` becomes `/hello-world/`). Bundles
/// (`foo/index.md`) take the name of their directory.
///
/// Returns [`None`] when no usable segment exists (an empty path, a bare
/// `index.md`, or a non-UTF-8 file name).
pub fn derive(relative_path: &Path) -> Option<String> {
    let stem = relative_path.file_stem()?.to_str()?;
    let segment = if stem == "index" {
        relative_path.parent()?.file_name()?.to_str()?
    } else {
        stem
    };
    match segment.is_empty() {
        true => None,
        false => Some(format!("/{}/", segment)),
    }
}

/// Converts a category name into a path segment by removing all whitespace
/// and lowercasing the rest, so `Front End Dev` and `front end dev` both
/// become `frontenddev`.
pub fn slugify(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// The link to a category's first listing page under `category_base`
/// (e.g., `/category/frontenddev`).
pub fn category_link(category_base: &str, name: &str) -> String {
    format!("/{}/{}", category_base.trim_matches('/'), slugify(name))
}
