//! Exports the [`build_site`] function which stitches together the high-level
//! steps of a build: loading content ([`crate::parser`]), planning routes
//! ([`crate::planner`]), and writing the route manifest
//! ([`crate::manifest`]).

use crate::config::Config;
use crate::manifest::{self, ManifestBuilder};
use crate::merge::Resolver;
use crate::parser::Parser;
use crate::planner::{self, RouteDescriptor};
use crate::record::ContentGraph;
use std::path::PathBuf;
use tracing::info;

/// What a successful build produced.
#[derive(Debug)]
pub struct BuildSummary {
    pub manifest_path: PathBuf,
    pub routes: usize,
}

/// Loads the content under [`Config::content_directory`] and plans its
/// routes. Any content error aborts the plan.
pub fn plan_site(config: &Config) -> Result<(ContentGraph, Vec<RouteDescriptor>)> {
    let result = Parser::new(config.words_per_minute).parse_content(&config.content_directory);
    let graph = result.into_graph().map_err(planner::Error::from)?;
    let routes = planner::plan(&graph, &config.plan);
    Ok((graph, routes))
}

/// Builds the site from a [`Config`] object: plans the routes and writes them,
/// with their rendering data, to `{output_directory}/routes.json`.
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    info!(project = %config.project_root.display(), "building site");
    let (graph, routes) = plan_site(config)?;
    let resolver = Resolver::new(&config.merge_fields);
    let manifest = ManifestBuilder {
        graph: &graph,
        options: &config.plan,
        resolver: &resolver,
        date_format: config.date_format,
    }
    .build(&config.title, routes);

    let manifest_path = manifest::write_manifest(&manifest, &config.output_directory)?;
    Ok(BuildSummary {
        manifest_path,
        routes: manifest.routes.len(),
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when content couldn't be loaded and planned.
    #[error(transparent)]
    Plan(#[from] planner::Error),

    /// Returned for errors writing the manifest.
    #[error(transparent)]
    Manifest(#[from] manifest::Error),
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::planner::Template;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_plan_testdata() -> anyhow::Result<()> {
        let config = Config::from_directory(Path::new("./testdata"), None)?;
        let (graph, routes) = plan_site(&config)?;
        assert_eq!(3, graph.total_count());

        let paths: Vec<_> = routes.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(
            vec![
                "blog",
                "blog/2",
                "category/frontenddev",
                "category/meta",
                "/about/",
                "/",
                "/bundled/",
                "/second-post/",
                "/hello-world/",
            ],
            paths
        );
        assert_eq!(Template::Page, routes[5].template);
        Ok(())
    }

    #[test]
    fn test_build_site() -> anyhow::Result<()> {
        let out = tempfile::tempdir()?;
        let config = Config::from_directory(Path::new("./testdata"), Some(out.path()))?;
        let summary = build_site(&config)?;
        assert_eq!(9, summary.routes);

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary.manifest_path)?)?;
        assert_eq!("Field Notes", manifest["title"]);
        let about = manifest["routes"]
            .as_array()
            .and_then(|routes| routes.iter().find(|r| r["path"] == "/about/"))
            .ok_or_else(|| anyhow::anyhow!("no /about/ route"))?;
        assert_eq!("Who writes Field Notes.", about["record"]["description"][0]);

        let second = manifest["routes"]
            .as_array()
            .and_then(|routes| routes.iter().find(|r| r["path"] == "/second-post/"))
            .ok_or_else(|| anyhow::anyhow!("no /second-post/ route"))?;
        assert_eq!(true, second["record"]["showToc"]);
        let toc = &second["record"]["toc"];
        assert_eq!(2, toc[0]["level"]);
        assert_eq!("Layout", toc[0]["title"]);
        assert_eq!("layout", toc[0]["id"]);
        assert_eq!("typography", toc[1]["id"]);
        Ok(())
    }

    #[test]
    fn test_build_fails_on_bad_content() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("quire.yaml"), "title: Broken\n")?;
        fs::create_dir_all(dir.path().join("content/posts"))?;
        fs::write(dir.path().join("content/posts/bad.md"), "no frontmatter")?;

        let config = Config::from_directory(dir.path(), None)?;
        assert!(matches!(build_site(&config), Err(Error::Plan(_))));
        assert!(!config.output_directory.exists());
        Ok(())
    }
}
