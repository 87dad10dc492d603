//! Loads the project configuration from `quire.yaml`.

use crate::merge::MergeContext;
use crate::pagination::PAGE_SIZE;
use crate::planner::PlanOptions;
use crate::reading_time::DEFAULT_WORDS_PER_MINUTE;
use crate::timestamp::DateFormat;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The name of the project file searched for by [`Config::from_directory`].
pub const PROJECT_FILE: &str = "quire.yaml";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(PAGE_SIZE)
    }
}

#[derive(Deserialize)]
struct WordsPerMinute(u32);
impl Default for WordsPerMinute {
    fn default() -> Self {
        WordsPerMinute(DEFAULT_WORDS_PER_MINUTE)
    }
}

fn default_blog_path() -> String {
    String::from("blog")
}

fn default_category_path() -> String {
    String::from("category")
}

#[derive(Deserialize)]
struct Project {
    #[serde(default)]
    title: String,

    #[serde(default)]
    page_size: PageSize,

    #[serde(default)]
    words_per_minute: WordsPerMinute,

    #[serde(default = "default_blog_path")]
    blog_path: String,

    #[serde(default = "default_category_path")]
    category_path: String,

    #[serde(default)]
    date_format: DateFormat,

    #[serde(default)]
    merge_fields: MergeContext,
}

pub struct Config {
    /// The directory containing `quire.yaml`.
    pub project_root: PathBuf,

    /// `{project_root}/content`, holding `posts/` and `pages/`.
    pub content_directory: PathBuf,

    /// Where the route manifest is written.
    pub output_directory: PathBuf,

    /// The site title. May contain merge fields.
    pub title: String,

    pub plan: PlanOptions,
    pub words_per_minute: u32,
    pub date_format: DateFormat,

    /// The fields available to every merge-field template.
    pub merge_fields: MergeContext,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for `quire.yaml` and
    /// loads the first one found. `output_directory` defaults to
    /// `{project_root}/public`.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            match Config::from_project_file(&path, output_directory) {
                Ok(config) => Ok(config),
                Err(e) => Err(anyhow!("Loading configuration: {:#}", e)),
            }
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(anyhow!(
                    "Could not find `{}` in any parent directory",
                    PROJECT_FILE
                )),
            }
        }
    }

    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let file = File::open(path)
            .with_context(|| format!("opening project file `{}`", path.display()))?;
        let project: Project = serde_yaml::from_reader(file)
            .with_context(|| format!("parsing project file `{}`", path.display()))?;
        match path.parent() {
            None => Err(anyhow!(
                "Can't get parent directory for provided project file path '{:?}'",
                path
            )),
            Some(project_root) => {
                debug!(path = %path.display(), "loaded project file");
                if project.page_size.0 == 0 {
                    return Err(anyhow!("`page_size` must be at least 1"));
                }
                Ok(Config {
                    project_root: project_root.to_owned(),
                    content_directory: project_root.join("content"),
                    output_directory: match output_directory {
                        Some(dir) => dir.to_owned(),
                        None => project_root.join("public"),
                    },
                    title: project.title,
                    plan: PlanOptions {
                        page_size: project.page_size.0,
                        blog_path: project.blog_path,
                        category_path: project.category_path,
                    },
                    words_per_minute: project.words_per_minute.0,
                    date_format: project.date_format,
                    merge_fields: project.merge_fields,
                })
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_testdata() -> Result<()> {
        let config = Config::from_directory(Path::new("./testdata/content/posts"), None)?;
        assert_eq!(Path::new("./testdata"), config.project_root);
        assert_eq!(Path::new("./testdata/content"), config.content_directory);
        assert_eq!(Path::new("./testdata/public"), config.output_directory);
        assert_eq!("Field Notes", config.title);
        assert_eq!(2, config.plan.page_size);
        assert_eq!("blog", config.plan.blog_path);
        assert_eq!(DEFAULT_WORDS_PER_MINUTE, config.words_per_minute);
        assert_eq!(Some("Ada"), config.merge_fields.get("firstName"));
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(PROJECT_FILE), "title: Empty\n")?;
        let out = dir.path().join("out");
        let config = Config::from_directory(dir.path(), Some(&out))?;
        assert_eq!(PlanOptions::default(), config.plan);
        assert_eq!(DateFormat::Long, config.date_format);
        assert_eq!(MergeContext::new(), config.merge_fields);
        assert_eq!(out, config.output_directory);
        Ok(())
    }

    #[test]
    fn test_overrides() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(
            dir.path().join(PROJECT_FILE),
            "page_size: 10\nwords_per_minute: 250\nblog_path: posts\ncategory_path: topics\ndate_format: short\n",
        )?;
        let config = Config::from_directory(dir.path(), None)?;
        assert_eq!(10, config.plan.page_size);
        assert_eq!(250, config.words_per_minute);
        assert_eq!("posts", config.plan.blog_path);
        assert_eq!("topics", config.plan.category_path);
        assert_eq!(DateFormat::Short, config.date_format);
        Ok(())
    }

    #[test]
    fn test_zero_page_size_rejected() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join(PROJECT_FILE), "page_size: 0\n")?;
        assert!(Config::from_directory(dir.path(), None).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = match Config::from_directory(dir.path(), None) {
            Err(err) => err,
            Ok(_) => return Err(anyhow!("expected an error")),
        };
        assert!(err.to_string().contains(PROJECT_FILE));
        Ok(())
    }

    #[test]
    fn test_unreadable_project_file_names_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(PROJECT_FILE);
        let err = match Config::from_project_file(&path, None) {
            Err(err) => err,
            Ok(_) => return Err(anyhow!("expected an error")),
        };
        assert!(err.to_string().starts_with("opening project file"));
        assert!(err.to_string().contains(PROJECT_FILE));
        Ok(())
    }

    #[test]
    fn test_malformed_project_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(PROJECT_FILE), "page_size: [not, a, number]\n")?;
        let err = match Config::from_directory(dir.path(), None) {
            Err(err) => err,
            Ok(_) => return Err(anyhow!("expected an error")),
        };
        assert!(err.to_string().starts_with("parsing project file"));
        Ok(())
    }
}
