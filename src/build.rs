//! Exports the [`load_project`] function which stitches together the steps a
//! build performs before any page is rendered: locating and validating the
//! site configuration ([`crate::config`]) and loading the blog and project
//! collections ([`crate::source`]).

use crate::config::{Error as ConfigError, Site};
use crate::content::ContentKind;
use crate::source::{
    load_collection, Collection, Error as SourceError, Rejected,
};
use std::fmt;
use std::path::{Path, PathBuf};

/// A loaded site: its configuration plus both content collections.
#[derive(Debug)]
pub struct Project {
    pub site: Site,
    pub posts: Collection,
    pub projects: Collection,
}

impl Project {
    pub fn collection(&self, kind: ContentKind) -> &Collection {
        match kind {
            ContentKind::BlogPost => &self.posts,
            ContentKind::Project => &self.projects,
        }
    }

    /// Every file that failed to load, blog posts first.
    pub fn rejected(&self) -> impl Iterator<Item = &Rejected> {
        self.posts.rejected.iter().chain(self.projects.rejected.iter())
    }

    pub fn is_clean(&self) -> bool {
        self.posts.is_clean() && self.projects.is_clean()
    }
}

/// Loads the project whose `folio.yaml` is in `dir` or one of its ancestors.
/// A bad configuration is an error; bad content files are not, and are left
/// in each [`Collection::rejected`] for the caller to act on.
pub fn load_project(dir: &Path) -> Result<Project> {
    let site = Site::from_directory(dir)?;
    let posts = load(&site, ContentKind::BlogPost)?;
    let projects = load(&site, ContentKind::Project)?;
    tracing::info!(
        posts = posts.documents.len(),
        projects = projects.documents.len(),
        rejected = posts.rejected.len() + projects.rejected.len(),
        "loaded project"
    );
    Ok(Project {
        site,
        posts,
        projects,
    })
}

fn load(site: &Site, kind: ContentKind) -> Result<Collection> {
    let dir = site.content_directory(kind);
    load_collection(dir, kind).map_err(|err| Error::Source {
        dir: dir.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for loading a project.
#[derive(Debug)]
pub enum Error {
    /// Returned when the site configuration is missing or invalid.
    Config(ConfigError),

    /// Returned when a content directory couldn't be walked.
    Source { dir: PathBuf, err: SourceError },
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(err) => err.fmt(f),
            Error::Source { dir, err } => {
                write!(
                    f,
                    "Reading content directory '{}': {}",
                    dir.display(),
                    err
                )
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(err) => Some(err),
            Error::Source { dir: _, err } => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    /// Converts [`ConfigError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::SectionKey;
    use crate::listing::homepage;

    #[test]
    fn test_load_testdata() -> Result<()> {
        let project = load_project(Path::new("./testdata/site/content/blog"))?;
        assert_eq!(project.site.identity().title, "Field Notes");
        assert_eq!(project.site.section(SectionKey::Blog).title, "Writing");

        let rejected: Vec<PathBuf> = project
            .rejected()
            .map(|r| r.path.file_name().unwrap().into())
            .collect();
        assert_eq!(rejected, vec![PathBuf::from("us-date.md")]);
        assert!(!project.is_clean());

        let home = homepage(
            &project.site,
            project.posts.documents.iter().collect(),
            project.projects.documents.iter().collect(),
        );
        let posts: Vec<&str> =
            home.posts.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(posts, vec!["borrow-checker", "hello-world"]);
        let projects: Vec<&str> =
            home.projects.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(projects, vec!["tinyfeed"]);
        assert_eq!(
            project
                .collection(ContentKind::Project)
                .documents
                .iter()
                .find(|d| d.id == "tinyfeed")
                .and_then(|d| d.entry.repository_link())
                .map(|u| u.as_str()),
            Some("https://github.com/fieldnotes/tinyfeed")
        );
        Ok(())
    }

    #[test]
    fn test_missing_config() {
        let root = tempfile::tempdir().unwrap();
        if root
            .path()
            .ancestors()
            .any(|a| a.join(crate::config::PROJECT_FILE).is_file())
        {
            return;
        }
        assert!(matches!(
            load_project(root.path()),
            Err(Error::Config(ConfigError::NotFound(_)))
        ));
    }
}
