//! Defines the [`Site`] registry: the site identity, per-section metadata and
//! social links that every page template reads. A [`Site`] is built once from
//! a [`SiteDefinition`] (usually the project's `folio.yaml`), validated in
//! full, and then only ever borrowed.

use crate::content::ContentKind;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// The name of the project file that [`Site::from_directory`] looks for.
pub const PROJECT_FILE: &str = "folio.yaml";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ListingSize(pub usize);

impl Default for ListingSize {
    fn default() -> Self {
        ListingSize(3)
    }
}

/// The static, unvalidated form of the site configuration. This is what gets
/// deserialized from `folio.yaml`; [`Site::new`] turns it into a [`Site`].
///
/// ```yaml
/// title: Jane's Notes
/// description: Writing about systems and the odd side project.
/// contact_email: jane@example.com
/// posts_per_homepage: 5
/// projects_per_homepage: 3
/// sections:
///   home: { title: Home, description: Recent writing and projects. }
///   blog: { title: Blog, description: Long-form articles. }
///   projects: { title: Projects, description: Things I have built. }
/// socials:
///   - name: GitHub
///     url: https://github.com/jane
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct SiteDefinition {
    pub title: String,
    pub description: String,
    pub contact_email: String,

    #[serde(default)]
    pub posts_per_homepage: ListingSize,

    #[serde(default)]
    pub projects_per_homepage: ListingSize,

    pub sections: SectionDefinitions,

    #[serde(default)]
    pub socials: Vec<SocialDefinition>,

    /// Blog posts directory, relative to the project file.
    #[serde(default = "default_blog_directory")]
    pub blog_directory: PathBuf,

    /// Project write-ups directory, relative to the project file.
    #[serde(default = "default_projects_directory")]
    pub projects_directory: PathBuf,
}

fn default_blog_directory() -> PathBuf {
    PathBuf::from("content/blog")
}

fn default_projects_directory() -> PathBuf {
    PathBuf::from("content/projects")
}

#[derive(Clone, Debug, Deserialize)]
pub struct SectionDefinitions {
    pub home: SectionMetadata,
    pub blog: SectionMetadata,
    pub projects: SectionMetadata,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SocialDefinition {
    pub name: String,
    pub url: String,
}

/// A top-level logical grouping of pages. The set is closed, so looking up
/// the metadata for a section can never fail at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKey {
    Home,
    Blog,
    Projects,
}

impl SectionKey {
    pub const ALL: [SectionKey; 3] =
        [SectionKey::Home, SectionKey::Blog, SectionKey::Projects];

    pub fn name(self) -> &'static str {
        match self {
            SectionKey::Home => "home",
            SectionKey::Blog => "blog",
            SectionKey::Projects => "projects",
        }
    }

    /// The kind of content listed on the section's index page. The home
    /// section mixes both kinds and so has none of its own.
    pub fn content_kind(self) -> Option<ContentKind> {
        match self {
            SectionKey::Home => None,
            SectionKey::Blog => Some(ContentKind::BlogPost),
            SectionKey::Projects => Some(ContentKind::Project),
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SectionKey {
    type Err = UnknownSectionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        SectionKey::ALL
            .iter()
            .copied()
            .find(|key| key.name() == s)
            .ok_or_else(|| UnknownSectionError(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSectionError(pub String);

impl fmt::Display for UnknownSectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown section `{}` (expected one of: home, blog, projects)",
            self.0
        )
    }
}

impl std::error::Error for UnknownSectionError {}

/// Title and description for one section's pages.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SectionMetadata {
    pub title: String,
    pub description: String,
}

/// An outbound link shown in the site footer. Links are displayed in the
/// order they were configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SocialLink {
    pub display_name: String,
    pub url: Url,
}

/// A syntactically valid e-mail address. The address is always held in its
/// plain form; templates that want to deter scrapers call
/// [`ContactEmail::obfuscated`] when rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContactEmail(String);

impl ContactEmail {
    pub fn parse(address: &str) -> std::result::Result<ContactEmail, String> {
        if address.is_empty() {
            return Err("address is empty".to_owned());
        }
        if address.chars().any(char::is_whitespace) {
            return Err(format!("`{}` contains whitespace", address));
        }
        let mut parts = address.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => {
                return Err(format!(
                    "`{}` must contain exactly one `@`",
                    address
                ))
            }
        };
        if local.is_empty() {
            return Err(format!("`{}` has an empty local part", address));
        }
        let labels: Vec<&str> = domain.split('.').collect();
        let valid_domain = labels.len() >= 2
            && labels.iter().all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_alphanumeric() || c == '-')
            });
        if !valid_domain {
            return Err(format!("`{}` has an invalid domain", address));
        }
        Ok(ContactEmail(address.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the address as e.g. `jane [at] example [dot] com`.
    pub fn obfuscated(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) => format!(
                "{} [at] {}",
                local,
                domain.split('.').collect::<Vec<_>>().join(" [dot] ")
            ),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for ContactEmail {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Site-wide identity: the shared page chrome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SiteIdentity {
    /// Used in page headers and the browser tab.
    pub title: String,

    /// One-sentence summary used for SEO.
    pub description: String,

    pub contact_email: ContactEmail,

    /// Caps how many recent posts the landing page lists.
    pub posts_per_homepage: usize,

    /// Caps how many recent projects the landing page lists.
    pub projects_per_homepage: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Sections {
    home: SectionMetadata,
    blog: SectionMetadata,
    projects: SectionMetadata,
}

/// The validated, immutable site configuration. Build one with [`Site::new`]
/// (or one of the loaders) and pass it by reference to whatever renders
/// pages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Site {
    identity: SiteIdentity,
    sections: Sections,
    social_links: Vec<SocialLink>,
    blog_directory: PathBuf,
    projects_directory: PathBuf,
}

impl Site {
    /// Validates a [`SiteDefinition`]. Every problem in the definition is
    /// reported at once; no [`Site`] is produced unless all of them are
    /// fixed.
    pub fn new(definition: SiteDefinition) -> Result<Site> {
        let mut problems = Vec::new();

        require_text(&mut problems, "title", &definition.title);
        require_text(&mut problems, "description", &definition.description);
        let contact_email = match ContactEmail::parse(&definition.contact_email)
        {
            Ok(email) => Some(email),
            Err(message) => {
                problems.push(Problem::new("contact_email", message));
                None
            }
        };

        let sections = definition.sections;
        for (key, section) in [
            (SectionKey::Home, &sections.home),
            (SectionKey::Blog, &sections.blog),
            (SectionKey::Projects, &sections.projects),
        ]
        .iter()
        {
            require_text(
                &mut problems,
                &format!("sections.{}.title", key),
                &section.title,
            );
            require_text(
                &mut problems,
                &format!("sections.{}.description", key),
                &section.description,
            );
        }

        let social_links = social_links(&mut problems, definition.socials);

        match (contact_email, problems.is_empty()) {
            (Some(contact_email), true) => Ok(Site {
                identity: SiteIdentity {
                    title: definition.title,
                    description: definition.description,
                    contact_email,
                    posts_per_homepage: definition.posts_per_homepage.0,
                    projects_per_homepage: definition.projects_per_homepage.0,
                },
                sections: Sections {
                    home: sections.home,
                    blog: sections.blog,
                    projects: sections.projects,
                },
                social_links,
                blog_directory: definition.blog_directory,
                projects_directory: definition.projects_directory,
            }),
            _ => Err(Error::Invalid(problems)),
        }
    }

    /// Deserializes and validates a YAML site definition.
    pub fn from_yaml_str(input: &str) -> Result<Site> {
        Site::new(serde_yaml::from_str(input)?)
    }

    /// Loads the project file at `path`. Content directories in the result
    /// are resolved against the project file's directory.
    pub fn from_project_file(path: &Path) -> Result<Site> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let definition: SiteDefinition = serde_yaml::from_reader(file)
            .map_err(|e| {
                Error::Annotated(
                    format!("loading `{}`", path.display()),
                    Box::new(Error::from(e)),
                )
            })?;
        let mut site = Site::new(definition).map_err(|e| {
            Error::Annotated(
                format!("validating `{}`", path.display()),
                Box::new(e),
            )
        })?;

        let project_root = path.parent().unwrap_or_else(|| Path::new("."));
        site.blog_directory = project_root.join(&site.blog_directory);
        site.projects_directory = project_root.join(&site.projects_directory);
        tracing::debug!(path = %path.display(), "loaded site configuration");
        Ok(site)
    }

    /// Searches `dir` and each of its ancestors for [`PROJECT_FILE`] and loads
    /// the first one found. A relative `dir` is resolved against the current
    /// directory first, so `.` finds a project file above it.
    pub fn from_directory(dir: &Path) -> Result<Site> {
        let resolved =
            std::fs::canonicalize(dir).map_err(|err| Error::Resolve {
                path: dir.to_owned(),
                err,
            })?;
        for candidate in resolved.ancestors() {
            let path = candidate.join(PROJECT_FILE);
            tracing::trace!(path = %path.display(), "looking for project file");
            if path.is_file() {
                return Site::from_project_file(&path);
            }
        }
        Err(Error::NotFound(dir.to_owned()))
    }

    pub fn identity(&self) -> &SiteIdentity {
        &self.identity
    }

    pub fn section(&self, key: SectionKey) -> &SectionMetadata {
        match key {
            SectionKey::Home => &self.sections.home,
            SectionKey::Blog => &self.sections.blog,
            SectionKey::Projects => &self.sections.projects,
        }
    }

    /// The social links in display order.
    pub fn social_links(&self) -> &[SocialLink] {
        &self.social_links
    }

    /// The directory holding source files for `kind`.
    pub fn content_directory(&self, kind: ContentKind) -> &Path {
        match kind {
            ContentKind::BlogPost => &self.blog_directory,
            ContentKind::Project => &self.projects_directory,
        }
    }
}

/// Whether `url` is something a browser can follow: an `http` or `https`
/// URL. `Url::parse` reads `localhost:8080` as scheme `localhost`, so
/// parsing alone isn't enough.
pub fn is_web_url(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

fn require_text(problems: &mut Vec<Problem>, field: &str, value: &str) {
    if value.trim().is_empty() {
        problems.push(Problem::new(field, "must not be empty"));
    }
}

fn social_links(
    problems: &mut Vec<Problem>,
    socials: Vec<SocialDefinition>,
) -> Vec<SocialLink> {
    let mut links = Vec::with_capacity(socials.len());
    let mut seen: HashMap<Url, usize> = HashMap::new();

    for (i, social) in socials.into_iter().enumerate() {
        require_text(problems, &format!("socials[{}].name", i), &social.name);
        let field = format!("socials[{}].url", i);
        match Url::parse(social.url.trim()) {
            Err(e) => problems.push(Problem::new(
                &field,
                format!("`{}` is not an absolute URL: {}", social.url, e),
            )),
            Ok(url) if !is_web_url(&url) => problems.push(Problem::new(
                &field,
                format!(
                    "`{}` must use http or https, not `{}`",
                    social.url,
                    url.scheme()
                ),
            )),
            Ok(url) => match seen.get(&url) {
                Some(first) => problems.push(Problem::new(
                    &field,
                    format!("`{}` duplicates socials[{}]", url, first),
                )),
                None => {
                    seen.insert(url.clone(), i);
                    links.push(SocialLink {
                        display_name: social.name,
                        url,
                    });
                }
            },
        }
    }

    links
}

/// A single defect in a [`SiteDefinition`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Dotted path to the offending field, e.g. `sections.blog.title`.
    pub field: String,
    pub message: String,
}

impl Problem {
    fn new(field: &str, message: impl Into<String>) -> Problem {
        Problem {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The result of a fallible configuration operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a malformed or incomplete site configuration. Any of these is
/// fatal to a build.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or any ancestor.
    NotFound(PathBuf),

    /// Returned when the directory to search from can't be resolved (e.g.,
    /// it doesn't exist).
    Resolve { path: PathBuf, err: std::io::Error },

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't a well-formed definition (bad
    /// YAML, a missing field, a negative listing size).
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the definition parsed but failed validation.
    Invalid(Vec<Problem>),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl Error {
    /// The validation problems behind this error, if it is (or wraps) an
    /// [`Error::Invalid`].
    pub fn problems(&self) -> &[Problem] {
        match self {
            Error::Invalid(problems) => problems,
            Error::Annotated(_, err) => err.problems(),
            _ => &[],
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound(dir) => write!(
                f,
                "could not find `{}` in `{}` or any parent directory",
                PROJECT_FILE,
                dir.display()
            ),
            Error::Resolve { path, err } => {
                write!(f, "resolving directory `{}`: {}", path.display(), err)
            }
            Error::Open { path, err } => {
                write!(f, "opening project file `{}`: {}", path.display(), err)
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Invalid(problems) => {
                write!(f, "invalid site configuration")?;
                for problem in problems {
                    write!(f, "\n  {}", problem)?;
                }
                Ok(())
            }
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound(_) => None,
            Error::Resolve { path: _, err } => Some(err),
            Error::Open { path: _, err } => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::Invalid(_) => None,
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SITE: &str = r#"
title: Jane's Notes
description: Writing about systems and the odd side project.
contact_email: jane@example.com
posts_per_homepage: 5
projects_per_homepage: 2
sections:
  home:
    title: Home
    description: Recent writing and projects.
  blog:
    title: Blog
    description: Long-form articles.
  projects:
    title: Projects
    description: Things I have built.
socials:
  - name: GitHub
    url: https://github.com/jane
  - name: Mastodon
    url: https://hachyderm.io/@jane
"#;

    fn definition() -> SiteDefinition {
        serde_yaml::from_str(SITE).unwrap()
    }

    #[test]
    fn test_identity_matches_definition() -> Result<()> {
        let site = Site::from_yaml_str(SITE)?;
        let wanted = SiteIdentity {
            title: "Jane's Notes".to_owned(),
            description: "Writing about systems and the odd side project."
                .to_owned(),
            contact_email: ContactEmail::parse("jane@example.com").unwrap(),
            posts_per_homepage: 5,
            projects_per_homepage: 2,
        };
        assert_eq!(&wanted, site.identity());
        assert_eq!(site.identity(), site.identity());
        Ok(())
    }

    #[test]
    fn test_sections() -> Result<()> {
        let site = Site::from_yaml_str(SITE)?;
        assert_eq!(site.section(SectionKey::Home).title, "Home");
        assert_eq!(site.section(SectionKey::Blog).title, "Blog");
        assert_eq!(
            site.section(SectionKey::Projects).description,
            "Things I have built."
        );
        Ok(())
    }

    #[test]
    fn test_social_links_keep_order() -> Result<()> {
        let site = Site::from_yaml_str(SITE)?;
        let names: Vec<&str> = site
            .social_links()
            .iter()
            .map(|l| l.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["GitHub", "Mastodon"]);
        assert_eq!(
            site.social_links()[1].url.as_str(),
            "https://hachyderm.io/@jane"
        );
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let input = r#"
title: T
description: D
contact_email: a@b.io
sections:
  home: { title: H, description: h }
  blog: { title: B, description: b }
  projects: { title: P, description: p }
"#;
        let site = Site::from_yaml_str(input)?;
        assert_eq!(site.identity().posts_per_homepage, 3);
        assert_eq!(site.identity().projects_per_homepage, 3);
        assert!(site.social_links().is_empty());
        assert_eq!(
            site.content_directory(ContentKind::BlogPost),
            Path::new("content/blog")
        );
        Ok(())
    }

    #[test]
    fn test_malformed_social_url_fails() {
        let mut def = definition();
        def.socials.push(SocialDefinition {
            name: "Blog".to_owned(),
            url: "/relative/path".to_owned(),
        });
        match Site::new(def) {
            Err(Error::Invalid(problems)) => {
                assert_eq!(problems.len(), 1);
                assert_eq!(problems[0].field, "socials[2].url");
            }
            other => panic!("wanted Error::Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_social_missing_url_fails() {
        let input = SITE.replace("    url: https://github.com/jane\n", "");
        match Site::from_yaml_str(&input) {
            Err(Error::DeserializeYaml(err)) => {
                assert!(err.to_string().contains("url"))
            }
            other => panic!("wanted Error::DeserializeYaml, got {:?}", other),
        }
    }

    #[test]
    fn test_social_url_must_be_web_url() {
        let mut def = definition();
        def.socials.push(SocialDefinition {
            name: "Local".to_owned(),
            url: "localhost:8080/demo".to_owned(),
        });
        def.socials.push(SocialDefinition {
            name: "Mail".to_owned(),
            url: "mailto:jane@example.com".to_owned(),
        });
        let err = Site::new(def).unwrap_err();
        let fields: Vec<&str> =
            err.problems().iter().map(|p| p.field.as_str()).collect();
        assert_eq!(fields, vec!["socials[2].url", "socials[3].url"]);
        assert!(err.problems()[0].message.contains("`localhost`"));
    }

    #[test]
    fn test_from_directory_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            Site::from_directory(&root.path().join("nope")),
            Err(Error::Resolve { .. })
        ));
    }

    #[test]
    fn test_duplicate_social_url_fails() {
        let mut def = definition();
        def.socials.push(SocialDefinition {
            name: "GitHub again".to_owned(),
            url: "https://github.com/jane".to_owned(),
        });
        let err = Site::new(def).unwrap_err();
        assert_eq!(err.problems().len(), 1);
        assert!(err.problems()[0].message.contains("socials[0]"));
    }

    #[test]
    fn test_reports_every_problem() {
        let mut def = definition();
        def.title = "  ".to_owned();
        def.sections.blog.description = String::new();
        def.contact_email = "jane [at] example [dot] com".to_owned();
        let fields: Vec<String> = Site::new(def)
            .unwrap_err()
            .problems()
            .iter()
            .map(|p| p.field.clone())
            .collect();
        assert_eq!(
            fields,
            vec!["title", "contact_email", "sections.blog.description"]
        );
    }

    #[test]
    fn test_negative_listing_size_fails() {
        let input =
            SITE.replace("posts_per_homepage: 5", "posts_per_homepage: -1");
        assert!(matches!(
            Site::from_yaml_str(&input),
            Err(Error::DeserializeYaml(_))
        ));
    }

    #[test]
    fn test_contact_email() {
        let email = ContactEmail::parse("jane.doe@mail.example.com").unwrap();
        assert_eq!(email.as_str(), "jane.doe@mail.example.com");
        assert_eq!(
            email.obfuscated(),
            "jane.doe [at] mail [dot] example [dot] com"
        );

        let invalid = [
            "",
            "jane",
            "jane@",
            "@example.com",
            "a@b@c.com",
            "a@localhost",
            "a b@c.com",
        ];
        for bad in invalid.iter() {
            assert!(ContactEmail::parse(bad).is_err(), "accepted `{}`", bad);
        }
    }

    #[test]
    fn test_section_key_round_trip() {
        for key in SectionKey::ALL.iter() {
            assert_eq!(key.name().parse::<SectionKey>(), Ok(*key));
        }
        assert!("about".parse::<SectionKey>().is_err());
        assert_eq!(
            SectionKey::Blog.content_kind(),
            Some(ContentKind::BlogPost)
        );
        assert_eq!(SectionKey::Home.content_kind(), None);
    }

    #[test]
    fn test_from_directory_searches_ancestors() -> Result<()> {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(PROJECT_FILE), SITE).unwrap();
        let nested = root.path().join("content/blog");
        std::fs::create_dir_all(&nested).unwrap();

        let site = Site::from_directory(&nested)?;
        assert_eq!(site.identity().title, "Jane's Notes");
        let root = std::fs::canonicalize(root.path()).unwrap();
        assert_eq!(
            site.content_directory(ContentKind::Project),
            root.join("content/projects")
        );
        Ok(())
    }

    #[test]
    fn test_from_directory_not_found() {
        let root = tempfile::tempdir().unwrap();
        // Temp dirs normally have no `folio.yaml` above them; guard anyway.
        if root.path().ancestors().any(|a| a.join(PROJECT_FILE).is_file()) {
            return;
        }
        assert!(matches!(
            Site::from_directory(root.path()),
            Err(Error::NotFound(_))
        ));
    }
}
