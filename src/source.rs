//! Reads content files from disk into [`Document`]s. A content file is a
//! YAML front-matter block between `---` fences followed by a body that this
//! crate carries around but never looks inside:
//!
//! ```md
//! ---
//! title: Hello, world!
//! description: A first post.
//! date: 2024-10-01
//! ---
//! # Hello
//!
//! World
//! ```
//!
//! Loading a collection never stops at the first bad file. Every file is
//! loaded independently and the failures are handed back alongside the
//! successes in a [`Collection`], so the caller decides whether one bad file
//! fails the build.

use crate::content::{validate, ContentEntry, ContentKind, SchemaViolation};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const MARKDOWN_EXTENSION: &str = "md";
const BUNDLE_INDEX: &str = "index.md";

/// A validated content entry together with where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// The slugified path of the source file relative to its content
    /// directory, less the extension (e.g., `rust/Hello World.md` becomes
    /// `rust/hello-world`). For a bundle (`name/index.md`) it is the bundle
    /// directory.
    pub id: String,

    pub source_path: PathBuf,

    pub entry: ContentEntry,

    /// Everything after the closing fence, untouched.
    pub body: String,
}

impl AsRef<ContentEntry> for Document {
    fn as_ref(&self) -> &ContentEntry {
        &self.entry
    }
}

/// A file that could not be loaded.
#[derive(Debug)]
pub struct Rejected {
    pub path: PathBuf,
    pub error: Error,
}

/// The outcome of loading one content directory.
#[derive(Debug, Default)]
pub struct Collection {
    /// Successfully loaded documents, in file-name order.
    pub documents: Vec<Document>,

    pub rejected: Vec<Rejected>,
}

impl Collection {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Splits a content file into its front matter and body.
pub fn split_front_matter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    // The closing fence must start a line.
    let rest = &input[FENCE.len()..];
    let offset = if rest.starts_with(FENCE) {
        0
    } else {
        match rest.find("\n---") {
            None => return Err(Error::FrontmatterMissingEndFence),
            Some(offset) => offset + 1,
        }
    };
    let yaml_start = FENCE.len();
    let yaml_stop = yaml_start + offset;
    let body_start = yaml_stop + FENCE.len();
    Ok((&input[yaml_start..yaml_stop], &input[body_start..]))
}

/// Parses and validates a single content file's text.
pub fn parse_document(
    kind: ContentKind,
    id: &str,
    source_path: &Path,
    input: &str,
) -> Result<Document> {
    let (yaml, body) = split_front_matter(input)?;
    let front_matter = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Null => Mapping::new(),
            Value::Mapping(mapping) => mapping,
            _ => return Err(Error::FrontmatterNotMapping),
        }
    };
    Ok(Document {
        id: id.to_owned(),
        source_path: source_path.to_owned(),
        entry: validate(kind, &front_matter)?,
        body: body.to_owned(),
    })
}

/// Derives a document id from a path relative to the content directory.
/// Returns `None` for paths that aren't valid UTF-8.
pub fn document_id(relative_path: &Path) -> Option<String> {
    let without_file = if relative_path.ends_with(BUNDLE_INDEX)
        && relative_path.components().count() > 1
    {
        relative_path.parent()?.to_owned()
    } else {
        relative_path.with_extension("")
    };
    let segments = without_file
        .components()
        .map(|c| c.as_os_str().to_str().map(slug::slugify))
        .collect::<Option<Vec<String>>>()?;
    Some(segments.join("/"))
}

/// Finds every content file under `dir`, sorted by path. A missing directory
/// holds no content.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        tracing::debug!(
            dir = %dir.display(),
            "content directory does not exist"
        );
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    let walk =
        WalkDir::new(dir).sort_by(|a, b| a.file_name().cmp(b.file_name()));
    for result in walk {
        let entry = result?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str())
                == Some(MARKDOWN_EXTENSION)
        {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Loads a single file. `dir` is the content directory `path` lives in.
pub fn load_document(
    kind: ContentKind,
    dir: &Path,
    path: &Path,
) -> Result<Document> {
    let relative_path = path.strip_prefix(dir).unwrap_or(path);
    let id = document_id(relative_path)
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;

    use std::io::Read;
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    parse_document(kind, &id, path, &contents)
}

/// Loads every content file under `dir` as `kind`. Only a failure to walk
/// the directory itself is an `Err`; per-file failures land in
/// [`Collection::rejected`].
pub fn load_collection(dir: &Path, kind: ContentKind) -> Result<Collection> {
    let mut collection = Collection::default();
    let mut ids: HashMap<String, PathBuf> = HashMap::new();

    for path in discover(dir)? {
        let loaded = load_document(kind, dir, &path).and_then(|document| {
            match ids.get(&document.id) {
                Some(first) => Err(Error::DuplicateId {
                    id: document.id,
                    first: first.clone(),
                }),
                None => {
                    ids.insert(document.id.clone(), path.clone());
                    Ok(document)
                }
            }
        });

        match loaded {
            Ok(document) => {
                tracing::debug!(
                    id = %document.id,
                    draft = document.entry.draft,
                    "loaded {}",
                    kind
                );
                collection.documents.push(document);
            }
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    "rejected {}: {}",
                    kind,
                    error
                );
                collection.rejected.push(Rejected { path, error });
            }
        }
    }

    Ok(collection)
}

/// Represents the result of loading content.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Document`].
#[derive(Debug)]
pub enum Error {
    /// Returned when a content file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a content file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the frontmatter is YAML but not a key/value mapping.
    FrontmatterNotMapping,

    /// Returned when the frontmatter fails schema validation.
    Schema(SchemaViolation),

    /// Returned when two files in one collection map to the same id.
    DuplicateId { id: String, first: PathBuf },

    /// Returned when a source path isn't valid UTF-8.
    InvalidFileName(PathBuf),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "content file must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::FrontmatterNotMapping => {
                write!(f, "front matter must be a mapping of keys to values")
            }
            Error::Schema(err) => err.fmt(f),
            Error::DuplicateId { id, first } => write!(
                f,
                "id `{}` is already used by `{}`",
                id,
                first.display()
            ),
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::FrontmatterNotMapping => None,
            Error::Schema(err) => Some(err),
            Error::DuplicateId { .. } => None,
            Error::InvalidFileName(_) => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
        }
    }
}

impl From<SchemaViolation> for Error {
    fn from(err: SchemaViolation) -> Error {
        Error::Schema(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for directory walks.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
