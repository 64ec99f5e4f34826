//! Defines [`ContentEntry`] and the [`validate`] function that turns a
//! content file's raw front matter into one. Validation is strict: fields
//! must have the right YAML type, dates must be canonical, and nothing is
//! ever defaulted except `draft`. Every failed field is reported, not just
//! the first.

use crate::config::is_web_url;
use crate::date::{parse_date, DateError};
use chrono::NaiveDate;
use serde_yaml::{Mapping, Value};
use std::fmt;
use url::Url;

/// Front-matter key names.
pub mod field {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const DATE: &str = "date";
    pub const DRAFT: &str = "draft";
    pub const DEMO_URL: &str = "demoURL";
    pub const REPO_URL: &str = "repoURL";
}

/// The two kinds of content the site publishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    BlogPost,
    Project,
}

impl ContentKind {
    pub fn name(self) -> &'static str {
        match self {
            ContentKind::BlogPost => "blog post",
            ContentKind::Project => "project",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The fields specific to each [`ContentKind`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryDetails {
    BlogPost,
    Project {
        demo_link: Option<Url>,
        repository_link: Option<Url>,
    },
}

/// A validated content entry. The body is not part of the entry; see
/// [`crate::source::Document`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentEntry {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub draft: bool,
    pub details: EntryDetails,
}

impl ContentEntry {
    pub fn kind(&self) -> ContentKind {
        match self.details {
            EntryDetails::BlogPost => ContentKind::BlogPost,
            EntryDetails::Project { .. } => ContentKind::Project,
        }
    }

    pub fn is_published(&self) -> bool {
        !self.draft
    }

    pub fn demo_link(&self) -> Option<&Url> {
        match &self.details {
            EntryDetails::Project { demo_link, .. } => demo_link.as_ref(),
            EntryDetails::BlogPost => None,
        }
    }

    pub fn repository_link(&self) -> Option<&Url> {
        match &self.details {
            EntryDetails::Project {
                repository_link, ..
            } => repository_link.as_ref(),
            EntryDetails::BlogPost => None,
        }
    }
}

impl AsRef<ContentEntry> for ContentEntry {
    fn as_ref(&self) -> &ContentEntry {
        self
    }
}

/// Validates raw front matter as an entry of the given `kind`. Keys the
/// schema doesn't know about are ignored, as are the project link keys on
/// blog posts.
///
/// This is a pure function of its arguments, so callers may validate many
/// files concurrently.
pub fn validate(
    kind: ContentKind,
    front_matter: &Mapping,
) -> Result<ContentEntry, SchemaViolation> {
    let mut violations = Vec::new();

    let title = required_text(front_matter, field::TITLE, &mut violations);
    let description =
        required_text(front_matter, field::DESCRIPTION, &mut violations);
    let date = required_text(front_matter, field::DATE, &mut violations)
        .and_then(|raw| match parse_date(&raw) {
            Ok(date) => Some(date),
            Err(e) => {
                violations.push(FieldViolation::new(
                    field::DATE,
                    ViolationKind::InvalidDate(e),
                ));
                None
            }
        });
    let draft = draft(front_matter, &mut violations);

    let details = match kind {
        ContentKind::BlogPost => Some(EntryDetails::BlogPost),
        ContentKind::Project => {
            let demo_link =
                optional_url(front_matter, field::DEMO_URL, &mut violations);
            let repository_link =
                optional_url(front_matter, field::REPO_URL, &mut violations);
            match (demo_link, repository_link) {
                (Ok(demo_link), Ok(repository_link)) => {
                    Some(EntryDetails::Project {
                        demo_link,
                        repository_link,
                    })
                }
                _ => None,
            }
        }
    };

    match (title, description, date, draft, details) {
        (Some(title), Some(description), Some(date), Some(draft), Some(details))
            if violations.is_empty() =>
        {
            Ok(ContentEntry {
                title,
                description,
                date,
                draft,
                details,
            })
        }
        _ => Err(SchemaViolation { kind, violations }),
    }
}

fn lookup<'a>(front_matter: &'a Mapping, key: &str) -> Option<&'a Value> {
    match front_matter.get(&Value::String(key.to_owned())) {
        None | Some(Value::Null) => None,
        Some(value) => Some(value),
    }
}

fn required_text(
    front_matter: &Mapping,
    key: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match lookup(front_matter, key) {
        None => {
            violations.push(FieldViolation::new(key, ViolationKind::Missing));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            violations.push(FieldViolation::new(key, ViolationKind::Empty));
            None
        }
        Some(Value::String(s)) => Some(s.trim().to_owned()),
        Some(other) => {
            violations.push(FieldViolation::wrong_type(key, "string", other));
            None
        }
    }
}

fn draft(
    front_matter: &Mapping,
    violations: &mut Vec<FieldViolation>,
) -> Option<bool> {
    match lookup(front_matter, field::DRAFT) {
        None => Some(false),
        Some(Value::Bool(draft)) => Some(*draft),
        Some(other) => {
            violations.push(FieldViolation::wrong_type(
                field::DRAFT,
                "boolean",
                other,
            ));
            None
        }
    }
}

// `Err(())` means a violation was recorded.
fn optional_url(
    front_matter: &Mapping,
    key: &'static str,
    violations: &mut Vec<FieldViolation>,
) -> Result<Option<Url>, ()> {
    let raw = match lookup(front_matter, key) {
        None => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => {
            violations.push(FieldViolation::new(key, ViolationKind::Empty));
            return Err(());
        }
        Some(Value::String(s)) => s.trim(),
        Some(other) => {
            violations.push(FieldViolation::wrong_type(key, "string", other));
            return Err(());
        }
    };
    let kind = match Url::parse(raw) {
        Ok(url) if is_web_url(&url) => return Ok(Some(url)),
        Ok(url) => ViolationKind::UnsupportedScheme(url.scheme().to_owned()),
        Err(e) => ViolationKind::InvalidUrl(e),
    };
    violations.push(FieldViolation::new(key, kind));
    Err(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
    }
}

/// What went wrong with a single front-matter field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// The required field is absent (or `null`).
    Missing,

    /// The field has the wrong YAML type.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },

    /// The field is a blank string.
    Empty,

    /// The date field isn't a canonical `YYYY-MM-DD` date.
    InvalidDate(DateError),

    /// A link field isn't an absolute URL.
    InvalidUrl(url::ParseError),

    /// A link field parsed, but not as an `http` or `https` URL.
    UnsupportedScheme(String),
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ViolationKind::Missing => write!(f, "missing"),
            ViolationKind::WrongType { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            ViolationKind::Empty => write!(f, "must not be empty"),
            ViolationKind::InvalidDate(err) => err.fmt(f),
            ViolationKind::UnsupportedScheme(scheme) => {
                write!(f, "must use http or https, not `{}`", scheme)
            }
            ViolationKind::InvalidUrl(err) => {
                write!(f, "not an absolute URL: {}", err)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub kind: ViolationKind,
}

impl FieldViolation {
    fn new(field: &'static str, kind: ViolationKind) -> FieldViolation {
        FieldViolation { field, kind }
    }

    fn wrong_type(
        field: &'static str,
        expected: &'static str,
        found: &Value,
    ) -> FieldViolation {
        FieldViolation::new(
            field,
            ViolationKind::WrongType {
                expected,
                found: type_name(found),
            },
        )
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`: {}", self.field, self.kind)
    }
}

/// Returned when front matter fails validation. Holds one
/// [`FieldViolation`] per failed field, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub kind: ContentKind,
    pub violations: Vec<FieldViolation>,
}

impl SchemaViolation {
    /// The names of the failed fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid {} front matter", self.kind)?;
        for violation in &self.violations {
            write!(f, "\n  {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaViolation {}
