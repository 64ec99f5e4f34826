//! Ordering and filtering for listing pages. Everything here works on any
//! `T: AsRef<ContentEntry>`, so the same functions serve bare entries and
//! loaded [`crate::source::Document`]s.

use crate::config::Site;
use crate::content::ContentEntry;

/// Sorts entries newest first. The sort is stable: entries that share a date
/// keep their input order, so rebuilds produce the same listing.
pub fn sort_by_recency<T: AsRef<ContentEntry>>(mut entries: Vec<T>) -> Vec<T> {
    entries.sort_by(|a, b| b.as_ref().date.cmp(&a.as_ref().date));
    entries
}

/// Drops every draft, preserving the order of the rest.
pub fn filter_published<T: AsRef<ContentEntry>>(entries: Vec<T>) -> Vec<T> {
    entries
        .into_iter()
        .filter(|entry| entry.as_ref().is_published())
        .collect()
}

/// Keeps at most the first `n` entries.
pub fn take<T>(mut entries: Vec<T>, n: usize) -> Vec<T> {
    entries.truncate(n);
    entries
}

/// The public listing for a collection: published entries, newest first,
/// bounded to `n`.
pub fn listing<T: AsRef<ContentEntry>>(entries: Vec<T>, n: usize) -> Vec<T> {
    take(sort_by_recency(filter_published(entries)), n)
}

/// The two bounded lists shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Homepage<T> {
    pub posts: Vec<T>,
    pub projects: Vec<T>,
}

/// Builds the landing-page listings, each capped by the corresponding
/// [`crate::config::SiteIdentity`] setting.
pub fn homepage<T: AsRef<ContentEntry>>(
    site: &Site,
    posts: Vec<T>,
    projects: Vec<T>,
) -> Homepage<T> {
    let identity = site.identity();
    Homepage {
        posts: listing(posts, identity.posts_per_homepage),
        projects: listing(projects, identity.projects_per_homepage),
    }
}
