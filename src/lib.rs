//! The library code for the `folio` blog. It holds the only structured part
//! of the site: the data contracts that page templates and the build
//! pipeline rely on. It breaks down into two pieces:
//!
//! 1. The site configuration registry ([`crate::config`]): the site's title,
//!    description and contact address, per-section metadata, and the social
//!    links shown in the footer. It is loaded once from `folio.yaml`,
//!    validated in full, and then passed by reference to whatever renders
//!    pages.
//! 2. The content entry schema ([`crate::content`]): the shape every blog
//!    post and project write-up must have. Raw front matter is validated into
//!    a [`content::ContentEntry`] or rejected with every failed field named.
//!
//! Around those sit the listing operations used by index pages
//! ([`crate::listing`]), strict date parsing ([`crate::date`]), reading
//! content files from disk ([`crate::source`]), and [`build::load_project`],
//! which does all of the above for a project directory.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod content;
pub mod date;
pub mod listing;
pub mod source;
