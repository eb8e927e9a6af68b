//! CMS-backed content sections.
//!
//! The blog and the help center are two instances of the same
//! [`ContentClient`], each pointed at its own CMS namespace. The client
//! turns slug and page requests into calls on a [`ContentSource`], caches
//! the answers, and hands back the local [`model`] types. Remote failures
//! never leave this module: listings degrade to empty pages and lookups
//! degrade to [`Lookup::NotFound`].

pub mod cache;
pub mod client;
pub mod model;
pub mod normalize;
pub mod source;

use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

pub use client::ContentClient;
pub use model::{Author, CollectionPage, ContentItem, Lookup, SearchOutcome, Term, TermPage};
pub use source::{CmsError, ContentSource, TaxonomyKind, WordPressSource};

/// A locale-independent content section of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Blog,
    HelpCenter,
}

impl Section {
    /// Both sections, in navigation order.
    pub const ALL: [Section; 2] = [Section::Blog, Section::HelpCenter];

    /// URL prefix the section is mounted under.
    pub fn base_path(self) -> &'static str {
        match self {
            Section::Blog => "/blog",
            Section::HelpCenter => "/help-center",
        }
    }

    /// Message key shown when a listing has no items.
    pub fn empty_message_key(self) -> &'static str {
        match self {
            Section::Blog => "content.no_posts",
            Section::HelpCenter => "content.no_articles",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Blog => write!(f, "blog"),
            Section::HelpCenter => write!(f, "help-center"),
        }
    }
}
