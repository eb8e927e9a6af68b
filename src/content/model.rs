//! Local content schema.
//!
//! These types are what handlers and view models see. Nothing here knows
//! the CMS field names; see [`super::normalize`] for the adapter.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Name shown when the CMS does not expose an author.
pub const PLACEHOLDER_AUTHOR_NAME: &str = "Editorial Team";

/// Slug of the placeholder author.
pub const PLACEHOLDER_AUTHOR_SLUG: &str = "editorial-team";

/// The author of a content item. Always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Author {
    pub name: String,
    pub slug: String,
    pub avatar_url: Option<String>,
}

impl Author {
    /// Identity used when the CMS returns no usable author.
    pub fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_AUTHOR_NAME.to_string(),
            slug: PLACEHOLDER_AUTHOR_SLUG.to_string(),
            avatar_url: None,
        }
    }
}

/// A category or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Term {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    /// Number of items in the term, when the CMS reports it.
    pub count: Option<u64>,
}

/// A blog post or help-center article.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ContentItem {
    pub slug: String,
    pub title: String,
    /// Pre-rendered markup from the CMS, passed through untouched.
    pub body: String,
    pub excerpt: String,
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub categories: Vec<Term>,
    pub tags: Vec<Term>,
    pub author: Author,
    pub featured_image: Option<String>,
}

/// One window over a content collection.
///
/// Pages are 1-based. A page past `total_pages` carries no items but keeps
/// the true totals.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CollectionPage {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items: Vec<ContentItem>,
}

impl CollectionPage {
    /// A page with no items and zero totals, used when the CMS is unavailable.
    pub fn empty(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page,
            total_items: 0,
            total_pages: 0,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Result of a lookup that may legitimately find nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::NotFound => Lookup::NotFound,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// A taxonomy term together with one page of its items.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TermPage {
    pub term: Term,
    pub page: CollectionPage,
}

/// Outcome of a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The query was blank; nothing was searched.
    NoQuery,
    /// The query ran. The page may hold zero items.
    Results { query: String, page: CollectionPage },
}
