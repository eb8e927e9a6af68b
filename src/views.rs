//! JSON view models.
//!
//! Handlers answer with these shapes; a presentation layer renders them.
//! They carry every link the page needs so templates never build paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;
use utoipa::ToSchema;

use crate::content::{CollectionPage, ContentItem, Section, Term};
use crate::context::{Alternate, CommonLinks};
use crate::locale::Locale;
use crate::pages::PageKind;

// ---------------------------------------------------------------------------
// Localized pages
// ---------------------------------------------------------------------------

/// A page from the static route table.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PageView {
    pub locale: Locale,
    /// Canonical localized path of this page.
    pub path: String,
    pub kind: PageKind,
    pub title: String,
    pub links: CommonLinks,
    /// The same page under every supported locale.
    pub alternates: Vec<Alternate>,
}

/// Body of every 404.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotFoundView {
    pub message: String,
    pub path: String,
    /// Where the "back home" link points.
    pub home: String,
}

// ---------------------------------------------------------------------------
// Content sections
// ---------------------------------------------------------------------------

/// Paging controls for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationView {
    pub page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    /// False when everything fits on one page or the totals are unknown.
    pub show_controls: bool,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl PaginationView {
    /// Builds the controls for `page`, linking to `base` with `fixed_query`
    /// pairs (such as the search text) ahead of the page number.
    pub fn new(page: &CollectionPage, base: &str, fixed_query: &[(&str, &str)]) -> Self {
        let link = |n: u32| page_href(base, fixed_query, n);
        let previous = page
            .has_previous()
            .then(|| link(page.page.min(page.total_pages.saturating_add(1)).saturating_sub(1)));
        let next = page.has_next().then(|| link(page.page.saturating_add(1)));
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            show_controls: page.total_pages > 1,
            previous,
            next,
        }
    }
}

fn page_href(base: &str, fixed_query: &[(&str, &str)], page: u32) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.extend_pairs(fixed_query);
    if page > 1 {
        query.append_pair("page", &page.to_string());
    }
    let query = query.finish();
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, query)
    }
}

/// A content item as shown in a listing.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemSummary {
    pub slug: String,
    pub href: String,
    pub title: String,
    pub excerpt: String,
    pub published_at: Option<DateTime<Utc>>,
    pub author: String,
    pub featured_image: Option<String>,
    pub categories: Vec<Term>,
}

impl ItemSummary {
    pub fn from_item(section: Section, item: &ContentItem) -> Self {
        Self {
            slug: item.slug.clone(),
            href: format!("{}/{}", section.base_path(), item.slug),
            title: item.title.clone(),
            excerpt: item.excerpt.clone(),
            published_at: item.published_at,
            author: item.author.name.clone(),
            featured_image: item.featured_image.clone(),
            categories: item.categories.clone(),
        }
    }
}

fn summaries(section: Section, page: &CollectionPage) -> Vec<ItemSummary> {
    page.items.iter().map(|item| ItemSummary::from_item(section, item)).collect()
}

fn empty_message(section: Section, page: &CollectionPage) -> Option<String> {
    page.is_empty().then(|| t!(section.empty_message_key()).to_string())
}

/// A section index page.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ListingView {
    pub section: Section,
    pub items: Vec<ItemSummary>,
    pub pagination: PaginationView,
    /// Set when the page has nothing to show.
    pub empty_message: Option<String>,
    pub categories: Vec<Term>,
}

impl ListingView {
    pub fn new(section: Section, page: &CollectionPage, categories: Vec<Term>) -> Self {
        Self {
            section,
            items: summaries(section, page),
            pagination: PaginationView::new(page, section.base_path(), &[]),
            empty_message: empty_message(section, page),
            categories,
        }
    }
}

/// One category or tag with a page of its items.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TermView {
    pub section: Section,
    /// `category` or `tag`.
    pub taxonomy: String,
    pub term: Term,
    pub items: Vec<ItemSummary>,
    pub pagination: PaginationView,
    pub empty_message: Option<String>,
}

impl TermView {
    pub fn new(section: Section, taxonomy: &str, term: Term, page: &CollectionPage) -> Self {
        let base = format!("{}/{}/{}", section.base_path(), taxonomy, term.slug);
        Self {
            section,
            taxonomy: taxonomy.to_string(),
            items: summaries(section, page),
            pagination: PaginationView::new(page, &base, &[]),
            empty_message: empty_message(section, page),
            term,
        }
    }
}

/// A single content item with a few recent ones.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemView {
    pub section: Section,
    pub item: ContentItem,
    pub recent: Vec<ItemSummary>,
}

/// Search page. `query` is absent and `prompt` set when nothing was asked.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchView {
    pub section: Section,
    pub query: Option<String>,
    pub prompt: Option<String>,
    pub items: Vec<ItemSummary>,
    pub pagination: Option<PaginationView>,
    pub empty_message: Option<String>,
}

impl SearchView {
    pub fn prompt(section: Section) -> Self {
        Self {
            section,
            query: None,
            prompt: Some(t!("search.prompt").to_string()),
            items: Vec::new(),
            pagination: None,
            empty_message: None,
        }
    }

    pub fn results(section: Section, query: String, page: &CollectionPage) -> Self {
        let base = format!("{}/search", section.base_path());
        Self {
            section,
            items: summaries(section, page),
            pagination: Some(PaginationView::new(page, &base, &[("q", query.as_str())])),
            empty_message: page
                .is_empty()
                .then(|| t!("search.no_results", query = &query).to_string()),
            prompt: None,
            query: Some(query),
        }
    }
}

// ---------------------------------------------------------------------------
// API shapes
// ---------------------------------------------------------------------------

/// Error response body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Liveness probe body.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/locale`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SwitchLocaleRequest {
    /// Target locale code.
    pub locale: String,
    /// The localized path currently shown, e.g. `/us/plans`.
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(page: u32, total_items: u64, total_pages: u32, items: usize) -> CollectionPage {
        let item = ContentItem {
            slug: "a".into(),
            title: "A".into(),
            body: String::new(),
            excerpt: String::new(),
            published_at: None,
            updated_at: None,
            categories: Vec::new(),
            tags: Vec::new(),
            author: crate::content::Author::placeholder(),
            featured_image: None,
        };
        CollectionPage {
            page,
            per_page: 9,
            total_items,
            total_pages,
            items: vec![item; items],
        }
    }

    #[test]
    fn test_pagination_links() {
        let view = PaginationView::new(&page(2, 30, 4, 9), "/blog", &[]);
        assert!(view.show_controls);
        assert_eq!(view.previous.as_deref(), Some("/blog"));
        assert_eq!(view.next.as_deref(), Some("/blog?page=3"));

        let last = PaginationView::new(&page(4, 30, 4, 3), "/blog", &[]);
        assert_eq!(last.previous.as_deref(), Some("/blog?page=3"));
        assert!(last.next.is_none());
    }

    #[test]
    fn test_pagination_single_page_hides_controls() {
        let view = PaginationView::new(&page(1, 3, 1, 3), "/blog", &[]);
        assert!(!view.show_controls);
        assert!(view.previous.is_none() && view.next.is_none());
    }

    #[test]
    fn test_pagination_past_end_links_back_to_last_page() {
        let view = PaginationView::new(&page(9, 30, 4, 0), "/blog", &[]);
        assert_eq!(view.previous.as_deref(), Some("/blog?page=4"));
        assert!(view.next.is_none());
    }

    #[test]
    fn test_unavailable_listing_shows_empty_message() {
        let empty = CollectionPage::empty(1, 9);
        let view = ListingView::new(Section::Blog, &empty, Vec::new());
        assert!(!view.pagination.show_controls);
        assert_eq!(view.empty_message.as_deref(), Some("No posts yet"));
    }

    #[test]
    fn test_search_links_keep_query() {
        let view = SearchView::results(Section::HelpCenter, "reset password".into(), &page(1, 20, 3, 9));
        let pagination = view.pagination.unwrap();
        assert_eq!(pagination.next.as_deref(), Some("/help-center/search?q=reset+password&page=2"));
        assert_eq!(view.items[0].href, "/help-center/a");
        assert!(view.empty_message.is_none());
    }

    #[test]
    fn test_search_links_encode_query() {
        let view = SearchView::results(Section::Blog, "a b&c=d/é".into(), &page(2, 20, 3, 9));
        let pagination = view.pagination.unwrap();
        assert_eq!(pagination.previous.as_deref(), Some("/blog/search?q=a+b%26c%3Dd%2F%C3%A9"));
        assert_eq!(pagination.next.as_deref(), Some("/blog/search?q=a+b%26c%3Dd%2F%C3%A9&page=3"));
    }

    #[test]
    fn test_pagination_survives_extreme_totals() {
        let view = PaginationView::new(&page(u32::MAX, 0, u32::MAX, 0), "/blog", &[]);
        assert_eq!(view.previous.as_deref(), Some("/blog?page=4294967294"));
        assert!(view.next.is_none());
    }
}
