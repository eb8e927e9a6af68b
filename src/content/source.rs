//! Remote content contract and its WordPress REST implementation.
//!
//! A [`ContentSource`] answers paginated item queries and taxonomy lookups
//! in the remote shape. It owns the pagination contract: a page past the
//! end yields no items together with the collection's true totals.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::CmsNamespace;

/// Largest page size the CMS accepts.
pub const MAX_PER_PAGE: u32 = 100;

/// WordPress error code for a page number past the last page.
const INVALID_PAGE_CODE: &str = "rest_post_invalid_page_number";

// ---------------------------------------------------------------------------
// Remote shapes
// ---------------------------------------------------------------------------

/// A `{ "rendered": "..." }` field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rendered {
    pub rendered: String,
}

/// An item as the CMS returns it.
///
/// Every field is optional on the wire. Taxonomy id lists live under keys
/// named after the taxonomy endpoint, so they are kept in `fields`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemotePost {
    pub id: u64,
    pub slug: String,
    pub date_gmt: Option<String>,
    pub modified_gmt: Option<String>,
    pub title: Rendered,
    pub content: Rendered,
    pub excerpt: Rendered,
    #[serde(rename = "_embedded")]
    pub embedded: Option<RemoteEmbedded>,
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl RemotePost {
    /// Term ids listed under a taxonomy field.
    pub fn term_ids(&self, field: &str) -> Vec<u64> {
        self.fields
            .get(field)
            .and_then(|v| v.as_array())
            .map(|ids| ids.iter().filter_map(|id| id.as_u64()).collect())
            .unwrap_or_default()
    }
}

/// The `_embedded` block requested with `_embed`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteEmbedded {
    pub author: Vec<RemoteAuthor>,
    #[serde(rename = "wp:term")]
    pub terms: Vec<Vec<RemoteTerm>>,
    #[serde(rename = "wp:featuredmedia")]
    pub featured_media: Vec<RemoteMedia>,
}

/// An embedded author. Hidden authors come back as error objects, which
/// deserialize to an empty name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteAuthor {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub avatar_urls: HashMap<String, String>,
}

/// A category or tag in the remote shape.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteTerm {
    pub id: u64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub count: Option<u64>,
    pub taxonomy: String,
}

/// An embedded media attachment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemoteMedia {
    pub source_url: Option<String>,
}

/// One page of remote items with collection totals.
#[derive(Debug, Clone, Default)]
pub struct RemoteBatch {
    pub items: Vec<RemotePost>,
    pub total_items: u64,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    code: String,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Which taxonomy a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Category,
    Tag,
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonomyKind::Category => write!(f, "category"),
            TaxonomyKind::Tag => write!(f, "tag"),
        }
    }
}

/// Item filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemFilter {
    All,
    Slug(String),
    Term(TaxonomyKind, u64),
    Search(String),
}

/// How much of each item to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fields {
    /// Full items with embedded author, terms and media.
    Full,
    /// Only ids and slugs, for enumeration.
    SlugOnly,
}

/// A paginated item query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemQuery {
    pub filter: ItemFilter,
    pub page: u32,
    pub per_page: u32,
    pub fields: Fields,
}

impl ItemQuery {
    /// Builds a full-item query. Page 0 is read as page 1 and the page size
    /// is clamped to what the CMS accepts.
    pub fn new(filter: ItemFilter, page: u32, per_page: u32) -> Self {
        Self {
            filter,
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            fields: Fields::Full,
        }
    }

    pub fn slugs_only(mut self) -> Self {
        self.fields = Fields::SlugOnly;
        self
    }

    /// Stable cache key built from every query parameter.
    pub fn cache_key(&self) -> String {
        let filter = match &self.filter {
            ItemFilter::All => "all".to_string(),
            ItemFilter::Slug(slug) => format!("slug={}", slug),
            ItemFilter::Term(kind, id) => format!("{}={}", kind, id),
            ItemFilter::Search(query) => format!("search={}", query),
        };
        let fields = match self.fields {
            Fields::Full => "full",
            Fields::SlugOnly => "slugs",
        };
        format!("{}|page={}|per_page={}|{}", filter, self.page, self.per_page, fields)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a remote call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsError {
    /// Connection, TLS or protocol failure.
    Transport(String),
    /// The CMS answered with a non-success status.
    Status(u16),
    /// The body did not match the expected shape.
    Decode(String),
    /// No answer within the configured timeout.
    Timeout,
}

impl fmt::Display for CmsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmsError::Transport(msg) => write!(f, "transport error: {}", msg),
            CmsError::Status(code) => write!(f, "unexpected status {}", code),
            CmsError::Decode(msg) => write!(f, "malformed response: {}", msg),
            CmsError::Timeout => write!(f, "timed out"),
        }
    }
}

impl std::error::Error for CmsError {}

impl From<reqwest::Error> for CmsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CmsError::Timeout
        } else if err.is_decode() {
            CmsError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            CmsError::Status(status.as_u16())
        } else {
            CmsError::Transport(err.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// The remote side of a content section.
pub trait ContentSource: Send + Sync {
    /// Fetches one page of items. A page past the end must return no items
    /// and the true totals.
    fn fetch_items<'a>(&'a self, query: &'a ItemQuery) -> BoxFuture<'a, Result<RemoteBatch, CmsError>>;

    /// Looks up a term by slug. `Ok(None)` when the term does not exist.
    fn fetch_term<'a>(
        &'a self,
        kind: TaxonomyKind,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteTerm>, CmsError>>;

    /// Lists every term of a taxonomy.
    fn fetch_terms(&self, kind: TaxonomyKind) -> BoxFuture<'_, Result<Vec<RemoteTerm>, CmsError>>;
}

// ---------------------------------------------------------------------------
// WordPress REST source
// ---------------------------------------------------------------------------

/// [`ContentSource`] backed by a WordPress REST namespace.
pub struct WordPressSource {
    http: reqwest::Client,
    namespace: CmsNamespace,
}

impl WordPressSource {
    /// Creates a source with its own HTTP client.
    pub fn new(namespace: CmsNamespace, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(format!("homeframe-site/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, namespace })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.namespace.api_base, name)
    }

    fn taxonomy_endpoint(&self, kind: TaxonomyKind) -> &str {
        match kind {
            TaxonomyKind::Category => &self.namespace.categories,
            TaxonomyKind::Tag => &self.namespace.tags,
        }
    }

    fn item_params(&self, query: &ItemQuery) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), query.page.to_string()),
            ("per_page".to_string(), query.per_page.to_string()),
        ];
        match &query.filter {
            ItemFilter::All => {}
            ItemFilter::Slug(slug) => params.push(("slug".to_string(), slug.clone())),
            ItemFilter::Term(kind, id) => {
                params.push((self.taxonomy_endpoint(*kind).to_string(), id.to_string()))
            }
            ItemFilter::Search(text) => params.push(("search".to_string(), text.clone())),
        }
        match query.fields {
            Fields::Full => params.push(("_embed".to_string(), "1".to_string())),
            Fields::SlugOnly => params.push(("_fields".to_string(), "id,slug".to_string())),
        }
        params
    }

    async fn items(&self, query: &ItemQuery) -> Result<RemoteBatch, CmsError> {
        let response = self
            .http
            .get(self.endpoint(&self.namespace.items))
            .query(&self.item_params(query))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            // Proxies may answer 400 with an HTML page; only the CMS's own
            // error body can mark a past-the-end page.
            let code = response.json::<RemoteErrorBody>().await.ok().map(|body| body.code);
            if code.as_deref() == Some(INVALID_PAGE_CODE) && query.page > 1 {
                return self.totals_only(query).await;
            }
            return Err(CmsError::Status(400));
        }

        let response = response.error_for_status()?;
        let (total_items, total_pages) = read_totals(response.headers());
        let items: Vec<RemotePost> = response.json().await?;

        Ok(batch_with_totals(items, total_items, total_pages, query.per_page))
    }

    /// Answers a past-the-end page: probes page 1 for the totals.
    async fn totals_only(&self, query: &ItemQuery) -> Result<RemoteBatch, CmsError> {
        let mut probe = query.clone().slugs_only();
        probe.page = 1;
        let response = self
            .http
            .get(self.endpoint(&self.namespace.items))
            .query(&self.item_params(&probe))
            .send()
            .await?
            .error_for_status()?;
        let (total_items, total_pages) = read_totals(response.headers());
        let items: Vec<RemotePost> = response.json().await?;
        let probed = batch_with_totals(items, total_items, total_pages, probe.per_page);

        Ok(RemoteBatch {
            items: Vec::new(),
            total_items: probed.total_items,
            total_pages: probed.total_pages,
        })
    }

    async fn term(&self, kind: TaxonomyKind, slug: &str) -> Result<Option<RemoteTerm>, CmsError> {
        let terms: Vec<RemoteTerm> = self
            .http
            .get(self.endpoint(self.taxonomy_endpoint(kind)))
            .query(&[("slug", slug)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(terms.into_iter().find(|t| t.slug == slug))
    }

    async fn terms(&self, kind: TaxonomyKind) -> Result<Vec<RemoteTerm>, CmsError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let response = self
                .http
                .get(self.endpoint(self.taxonomy_endpoint(kind)))
                .query(&[("page", page.to_string()), ("per_page", MAX_PER_PAGE.to_string())])
                .send()
                .await?
                .error_for_status()?;
            let (_, total_pages) = read_totals(response.headers());
            let batch: Vec<RemoteTerm> = response.json().await?;
            let done = batch.is_empty() || total_pages.is_none_or(|pages| page >= pages);
            all.extend(batch);
            if done {
                return Ok(all);
            }
            page += 1;
        }
    }
}

impl ContentSource for WordPressSource {
    fn fetch_items<'a>(&'a self, query: &'a ItemQuery) -> BoxFuture<'a, Result<RemoteBatch, CmsError>> {
        self.items(query).boxed()
    }

    fn fetch_term<'a>(
        &'a self,
        kind: TaxonomyKind,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteTerm>, CmsError>> {
        self.term(kind, slug).boxed()
    }

    fn fetch_terms(&self, kind: TaxonomyKind) -> BoxFuture<'_, Result<Vec<RemoteTerm>, CmsError>> {
        self.terms(kind).boxed()
    }
}

/// Reads `X-WP-Total` and `X-WP-TotalPages`.
fn read_totals(headers: &reqwest::header::HeaderMap) -> (Option<u64>, Option<u32>) {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
    };
    let total_items = read("x-wp-total");
    let total_pages = read("x-wp-totalpages").and_then(|v| u32::try_from(v).ok());
    (total_items, total_pages)
}

/// Fills in totals the CMS left out, deriving them from what is known.
fn batch_with_totals(
    items: Vec<RemotePost>,
    total_items: Option<u64>,
    total_pages: Option<u32>,
    per_page: u32,
) -> RemoteBatch {
    let total_items = total_items.unwrap_or(items.len() as u64);
    let total_pages = total_pages.unwrap_or_else(|| page_count(total_items, per_page));
    RemoteBatch {
        items,
        total_items,
        total_pages,
    }
}

/// Number of pages needed for `total` items.
pub fn page_count(total: u64, per_page: u32) -> u32 {
    let per_page = u64::from(per_page.max(1));
    u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX)
}
