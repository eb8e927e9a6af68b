//! Cached, failure-tolerant access to one content section.

use futures_util::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use super::Section;
use super::cache::TtlCache;
use super::model::{CollectionPage, ContentItem, Lookup, SearchOutcome, Term, TermPage};
use super::normalize::{normalize_post, normalize_term};
use super::source::{
    CmsError, ContentSource, ItemFilter, ItemQuery, MAX_PER_PAGE, RemoteBatch, RemoteTerm, TaxonomyKind,
    WordPressSource,
};
use crate::config::{CacheSettings, CmsNamespace};

/// Client for one CMS namespace (blog or help center).
///
/// Every operation is infallible from the caller's side: listings degrade
/// to empty pages and lookups to [`Lookup::NotFound`] when the CMS fails or
/// does not answer within the timeout.
pub struct ContentClient {
    namespace: CmsNamespace,
    source: Arc<dyn ContentSource>,
    batches: TtlCache<RemoteBatch>,
    terms: TtlCache<Option<RemoteTerm>>,
    term_lists: TtlCache<Vec<RemoteTerm>>,
    timeout: Duration,
}

impl ContentClient {
    pub fn new(
        namespace: CmsNamespace,
        source: Arc<dyn ContentSource>,
        cache: CacheSettings,
        timeout: Duration,
    ) -> Self {
        Self {
            namespace,
            source,
            batches: TtlCache::new(cache),
            terms: TtlCache::new(cache),
            term_lists: TtlCache::new(cache),
            timeout,
        }
    }

    /// Builds a client talking to the namespace's WordPress REST API.
    pub fn wordpress(namespace: CmsNamespace, cache: CacheSettings, timeout: Duration) -> Result<Self, String> {
        let source = WordPressSource::new(namespace.clone(), timeout)
            .map_err(|e| format!("failed to build CMS client for {}: {}", namespace.section, e))?;
        Ok(Self::new(namespace, Arc::new(source), cache, timeout))
    }

    pub fn section(&self) -> Section {
        self.namespace.section
    }

    // -----------------------------------------------------------------------
    // Listings
    // -----------------------------------------------------------------------

    /// One page of the whole collection, newest first.
    pub async fn list_page(&self, page: u32, per_page: u32) -> CollectionPage {
        self.collection(&ItemQuery::new(ItemFilter::All, page, per_page)).await
    }

    /// One page of a category.
    pub async fn list_by_category(&self, slug: &str, page: u32, per_page: u32) -> Lookup<TermPage> {
        self.list_by_term(TaxonomyKind::Category, slug, page, per_page).await
    }

    /// One page of a tag.
    pub async fn list_by_tag(&self, slug: &str, page: u32, per_page: u32) -> Lookup<TermPage> {
        self.list_by_term(TaxonomyKind::Tag, slug, page, per_page).await
    }

    async fn list_by_term(&self, kind: TaxonomyKind, slug: &str, page: u32, per_page: u32) -> Lookup<TermPage> {
        let term = match self.term(kind, slug).await {
            Lookup::Found(term) => term,
            Lookup::NotFound => return Lookup::NotFound,
        };
        let query = ItemQuery::new(ItemFilter::Term(kind, term.id), page, per_page);
        let page = self.collection(&query).await;
        Lookup::Found(TermPage {
            term: normalize_term(&term),
            page,
        })
    }

    /// Full-text search. A blank query is answered without a remote call.
    pub async fn search(&self, query: &str, page: u32, per_page: u32) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::NoQuery;
        }
        let page = self
            .collection(&ItemQuery::new(ItemFilter::Search(query.to_string()), page, per_page))
            .await;
        SearchOutcome::Results {
            query: query.to_string(),
            page,
        }
    }

    async fn collection(&self, query: &ItemQuery) -> CollectionPage {
        match self.fetch_batch(query).await {
            Ok(batch) => {
                // Sources must already return nothing past the end.
                let items = if query.page > batch.total_pages {
                    Vec::new()
                } else {
                    batch
                        .items
                        .iter()
                        .map(|post| normalize_post(post, &self.namespace))
                        .collect()
                };
                CollectionPage {
                    page: query.page,
                    per_page: query.per_page,
                    total_items: batch.total_items,
                    total_pages: batch.total_pages,
                    items,
                }
            }
            Err(err) => {
                log::warn!(
                    "{}: listing [{}] failed, serving empty page: {}",
                    self.namespace.section,
                    query.cache_key(),
                    err
                );
                CollectionPage::empty(query.page, query.per_page)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// A single item by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Lookup<ContentItem> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Lookup::NotFound;
        }
        let query = ItemQuery::new(ItemFilter::Slug(slug.to_string()), 1, 1);
        match self.fetch_batch(&query).await {
            Ok(batch) => batch
                .items
                .iter()
                .find(|post| post.slug == slug)
                .map(|post| normalize_post(post, &self.namespace))
                .into(),
            Err(err) => {
                log::warn!("{}: lookup of '{}' failed: {}", self.namespace.section, slug, err);
                Lookup::NotFound
            }
        }
    }

    /// An item and the newest other items, fetched concurrently.
    pub async fn item_with_recent(&self, slug: &str, limit: usize) -> (Lookup<ContentItem>, Vec<ContentItem>) {
        let per_page = u32::try_from(limit + 1).unwrap_or(MAX_PER_PAGE);
        let (item, recent) = futures_util::join!(self.get_by_slug(slug), self.list_page(1, per_page));
        let recent = recent
            .items
            .into_iter()
            .filter(|other| other.slug != slug)
            .take(limit)
            .collect();
        (item, recent)
    }

    async fn term(&self, kind: TaxonomyKind, slug: &str) -> Lookup<RemoteTerm> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Lookup::NotFound;
        }
        let key = format!("{}={}", kind, slug);
        if let Some(hit) = self.terms.get(&key) {
            return (*hit).clone().into();
        }
        match self.bounded(self.source.fetch_term(kind, slug)).await {
            Ok(term) => (*self.terms.insert(key, term)).clone().into(),
            Err(err) => {
                log::warn!("{}: {} lookup of '{}' failed: {}", self.namespace.section, kind, slug, err);
                Lookup::NotFound
            }
        }
    }

    // -----------------------------------------------------------------------
    // Enumeration
    // -----------------------------------------------------------------------

    /// Every category of the section.
    pub async fn categories(&self) -> Vec<Term> {
        self.all_terms(TaxonomyKind::Category).await
    }

    /// Every tag of the section.
    pub async fn tags(&self) -> Vec<Term> {
        self.all_terms(TaxonomyKind::Tag).await
    }

    async fn all_terms(&self, kind: TaxonomyKind) -> Vec<Term> {
        let key = kind.to_string();
        let terms = match self.term_lists.get(&key) {
            Some(hit) => hit,
            None => match self.bounded(self.source.fetch_terms(kind)).await {
                Ok(terms) => self.term_lists.insert(key, terms),
                Err(err) => {
                    log::warn!("{}: listing {} terms failed: {}", self.namespace.section, kind, err);
                    return Vec::new();
                }
            },
        };
        terms.iter().map(normalize_term).collect()
    }

    /// Lazily walks the collection and yields every slug.
    ///
    /// Meant for static generation; a failure ends the stream early instead
    /// of surfacing an error.
    pub fn all_slugs(&self) -> impl Stream<Item = String> + '_ {
        stream::unfold(Some(1u32), move |next| async move {
            let page = next?;
            let query = ItemQuery::new(ItemFilter::All, page, MAX_PER_PAGE).slugs_only();
            match self.fetch_batch(&query).await {
                Ok(batch) if !batch.items.is_empty() => {
                    let slugs: Vec<String> = batch.items.iter().map(|post| post.slug.clone()).collect();
                    let more = page < batch.total_pages;
                    Some((stream::iter(slugs), more.then_some(page + 1)))
                }
                Ok(_) => None,
                Err(err) => {
                    log::warn!(
                        "{}: slug enumeration stopped at page {}: {}",
                        self.namespace.section,
                        page,
                        err
                    );
                    None
                }
            }
        })
        .flatten()
    }

    // -----------------------------------------------------------------------
    // Remote access
    // -----------------------------------------------------------------------

    async fn fetch_batch(&self, query: &ItemQuery) -> Result<Arc<RemoteBatch>, CmsError> {
        let key = query.cache_key();
        if let Some(hit) = self.batches.get(&key) {
            return Ok(hit);
        }
        let batch = self.bounded(self.source.fetch_items(query)).await?;
        log::debug!(
            "{}: fetched [{}] ({} items, {} total)",
            self.namespace.section,
            key,
            batch.items.len(),
            batch.total_items
        );
        Ok(self.batches.insert(key, batch))
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T, CmsError>>) -> Result<T, CmsError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CmsError::Timeout)?
    }
}
