//! Shared test fixtures: an in-memory CMS and ready-made configuration.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::{CacheSettings, CmsNamespace, SiteArgs, SiteConfig};
use crate::content::source::{
    CmsError, ContentSource, ItemFilter, ItemQuery, RemoteBatch, RemoteEmbedded, RemotePost, RemoteTerm, Rendered,
    TaxonomyKind, page_count,
};
use crate::content::{ContentClient, Section};
use crate::locale::LocaleSet;

pub const GUIDES_ID: u64 = 1;
pub const ANNOUNCEMENTS_ID: u64 = 2;
pub const STAGING_TAG_ID: u64 = 10;

/// `us`, `uk`, `au`, `ca` with default `us` and `gb` → `uk`.
pub fn sample_set() -> LocaleSet {
    LocaleSet::new(
        &["us".into(), "uk".into(), "au".into(), "ca".into()],
        "us",
        &[("gb".into(), "uk".into())],
    )
    .unwrap()
}

pub fn blog_namespace() -> CmsNamespace {
    CmsNamespace {
        section: Section::Blog,
        api_base: "http://cms.test/wp-json/wp/v2".into(),
        items: "posts".into(),
        categories: "categories".into(),
        tags: "tags".into(),
    }
}

pub fn help_namespace() -> CmsNamespace {
    CmsNamespace {
        section: Section::HelpCenter,
        api_base: "http://help.test/wp-json/wp/v2".into(),
        items: "articles".into(),
        categories: "article-categories".into(),
        tags: "article-tags".into(),
    }
}

fn term(id: u64, slug: &str, name: &str, taxonomy: &str, description: Option<&str>, count: u64) -> RemoteTerm {
    RemoteTerm {
        id,
        slug: slug.into(),
        name: name.into(),
        description: description.map(String::from),
        count: Some(count),
        taxonomy: taxonomy.into(),
    }
}

/// Posts `post-1` ..= `post-n`, newest first. Odd posts are in "guides";
/// every post carries the "staging" tag; "announcements" stays empty.
pub fn fixture_posts(n: u64) -> Vec<RemotePost> {
    (1..=n)
        .map(|i| {
            let mut categories = Vec::new();
            if i % 2 == 1 {
                categories.push(term(GUIDES_ID, "guides", "Guides", "category", None, 0));
            }
            let tags = vec![term(STAGING_TAG_ID, "staging", "Staging", "post_tag", None, 0)];
            let mut post = RemotePost {
                id: i,
                slug: format!("post-{}", i),
                date_gmt: Some(format!("2024-01-{:02}T09:00:00", (i % 28) + 1)),
                title: Rendered {
                    rendered: format!("Post {}", i),
                },
                content: Rendered {
                    rendered: format!("<p>Body of post {}</p>", i),
                },
                ..Default::default()
            };
            post.fields.insert(
                "categories".into(),
                serde_json::json!(categories.iter().map(|t| t.id).collect::<Vec<_>>()),
            );
            post.fields.insert("tags".into(), serde_json::json!([STAGING_TAG_ID]));
            post.embedded = Some(RemoteEmbedded {
                terms: vec![categories, tags],
                ..Default::default()
            });
            post
        })
        .collect()
}

/// In-memory [`ContentSource`] honouring the remote pagination contract.
pub struct FixtureSource {
    posts: Vec<RemotePost>,
    categories: Vec<RemoteTerm>,
    tags: Vec<RemoteTerm>,
    failing: AtomicBool,
    delay: Option<Duration>,
    item_calls: AtomicUsize,
}

impl FixtureSource {
    pub fn new(posts: Vec<RemotePost>) -> Self {
        let guides = posts
            .iter()
            .filter(|p| p.term_ids("categories").contains(&GUIDES_ID))
            .count() as u64;
        let tagged = posts.len() as u64;
        Self {
            posts,
            categories: vec![
                term(GUIDES_ID, "guides", "Guides", "category", Some("How-to guides"), guides),
                term(ANNOUNCEMENTS_ID, "announcements", "Announcements", "category", Some("Product news"), 0),
            ],
            tags: vec![term(STAGING_TAG_ID, "staging", "Staging", "post_tag", None, tagged)],
            failing: AtomicBool::new(false),
            delay: None,
            item_calls: AtomicUsize::new(0),
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of item queries that reached the source.
    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }

    async fn gate(&self) -> Result<(), CmsError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CmsError::Status(503));
        }
        Ok(())
    }

    fn matches(&self, post: &RemotePost, filter: &ItemFilter) -> bool {
        match filter {
            ItemFilter::All => true,
            ItemFilter::Slug(slug) => &post.slug == slug,
            ItemFilter::Term(TaxonomyKind::Category, id) => post.term_ids("categories").contains(id),
            ItemFilter::Term(TaxonomyKind::Tag, id) => post.term_ids("tags").contains(id),
            ItemFilter::Search(text) => {
                let text = text.to_lowercase();
                post.title.rendered.to_lowercase().contains(&text)
                    || post.content.rendered.to_lowercase().contains(&text)
            }
        }
    }

    fn taxonomy(&self, kind: TaxonomyKind) -> &[RemoteTerm] {
        match kind {
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Tag => &self.tags,
        }
    }
}

impl ContentSource for FixtureSource {
    fn fetch_items<'a>(&'a self, query: &'a ItemQuery) -> BoxFuture<'a, Result<RemoteBatch, CmsError>> {
        async move {
            self.item_calls.fetch_add(1, Ordering::SeqCst);
            self.gate().await?;
            let matching: Vec<&RemotePost> = self.posts.iter().filter(|p| self.matches(p, &query.filter)).collect();
            let total_items = matching.len() as u64;
            let start = (query.page.max(1) as usize - 1) * query.per_page as usize;
            let items = matching
                .into_iter()
                .skip(start)
                .take(query.per_page as usize)
                .cloned()
                .collect();
            Ok(RemoteBatch {
                items,
                total_items,
                total_pages: page_count(total_items, query.per_page),
            })
        }
        .boxed()
    }

    fn fetch_term<'a>(
        &'a self,
        kind: TaxonomyKind,
        slug: &'a str,
    ) -> BoxFuture<'a, Result<Option<RemoteTerm>, CmsError>> {
        async move {
            self.gate().await?;
            Ok(self.taxonomy(kind).iter().find(|t| t.slug == slug).cloned())
        }
        .boxed()
    }

    fn fetch_terms(&self, kind: TaxonomyKind) -> BoxFuture<'_, Result<Vec<RemoteTerm>, CmsError>> {
        async move {
            self.gate().await?;
            Ok(self.taxonomy(kind).to_vec())
        }
        .boxed()
    }
}

/// A validated configuration using the default flags.
pub fn sample_config() -> SiteConfig {
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        site: SiteArgs,
    }

    SiteConfig::from_args(&TestCli::parse_from(["homeframe"]).site).unwrap()
}

/// A blog client over a fixture source.
pub fn client_with(source: Arc<FixtureSource>, ttl: Duration, timeout: Duration) -> ContentClient {
    ContentClient::new(
        blog_namespace(),
        source,
        CacheSettings { ttl, capacity: 64 },
        timeout,
    )
}
