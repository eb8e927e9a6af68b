//! Runtime configuration.
//!
//! Every setting is a command-line flag with an `HOMEFRAME_*` environment
//! fallback. [`SiteArgs`] is the raw clap surface; [`SiteConfig`] is the
//! validated form the server and the CLI commands work with.

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use crate::content::Section;
use crate::locale::LocaleSet;

/// Settings shared by every subcommand that talks to the CMS or routes
/// requests.
#[derive(Args, Debug, Clone)]
pub struct SiteArgs {
    /// Public origin of the site, used for absolute URLs in the site map.
    #[arg(long, env = "HOMEFRAME_SITE_URL", default_value = "https://www.homeframe.app")]
    pub site_url: String,

    /// Supported country locales (comma separated).
    #[arg(long, env = "HOMEFRAME_LOCALES", value_delimiter = ',', default_value = "us,uk,au,ca")]
    pub locales: Vec<String>,

    /// Locale served when no preference or geo signal applies.
    #[arg(long, env = "HOMEFRAME_DEFAULT_LOCALE", default_value = "us")]
    pub default_locale: String,

    /// Country code aliases as `from=to` pairs (comma separated).
    #[arg(long = "locale-alias", env = "HOMEFRAME_LOCALE_ALIASES", value_delimiter = ',', default_value = "gb=uk")]
    pub locale_aliases: Vec<String>,

    /// Name of the cookie holding the locale preference.
    #[arg(long, env = "HOMEFRAME_LOCALE_COOKIE", default_value = "preferred-locale")]
    pub locale_cookie: String,

    /// Request header carrying the visitor's two-letter country.
    #[arg(long, env = "HOMEFRAME_GEO_HEADER", default_value = "x-vercel-ip-country")]
    pub geo_header: String,

    /// REST base of the blog CMS (e.g. `https://cms.example.com/wp-json/wp/v2`).
    #[arg(long, env = "HOMEFRAME_BLOG_CMS_URL", default_value = "https://blog-cms.homeframe.app/wp-json/wp/v2")]
    pub blog_cms_url: String,

    /// REST base of the help-center CMS.
    #[arg(long, env = "HOMEFRAME_HELP_CMS_URL", default_value = "https://help-cms.homeframe.app/wp-json/wp/v2")]
    pub help_cms_url: String,

    /// Help-center item collection endpoint.
    #[arg(long, env = "HOMEFRAME_HELP_ITEMS", default_value = "articles")]
    pub help_items_endpoint: String,

    /// Help-center category taxonomy endpoint.
    #[arg(long, env = "HOMEFRAME_HELP_CATEGORIES", default_value = "article-categories")]
    pub help_categories_endpoint: String,

    /// Help-center tag taxonomy endpoint.
    #[arg(long, env = "HOMEFRAME_HELP_TAGS", default_value = "article-tags")]
    pub help_tags_endpoint: String,

    /// Items per listing page.
    #[arg(long, env = "HOMEFRAME_PAGE_SIZE", default_value_t = 9)]
    pub page_size: u32,

    /// Seconds a CMS response stays cached.
    #[arg(long, env = "HOMEFRAME_CACHE_TTL", default_value_t = 600)]
    pub cache_ttl_secs: u64,

    /// Maximum cached CMS responses per section.
    #[arg(long, env = "HOMEFRAME_CACHE_CAPACITY", default_value_t = 512)]
    pub cache_capacity: usize,

    /// Milliseconds before a CMS request is abandoned.
    #[arg(long, env = "HOMEFRAME_FETCH_TIMEOUT_MS", default_value_t = 8000)]
    pub fetch_timeout_ms: u64,
}

/// Endpoints of one CMS content namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmsNamespace {
    pub section: Section,
    /// REST base URL without trailing slash.
    pub api_base: String,
    /// Item collection endpoint (`posts`).
    pub items: String,
    /// Category taxonomy endpoint; also the item filter parameter.
    pub categories: String,
    /// Tag taxonomy endpoint; also the item filter parameter.
    pub tags: String,
}

/// Cache sizing for one content client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub capacity: usize,
}

/// Validated site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub site_url: String,
    pub locales: Arc<LocaleSet>,
    pub locale_cookie: String,
    pub geo_header: String,
    pub blog: CmsNamespace,
    pub help_center: CmsNamespace,
    pub page_size: u32,
    pub cache: CacheSettings,
    pub fetch_timeout: Duration,
}

impl SiteConfig {
    /// Validates raw arguments.
    pub fn from_args(args: &SiteArgs) -> Result<Self, String> {
        let aliases = args
            .locale_aliases
            .iter()
            .filter(|pair| !pair.trim().is_empty())
            .map(|pair| parse_alias(pair))
            .collect::<Result<Vec<_>, _>>()?;

        let locales = Arc::new(LocaleSet::new(&args.locales, &args.default_locale, &aliases)?);

        if args.page_size == 0 {
            return Err("page size must be at least 1".to_string());
        }
        if args.cache_capacity == 0 {
            return Err("cache capacity must be at least 1".to_string());
        }
        if args.locale_cookie.trim().is_empty() {
            return Err("locale cookie name must not be empty".to_string());
        }

        Ok(Self {
            site_url: args.site_url.trim_end_matches('/').to_string(),
            locales,
            locale_cookie: args.locale_cookie.trim().to_string(),
            geo_header: args.geo_header.trim().to_ascii_lowercase(),
            blog: CmsNamespace {
                section: Section::Blog,
                api_base: args.blog_cms_url.trim_end_matches('/').to_string(),
                items: "posts".to_string(),
                categories: "categories".to_string(),
                tags: "tags".to_string(),
            },
            help_center: CmsNamespace {
                section: Section::HelpCenter,
                api_base: args.help_cms_url.trim_end_matches('/').to_string(),
                items: args.help_items_endpoint.clone(),
                categories: args.help_categories_endpoint.clone(),
                tags: args.help_tags_endpoint.clone(),
            },
            page_size: args.page_size,
            cache: CacheSettings {
                ttl: Duration::from_secs(args.cache_ttl_secs),
                capacity: args.cache_capacity,
            },
            fetch_timeout: Duration::from_millis(args.fetch_timeout_ms),
        })
    }

    /// Returns the namespace backing a content section.
    pub fn namespace(&self, section: Section) -> &CmsNamespace {
        match section {
            Section::Blog => &self.blog,
            Section::HelpCenter => &self.help_center,
        }
    }
}

/// Parses a `from=to` alias pair.
fn parse_alias(pair: &str) -> Result<(String, String), String> {
    match pair.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => Err(format!("malformed locale alias '{}', expected from=to", pair)),
    }
}
