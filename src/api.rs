//! HTTP surface of the site.
//!
//! - Localized static pages under `/{locale}/...`
//! - The blog and help center under `/blog` and `/help-center`
//! - `POST /api/locale` to switch locale, `/api/health`
//! - `/sitemap.xml` and the OpenAPI document at `/api-docs/openapi.json`
//!
//! Every handler answers with a JSON view model from [`crate::views`].
//! Content handlers are shared by both sections; the scope they are
//! mounted in provides the [`Section`] as app data.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};

use crate::config::SiteConfig;
use crate::content::{Author, ContentClient, ContentItem, Lookup, SearchOutcome, Section, Term};
use crate::context::{Alternate, CommonLinks, CookiePreferences, LocaleContext, PreferenceStore, locale_context};
use crate::locale::Locale;
use crate::pages::{PageKind, find_page};
use crate::resolver::is_excluded;
use crate::sitemap;
use crate::views::*;

/// How many recent items accompany a single item.
const RECENT_ITEMS: usize = 3;

/// Shared state: configuration and one content client per section.
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub blog: ContentClient,
    pub help_center: ContentClient,
}

impl AppState {
    /// Builds WordPress-backed clients for both sections.
    pub fn from_config(config: Arc<SiteConfig>) -> Result<Self, String> {
        let blog = ContentClient::wordpress(config.blog.clone(), config.cache, config.fetch_timeout)?;
        let help_center = ContentClient::wordpress(config.help_center.clone(), config.cache, config.fetch_timeout)?;
        Ok(Self {
            config,
            blog,
            help_center,
        })
    }

    pub fn client(&self, section: Section) -> &ContentClient {
        match section {
            Section::Blog => &self.blog,
            Section::HelpCenter => &self.help_center,
        }
    }
}

// ---------------------------------------------------------------------------
// OpenAPI definition
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HomeFrame site",
        description = "Localized marketing pages and CMS-backed content as JSON view models. \
            Content routes are documented for the blog; the help center mirrors them under /help-center."
    ),
    paths(
        show_page,
        list_items,
        show_item,
        list_category,
        list_tag,
        search_items,
        switch_locale,
        sitemap_xml,
        health,
    ),
    components(schemas(
        PageView,
        NotFoundView,
        PageKind,
        Locale,
        CommonLinks,
        Alternate,
        Section,
        ListingView,
        TermView,
        ItemView,
        SearchView,
        ItemSummary,
        PaginationView,
        ContentItem,
        Author,
        Term,
        ErrorResponse,
        HealthResponse,
        SwitchLocaleRequest,
    )),
    tags(
        (name = "pages", description = "Localized static pages"),
        (name = "content", description = "Blog and help-center content"),
        (name = "site", description = "Locale switching, health and site map"),
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u32>,
}

impl PageQuery {
    fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Search text. Blank shows the search prompt.
    pub q: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

// ---------------------------------------------------------------------------
// Localized pages
// ---------------------------------------------------------------------------

/// A page from the localized route table.
#[utoipa::path(
    get,
    path = "/{locale}/{route}",
    tag = "pages",
    params(
        ("locale" = String, Path, description = "Supported locale code"),
        ("route" = String, Path, description = "Route within the locale, empty for the landing page"),
    ),
    responses(
        (status = 200, description = "Page view model", body = PageView),
        (status = 307, description = "Locale missing or not supported; redirected"),
        (status = 404, description = "Unknown route", body = NotFoundView),
    )
)]
pub async fn show_page(req: HttpRequest) -> impl Responder {
    // File-like paths skip the resolver and have no locale.
    if is_excluded(req.path()) {
        return not_found_response(req.path(), "/");
    }

    let ctx = locale_context(&req);
    let rest = ctx.path_within_locale(req.path());
    match find_page(&rest) {
        Some(page) => HttpResponse::Ok().json(PageView {
            locale: ctx.locale().clone(),
            path: ctx.href(page.path),
            kind: page.kind,
            title: t!(page.title_key).to_string(),
            links: ctx.links(),
            alternates: ctx.alternates(page.path),
        }),
        None => not_found_response(req.path(), &ctx.href("/")),
    }
}

/// Fallback for every unmatched route.
pub async fn not_found(req: HttpRequest) -> impl Responder {
    not_found_response(req.path(), "/")
}

fn not_found_response(path: &str, home: &str) -> HttpResponse {
    HttpResponse::NotFound().json(NotFoundView {
        message: t!("page.not_found").to_string(),
        path: path.to_string(),
        home: home.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Content sections
// ---------------------------------------------------------------------------

/// Section index.
#[utoipa::path(
    get,
    path = "/blog",
    tag = "content",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of the section", body = ListingView),
    )
)]
pub async fn list_items(
    section: web::Data<Section>,
    query: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let section = **section;
    let client = data.client(section);
    let (page, categories) = futures_util::join!(
        client.list_page(query.page(), data.config.page_size),
        client.categories()
    );
    HttpResponse::Ok().json(ListingView::new(section, &page, categories))
}

/// A single item with the most recent others.
#[utoipa::path(
    get,
    path = "/blog/{slug}",
    tag = "content",
    params(("slug" = String, Path, description = "Item slug")),
    responses(
        (status = 200, description = "Item view model", body = ItemView),
        (status = 404, description = "No such item", body = NotFoundView),
    )
)]
pub async fn show_item(
    req: HttpRequest,
    section: web::Data<Section>,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    let section = **section;
    let slug = path.into_inner();
    let (item, recent) = data.client(section).item_with_recent(&slug, RECENT_ITEMS).await;
    match item {
        Lookup::Found(item) => HttpResponse::Ok().json(ItemView {
            section,
            recent: recent.iter().map(|r| ItemSummary::from_item(section, r)).collect(),
            item,
        }),
        Lookup::NotFound => content_not_found(&req, section),
    }
}

/// Items in a category.
#[utoipa::path(
    get,
    path = "/blog/category/{slug}",
    tag = "content",
    params(("slug" = String, Path, description = "Category slug"), PageQuery),
    responses(
        (status = 200, description = "Category with one page of items", body = TermView),
        (status = 404, description = "No such category", body = NotFoundView),
    )
)]
pub async fn list_category(
    req: HttpRequest,
    section: web::Data<Section>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let section = **section;
    let found = data
        .client(section)
        .list_by_category(&path, query.page(), data.config.page_size)
        .await;
    match found {
        Lookup::Found(tp) => HttpResponse::Ok().json(TermView::new(section, "category", tp.term, &tp.page)),
        Lookup::NotFound => content_not_found(&req, section),
    }
}

/// Items carrying a tag.
#[utoipa::path(
    get,
    path = "/blog/tag/{slug}",
    tag = "content",
    params(("slug" = String, Path, description = "Tag slug"), PageQuery),
    responses(
        (status = 200, description = "Tag with one page of items", body = TermView),
        (status = 404, description = "No such tag", body = NotFoundView),
    )
)]
pub async fn list_tag(
    req: HttpRequest,
    section: web::Data<Section>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let section = **section;
    let found = data
        .client(section)
        .list_by_tag(&path, query.page(), data.config.page_size)
        .await;
    match found {
        Lookup::Found(tp) => HttpResponse::Ok().json(TermView::new(section, "tag", tp.term, &tp.page)),
        Lookup::NotFound => content_not_found(&req, section),
    }
}

/// Full-text search within a section.
#[utoipa::path(
    get,
    path = "/blog/search",
    tag = "content",
    params(SearchQuery),
    responses(
        (status = 200, description = "Prompt or results", body = SearchView),
    )
)]
pub async fn search_items(
    section: web::Data<Section>,
    query: web::Query<SearchQuery>,
    data: web::Data<AppState>,
) -> impl Responder {
    let section = **section;
    let text = query.q.as_deref().unwrap_or_default();
    let outcome = data
        .client(section)
        .search(text, query.page.unwrap_or(1), data.config.page_size)
        .await;
    let view = match outcome {
        SearchOutcome::NoQuery => SearchView::prompt(section),
        SearchOutcome::Results { query, page } => SearchView::results(section, query, &page),
    };
    HttpResponse::Ok().json(view)
}

fn content_not_found(req: &HttpRequest, section: Section) -> HttpResponse {
    HttpResponse::NotFound().json(NotFoundView {
        message: t!("content.not_found").to_string(),
        path: req.path().to_string(),
        home: section.base_path().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Site endpoints
// ---------------------------------------------------------------------------

/// Switch the visitor's locale.
///
/// Stores the preference and redirects to the posted page under the new
/// locale.
#[utoipa::path(
    post,
    path = "/api/locale",
    tag = "site",
    request_body = SwitchLocaleRequest,
    responses(
        (status = 303, description = "Preference stored; Location holds the new path"),
        (status = 400, description = "Unknown locale or path without a locale", body = ErrorResponse),
    )
)]
pub async fn switch_locale(
    req: HttpRequest,
    body: web::Json<SwitchLocaleRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let config = &data.config;
    let Some(target) = config.locales.get(&body.locale).cloned() else {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: t!("api.unknown_locale", code = &body.locale).to_string(),
        });
    };

    // Start from the default and follow the posted page to its locale.
    let mut ctx = LocaleContext::new(
        Arc::clone(&config.locales),
        config.locales.default_locale().clone(),
        CookiePreferences::from_request(&req),
        config.locale_cookie.clone(),
    );
    if ctx.on_path_change(&body.path).is_none() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: t!("api.path_without_locale", path = &body.path).to_string(),
        });
    }
    let location = match ctx.switch_locale(target.as_str(), &body.path) {
        Some(location) => location,
        None => {
            // Already active: refresh the preference and stay.
            ctx.store().set(&config.locale_cookie, target.as_str());
            ctx.href(&ctx.path_within_locale(&body.path))
        }
    };

    log::info!("locale switched to {} ({})", target, location);
    let mut response = HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish();
    if let Err(err) = ctx.store().apply(&mut response) {
        log::warn!("could not attach preference cookie: {}", err);
    }
    response
}

/// XML site map of every page.
#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = "site",
    responses(
        (status = 200, description = "Site map", content_type = "application/xml"),
        (status = 500, description = "Site map could not be rendered", body = ErrorResponse),
    )
)]
pub async fn sitemap_xml(data: web::Data<AppState>) -> impl Responder {
    let urls = sitemap::collect_entries(&data.config, &[&data.blog, &data.help_center]).await;
    match sitemap::render_xml(&urls) {
        Ok(xml) => HttpResponse::Ok().content_type("application/xml").body(xml),
        Err(err) => {
            log::error!("sitemap rendering failed: {}", err);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: t!("api.sitemap_failed").to_string(),
            })
        }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "site",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn openapi_json() -> impl Responder {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

// ---------------------------------------------------------------------------
// Route configuration
// ---------------------------------------------------------------------------

fn section_scope(section: Section) -> actix_web::Scope {
    web::scope(section.base_path())
        .app_data(web::Data::new(section))
        .route("", web::get().to(list_items))
        .route("/", web::get().to(list_items))
        .route("/search", web::get().to(search_items))
        .route("/category/{slug}", web::get().to(list_category))
        .route("/tag/{slug}", web::get().to(list_tag))
        .route("/{slug}", web::get().to(show_item))
}

/// Registers every route. Sections and site endpoints come before the
/// catch-all locale routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health))
            .route("/locale", web::post().to(switch_locale)),
    )
    .route("/api-docs/openapi.json", web::get().to(openapi_json))
    .route("/sitemap.xml", web::get().to(sitemap_xml));

    for section in Section::ALL {
        cfg.service(section_scope(section));
    }

    cfg.route("/{locale}", web::get().to(show_page))
        .route("/{locale}/{tail:.*}", web::get().to(show_page))
        .default_service(web::to(not_found));
}
