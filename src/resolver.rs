//! Locale resolution for incoming requests.
//!
//! Every routed page lives under a country prefix (`/us/plans`). Requests
//! that arrive without a valid prefix are redirected before any handler
//! runs; requests with one pass through with the locale attached to the
//! request extensions (see [`crate::context::locale_context`]).
//!
//! The decision itself is the pure [`resolve`] function; [`locale_gate`] is
//! the thin middleware that feeds it the request's path, preference cookie
//! and geo header.

use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{Error, HttpMessage, HttpResponse, web};

use crate::config::SiteConfig;
use crate::context::{ActiveLocale, preference_cookie};
use crate::locale::{Locale, LocaleSet, localized_path, split_first_segment};

/// Path prefixes served without a locale.
pub const EXCLUDED_PREFIXES: &[&str] = &[
    "/static",
    "/assets",
    "/api",
    "/api-docs",
    "/blog",
    "/help-center",
    "/sitemap.xml",
    "/robots.txt",
    "/favicon.ico",
];

/// Returns true for paths the resolver must leave alone: the excluded
/// prefixes and anything that looks like a file.
pub fn is_excluded(path: &str) -> bool {
    let under_prefix = EXCLUDED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    });
    under_prefix || has_file_extension(path)
}

fn has_file_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or_default();
    match last.rfind('.') {
        Some(idx) => idx + 1 < last.len(),
        None => false,
    }
}

/// The request signals the resolver looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveInput<'a> {
    pub path: &'a str,
    /// Raw query string without the leading `?`.
    pub query: Option<&'a str>,
    /// Stored locale preference.
    pub preference: Option<&'a str>,
    /// Two-letter country reported by the edge.
    pub geo: Option<&'a str>,
}

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Not a localized route: hand it on untouched.
    Bypass,
    /// The path carries a supported locale. `rest` is the path within it.
    PassThrough { locale: Locale, rest: String },
    /// Send the client to `location`, which is under `locale`.
    Redirect { locale: Locale, location: String },
}

/// Decides how a request is localized.
pub fn resolve(locales: &LocaleSet, input: &ResolveInput<'_>) -> Resolution {
    if is_excluded(input.path) {
        return Resolution::Bypass;
    }

    let query = match input.query {
        Some(q) if !q.is_empty() => format!("?{}", q),
        _ => String::new(),
    };
    let (segment, rest) = split_first_segment(input.path);

    if let Some(locale) = locales.get(segment) {
        let rest = if rest.is_empty() { "/" } else { rest };
        return Resolution::PassThrough {
            locale: locale.clone(),
            rest: rest.to_string(),
        };
    }

    if !segment.is_empty() && locales.is_locale_segment(segment) {
        // A bare alias or case variant (`/gb`) names a locale; with a
        // suffix every unsupported code falls back to the default.
        let named = if rest.is_empty() { locales.canonicalize(segment) } else { None };
        let locale = named.unwrap_or_else(|| locales.default_locale().clone());
        let location = format!("/{}{}{}", locale, rest, query);
        return Resolution::Redirect { locale, location };
    }

    let locale = detect(locales, input.preference, input.geo);
    let location = format!("{}{}", localized_path(&locale, input.path), query);
    Resolution::Redirect { locale, location }
}

/// Picks a locale for a path that has none: stored preference, then the
/// geo country through the alias table, then the default.
pub fn detect(locales: &LocaleSet, preference: Option<&str>, geo: Option<&str>) -> Locale {
    preference
        .and_then(|code| locales.canonicalize(code))
        .or_else(|| geo.and_then(|code| locales.canonicalize(code)))
        .unwrap_or_else(|| locales.default_locale().clone())
}

/// Request middleware applying [`resolve`].
///
/// Register with `middleware::from_fn(locale_gate)` on an app that carries
/// `web::Data<SiteConfig>`. Every resolved request, redirected or not,
/// refreshes the preference cookie.
pub async fn locale_gate(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let Some(config) = req.app_data::<web::Data<SiteConfig>>().cloned() else {
        log::error!("locale resolver has no site configuration; refusing {}", req.path());
        let response = HttpResponse::InternalServerError().finish();
        return Ok(req.into_response(response).map_into_right_body());
    };

    let preference = req.cookie(&config.locale_cookie).map(|c| c.value().to_string());
    let geo = req
        .headers()
        .get(config.geo_header.as_str())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let resolution = {
        let input = ResolveInput {
            path: req.path(),
            query: Some(req.query_string()),
            preference: preference.as_deref(),
            geo: geo.as_deref(),
        };
        resolve(&config.locales, &input)
    };

    match resolution {
        Resolution::Bypass => Ok(next.call(req).await?.map_into_left_body()),
        Resolution::PassThrough { locale, .. } => {
            let cookie = preference_cookie(&config.locale_cookie, locale.as_str());
            req.extensions_mut().insert(ActiveLocale(locale));
            let mut res = next.call(req).await?;
            res.response_mut().add_cookie(&cookie)?;
            Ok(res.map_into_left_body())
        }
        Resolution::Redirect { locale, location } => {
            log::debug!("redirecting {} to {}", req.path(), location);
            let mut response = HttpResponse::TemporaryRedirect()
                .insert_header((header::LOCATION, location))
                .finish();
            response.add_cookie(&preference_cookie(&config.locale_cookie, locale.as_str()))?;
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::locale_context;
    use crate::test_utils::{sample_config, sample_set};
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use actix_web::{App, HttpRequest, middleware::from_fn};

    fn input(path: &str) -> ResolveInput<'_> {
        ResolveInput {
            path,
            ..Default::default()
        }
    }

    fn redirect_target(resolution: Resolution) -> String {
        match resolution {
            Resolution::Redirect { location, .. } => location,
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_paths() {
        for path in [
            "/blog",
            "/blog/some-post",
            "/help-center/category/billing",
            "/api/health",
            "/api-docs/openapi.json",
            "/sitemap.xml",
            "/static/app.css",
            "/uk/brochure.pdf",
        ] {
            assert!(is_excluded(path), "{} should be excluded", path);
        }
        for path in ["/", "/plans", "/us/plans", "/blogger", "/apis", "/us/v1.", "/us"] {
            assert!(!is_excluded(path), "{} should be routed", path);
        }
    }

    #[test]
    fn test_root_uses_default() {
        let set = sample_set();
        assert_eq!(redirect_target(resolve(&set, &input("/"))), "/us");
    }

    #[test]
    fn test_root_uses_geo_through_alias() {
        let set = sample_set();
        let with_geo = ResolveInput {
            geo: Some("GB"),
            ..input("/")
        };
        assert_eq!(redirect_target(resolve(&set, &with_geo)), "/uk");
        let unknown_geo = ResolveInput {
            geo: Some("zz"),
            ..input("/")
        };
        assert_eq!(redirect_target(resolve(&set, &unknown_geo)), "/us");
    }

    #[test]
    fn test_preference_beats_geo() {
        let set = sample_set();
        let both = ResolveInput {
            preference: Some("au"),
            geo: Some("gb"),
            ..input("/")
        };
        assert_eq!(redirect_target(resolve(&set, &both)), "/au");
        let stale = ResolveInput {
            preference: Some("nz"),
            geo: Some("ca"),
            ..input("/")
        };
        assert_eq!(redirect_target(resolve(&set, &stale)), "/ca");
    }

    #[test]
    fn test_supported_prefix_passes_through() {
        let set = sample_set();
        let ignored_signals = ResolveInput {
            preference: Some("au"),
            geo: Some("gb"),
            ..input("/uk/plans")
        };
        assert_eq!(
            resolve(&set, &ignored_signals),
            Resolution::PassThrough {
                locale: set.get("uk").unwrap().clone(),
                rest: "/plans".into(),
            }
        );
        match resolve(&set, &input("/ca")) {
            Resolution::PassThrough { rest, .. } => assert_eq!(rest, "/"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_every_supported_locale_passes_through() {
        let set = sample_set();
        for locale in set.supported() {
            for rest in ["/", "/plans", "/products/virtual-staging", "/legal/terms-of-service/"] {
                let path = format!("/{}{}", locale, rest);
                assert_eq!(
                    resolve(&set, &input(&path)),
                    Resolution::PassThrough {
                        locale: locale.clone(),
                        rest: rest.to_string(),
                    }
                );
            }
        }
    }

    #[test]
    fn test_bare_alias_serves_aliased_locale() {
        let set = sample_set();
        match resolve(&set, &input("/gb")) {
            Resolution::Redirect { locale, location } => {
                assert_eq!(locale.as_str(), "uk");
                assert_eq!(location, "/uk");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_segments_redirect_to_default() {
        let set = sample_set();
        let alias = ResolveInput {
            query: Some("ref=mail&x=1"),
            ..input("/gb/use-cases/real-estate-agents")
        };
        assert_eq!(
            redirect_target(resolve(&set, &alias)),
            "/us/use-cases/real-estate-agents?ref=mail&x=1"
        );
        assert_eq!(redirect_target(resolve(&set, &input("/US/contact"))), "/us/contact");
        assert_eq!(redirect_target(resolve(&set, &input("/fr/contact"))), "/us/contact");
        assert_eq!(redirect_target(resolve(&set, &input("/fr"))), "/us");
    }

    #[test]
    fn test_unsupported_code_with_suffix_keeps_suffix_under_default() {
        let set = sample_set();
        for code in ["gb", "GB", "Uk", "AU", "fr", "zz"] {
            for suffix in ["/", "/contact", "/products/floor-plans", "/a/b/c/"] {
                let path = format!("/{}{}", code, suffix);
                match resolve(&set, &input(&path)) {
                    Resolution::Redirect { locale, location } => {
                        assert_eq!(locale.as_str(), "us", "{}", path);
                        assert_eq!(location, format!("/us{}", suffix));
                    }
                    other => panic!("{} resolved to {:?}", path, other),
                }
            }
        }
    }

    #[test]
    fn test_unsupported_segment_ignores_preference() {
        let set = sample_set();
        let with_pref = ResolveInput {
            preference: Some("au"),
            ..input("/fr/plans")
        };
        assert_eq!(redirect_target(resolve(&set, &with_pref)), "/us/plans");
    }

    #[test]
    fn test_locale_less_route_gets_prefix() {
        let set = sample_set();
        let with_pref = ResolveInput {
            preference: Some("ca"),
            query: Some("utm=1"),
            ..input("/plans")
        };
        assert_eq!(redirect_target(resolve(&set, &with_pref)), "/ca/plans?utm=1");
        assert_eq!(
            redirect_target(resolve(&set, &input("/legal/privacy-policy"))),
            "/us/legal/privacy-policy"
        );
    }

    #[test]
    fn test_redirect_target_is_stable() {
        let set = sample_set();
        for path in ["/", "/plans", "/gb", "/gb/contact", "/fr", "/US/about"] {
            let target = redirect_target(resolve(&set, &input(path)));
            assert!(
                matches!(resolve(&set, &input(&target)), Resolution::PassThrough { .. }),
                "{} -> {} should settle",
                path,
                target
            );
        }
    }

    async fn echo_locale(req: HttpRequest) -> HttpResponse {
        let ctx = locale_context(&req);
        HttpResponse::Ok().body(ctx.locale().to_string())
    }

    macro_rules! gate_app {
        () => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new(sample_config()))
                    .wrap(from_fn(locale_gate))
                    .route("/blog", web::get().to(|| async { HttpResponse::Ok().body("blog") }))
                    .route("/{locale}", web::get().to(echo_locale))
                    .route("/{locale}/{tail:.*}", web::get().to(echo_locale)),
            )
            .await
        };
    }

    fn locale_cookie(resp: &ServiceResponse<impl MessageBody>) -> Option<String> {
        resp.response()
            .cookies()
            .find(|c| c.name() == "preferred-locale")
            .map(|c| c.value().to_string())
    }

    #[actix_web::test]
    async fn test_gate_redirects_root_and_persists() {
        let app = gate_app!();
        let req = actix_test::TestRequest::get()
            .uri("/?ref=ad")
            .insert_header(("x-vercel-ip-country", "GB"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/uk?ref=ad");
        assert_eq!(locale_cookie(&resp).as_deref(), Some("uk"));
    }

    #[actix_web::test]
    async fn test_gate_passes_through_with_context() {
        let app = gate_app!();
        let req = actix_test::TestRequest::get()
            .uri("/au/plans")
            .cookie(Cookie::new("preferred-locale", "us"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(locale_cookie(&resp).as_deref(), Some("au"));
        let body = actix_test::read_body(resp).await;
        assert_eq!(body, "au");
    }

    #[actix_web::test]
    async fn test_gate_uses_cookie_for_locale_less_path() {
        let app = gate_app!();
        let req = actix_test::TestRequest::get()
            .uri("/contact")
            .cookie(Cookie::new("preferred-locale", "ca"))
            .insert_header(("x-vercel-ip-country", "gb"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/ca/contact");
    }

    #[actix_web::test]
    async fn test_gate_leaves_excluded_paths_alone() {
        let app = gate_app!();
        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/blog").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(locale_cookie(&resp).is_none());
        let body = actix_test::read_body(resp).await;
        assert_eq!(body, "blog");
    }
}
