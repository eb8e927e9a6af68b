//! The localized static route table.
//!
//! Every entry is served under each supported locale (`/us/plans`,
//! `/uk/plans`, ...). Copy and layout belong to the presentation layer; the
//! table only names the routes and their kind.

use colored::Colorize;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::SiteConfig;
use crate::content::Section;
use crate::locale::localized_path;

/// Broad grouping of a static page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Landing,
    Product,
    UseCase,
    Company,
    Legal,
}

/// One row of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticPage {
    /// Path within the locale, always starting with `/`.
    pub path: &'static str,
    pub kind: PageKind,
    /// Message key of the page title.
    pub title_key: &'static str,
}

const fn page(path: &'static str, kind: PageKind, title_key: &'static str) -> StaticPage {
    StaticPage { path, kind, title_key }
}

pub const STATIC_PAGES: &[StaticPage] = &[
    page("/", PageKind::Landing, "pages.home"),
    page("/plans", PageKind::Company, "pages.plans"),
    page("/contact", PageKind::Company, "pages.contact"),
    page("/enterprise-demo", PageKind::Company, "pages.enterprise_demo"),
    page("/about", PageKind::Company, "pages.about"),
    page("/products/virtual-staging", PageKind::Product, "pages.virtual_staging"),
    page("/products/room-redesign", PageKind::Product, "pages.room_redesign"),
    page("/products/floor-plans", PageKind::Product, "pages.floor_plans"),
    page("/products/image-enhancement", PageKind::Product, "pages.image_enhancement"),
    page("/use-cases/real-estate-agents", PageKind::UseCase, "pages.real_estate_agents"),
    page("/use-cases/property-developers", PageKind::UseCase, "pages.property_developers"),
    page("/use-cases/interior-designers", PageKind::UseCase, "pages.interior_designers"),
    page("/use-cases/photographers", PageKind::UseCase, "pages.photographers"),
    page("/legal/terms-of-service", PageKind::Legal, "pages.terms_of_service"),
    page("/legal/privacy-policy", PageKind::Legal, "pages.privacy_policy"),
    page("/legal/cookie-policy", PageKind::Legal, "pages.cookie_policy"),
];

/// Looks up a path within a locale. Trailing slashes are ignored.
pub fn find_page(rest: &str) -> Option<&'static StaticPage> {
    let trimmed = rest.trim_end_matches('/');
    let path = if trimmed.is_empty() { "/" } else { trimmed };
    STATIC_PAGES.iter().find(|p| p.path == path)
}

/// Prints the route table for every locale, plus the content sections.
pub fn print_routes(config: &SiteConfig) {
    println!("{}", t!("cli.routes_header").to_string().bold());
    for locale in config.locales.supported() {
        let marker = if locale == config.locales.default_locale() { " (default)" } else { "" };
        println!();
        println!("  {}{}", locale.as_str().cyan().bold(), marker.dimmed());
        for page in STATIC_PAGES {
            println!(
                "    {:<42} {}",
                localized_path(locale, page.path),
                format!("{:?}", page.kind).dimmed()
            );
        }
    }

    println!();
    println!("{}", t!("cli.sections_header").to_string().bold());
    for section in Section::ALL {
        let base = section.base_path();
        let ns = config.namespace(section);
        println!();
        println!("  {} {}", base.green().bold(), ns.api_base.dimmed());
        for route in ["", "/search?q=", "/category/{slug}", "/tag/{slug}", "/{slug}"] {
            println!("    {}{}", base, route);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_page_normalizes_slashes() {
        assert_eq!(find_page("").unwrap().kind, PageKind::Landing);
        assert_eq!(find_page("/").unwrap().kind, PageKind::Landing);
        assert_eq!(find_page("/plans/").unwrap().path, "/plans");
        assert_eq!(find_page("/legal/privacy-policy").unwrap().kind, PageKind::Legal);
        assert!(find_page("/pricing").is_none());
    }

    #[test]
    fn test_paths_are_unique_and_rooted() {
        for (i, a) in STATIC_PAGES.iter().enumerate() {
            assert!(a.path.starts_with('/'));
            assert!(STATIC_PAGES[i + 1..].iter().all(|b| b.path != a.path), "{} twice", a.path);
        }
    }
}
