//! XML site map.
//!
//! Lists every localized static route and, for each content section, the
//! section index, every item and every category and tag. Content that
//! cannot be enumerated is skipped; the static part is always complete.

use futures_util::StreamExt;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::SiteConfig;
use crate::content::ContentClient;
use crate::locale::localized_path;
use crate::pages::STATIC_PAGES;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Absolute URLs of every locale × static page.
pub fn static_entries(config: &SiteConfig) -> Vec<String> {
    let mut urls = Vec::with_capacity(config.locales.supported().len() * STATIC_PAGES.len());
    for locale in config.locales.supported() {
        for page in STATIC_PAGES {
            urls.push(format!("{}{}", config.site_url, localized_path(locale, page.path)));
        }
    }
    urls
}

/// Relative paths of one section's content.
pub async fn section_entries(client: &ContentClient) -> Vec<String> {
    let base = client.section().base_path();
    let mut paths = vec![base.to_string()];

    let (categories, tags) = futures_util::join!(client.categories(), client.tags());
    paths.extend(client.all_slugs().map(|slug| format!("{}/{}", base, slug)).collect::<Vec<_>>().await);
    paths.extend(categories.iter().map(|t| format!("{}/category/{}", base, t.slug)));
    paths.extend(tags.iter().map(|t| format!("{}/tag/{}", base, t.slug)));
    paths
}

/// Every URL of the site map, static pages first.
pub async fn collect_entries(config: &SiteConfig, clients: &[&ContentClient]) -> Vec<String> {
    let mut urls = static_entries(config);
    for client in clients {
        let paths = section_entries(client).await;
        log::debug!("sitemap: {} entries for {}", paths.len(), client.section());
        urls.extend(paths.into_iter().map(|path| format!("{}{}", config.site_url, path)));
    }
    urls
}

/// Renders a `urlset` document.
pub fn render_xml(urls: &[String]) -> Result<String, String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut emit = |event: Event<'_>| writer.write_event(event).map_err(|e| e.to_string());

    emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    emit(Event::Start(BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)])))?;
    for url in urls {
        emit(Event::Start(BytesStart::new("url")))?;
        emit(Event::Start(BytesStart::new("loc")))?;
        emit(Event::Text(BytesText::new(url)))?;
        emit(Event::End(BytesEnd::new("loc")))?;
        emit(Event::End(BytesEnd::new("url")))?;
    }
    emit(Event::End(BytesEnd::new("urlset")))?;

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// Builds the site map against the live CMS and writes it to `output`, or
/// to stdout when no path is given.
pub async fn run_sitemap(config: &SiteConfig, output: Option<&str>) -> Result<(), String> {
    let blog = ContentClient::wordpress(config.blog.clone(), config.cache, config.fetch_timeout)?;
    let help_center = ContentClient::wordpress(config.help_center.clone(), config.cache, config.fetch_timeout)?;
    let urls = collect_entries(config, &[&blog, &help_center]).await;
    let xml = render_xml(&urls)?;

    match output {
        Some(path) => {
            std::fs::write(path, xml).map_err(|e| format!("failed to write {}: {}", path, e))?;
            log::info!("{}", t!("cli.sitemap_written", count = urls.len(), path = path));
        }
        None => println!("{}", xml),
    }
    Ok(())
}
