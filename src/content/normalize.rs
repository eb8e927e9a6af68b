//! Adapter from the WordPress REST shape to the local content schema.
//!
//! Rich text passes through as rendered markup. Author, dates and taxonomy
//! are reshaped; a missing author becomes [`Author::placeholder`].

use chrono::{DateTime, NaiveDateTime, Utc};

use super::model::{Author, ContentItem, Term};
use super::source::{RemoteAuthor, RemotePost, RemoteTerm};
use crate::config::CmsNamespace;

/// Avatar sizes tried in order of preference.
const AVATAR_SIZES: &[&str] = &["96", "48", "24"];

/// Converts a remote item into a [`ContentItem`].
pub fn normalize_post(post: &RemotePost, namespace: &CmsNamespace) -> ContentItem {
    let embedded = post.embedded.clone().unwrap_or_default();

    let category_ids = post.term_ids(&namespace.categories);
    let tag_ids = post.term_ids(&namespace.tags);
    let mut categories = Vec::new();
    let mut tags = Vec::new();
    for term in embedded.terms.iter().flatten() {
        match classify_term(term, &category_ids, &tag_ids) {
            Some(TermSlot::Category) => categories.push(normalize_term(term)),
            Some(TermSlot::Tag) => tags.push(normalize_term(term)),
            None => {}
        }
    }

    let author = embedded
        .author
        .first()
        .and_then(normalize_author)
        .unwrap_or_else(Author::placeholder);

    let featured_image = embedded
        .featured_media
        .first()
        .and_then(|m| m.source_url.clone())
        .filter(|url| !url.is_empty());

    ContentItem {
        slug: post.slug.clone(),
        title: post.title.rendered.trim().to_string(),
        body: post.content.rendered.clone(),
        excerpt: post.excerpt.rendered.trim().to_string(),
        published_at: post.date_gmt.as_deref().and_then(parse_timestamp),
        updated_at: post.modified_gmt.as_deref().and_then(parse_timestamp),
        categories,
        tags,
        author,
        featured_image,
    }
}

/// Converts a remote term.
pub fn normalize_term(term: &RemoteTerm) -> Term {
    Term {
        slug: term.slug.clone(),
        name: term.name.clone(),
        description: term.description.clone().filter(|d| !d.trim().is_empty()),
        count: term.count,
    }
}

enum TermSlot {
    Category,
    Tag,
}

/// Places an embedded term by the item's id lists. Items that omit the
/// lists fall back to the taxonomy name.
fn classify_term(term: &RemoteTerm, category_ids: &[u64], tag_ids: &[u64]) -> Option<TermSlot> {
    if category_ids.contains(&term.id) {
        return Some(TermSlot::Category);
    }
    if tag_ids.contains(&term.id) {
        return Some(TermSlot::Tag);
    }
    if !category_ids.is_empty() || !tag_ids.is_empty() {
        return None;
    }
    if term.taxonomy.contains("categor") {
        Some(TermSlot::Category)
    } else if term.taxonomy.contains("tag") {
        Some(TermSlot::Tag)
    } else {
        None
    }
}

fn normalize_author(author: &RemoteAuthor) -> Option<Author> {
    let name = author.name.trim();
    if name.is_empty() {
        return None;
    }
    let avatar_url = AVATAR_SIZES
        .iter()
        .find_map(|size| author.avatar_urls.get(*size))
        .cloned();
    Some(Author {
        name: name.to_string(),
        slug: author.slug.clone(),
        avatar_url,
    })
}

/// Parses a CMS timestamp. GMT fields come without an offset; RFC 3339 is
/// accepted as well.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
