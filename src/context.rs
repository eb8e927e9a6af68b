//! Per-request locale context.
//!
//! The resolver middleware stores the active locale in the request
//! extensions. Handlers turn that into a [`LocaleContext`] with
//! [`locale_context`], which is the only sanctioned way to build
//! locale-prefixed links. The preference is persisted through the small
//! [`PreferenceStore`] key-value interface so it can be backed by cookies
//! in the server and by memory in tests.

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, web};
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use utoipa::ToSchema;

use crate::config::SiteConfig;
use crate::content::Section;
use crate::locale::{Locale, LocaleSet, localized_path, split_first_segment};

/// Lifetime of the preference cookie.
pub const PREFERENCE_MAX_AGE_DAYS: i64 = 365;

// ---------------------------------------------------------------------------
// Preference persistence
// ---------------------------------------------------------------------------

/// A site-wide preference cookie living for a year.
pub fn preference_cookie(name: &str, value: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), value.to_string())
        .path("/")
        .max_age(CookieDuration::days(PREFERENCE_MAX_AGE_DAYS))
        .same_site(SameSite::Lax)
        .finish()
}

/// Durable key-value storage for user preferences. Last write wins.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<HashMap<String, String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }
}

/// Cookie-backed store for one request.
///
/// Reads come from the request's cookies; writes are queued as
/// `Set-Cookie` headers for the response (site-wide path, one year).
#[derive(Debug, Default)]
pub struct CookiePreferences {
    values: RefCell<HashMap<String, String>>,
    pending: RefCell<Vec<Cookie<'static>>>,
}

impl CookiePreferences {
    pub fn from_request(req: &HttpRequest) -> Self {
        let values = match req.cookies() {
            Ok(cookies) => cookies
                .iter()
                .map(|c| (c.name().to_string(), c.value().to_string()))
                .collect(),
            Err(err) => {
                log::debug!("ignoring unparsable cookie header: {}", err);
                HashMap::new()
            }
        };
        Self {
            values: RefCell::new(values),
            pending: RefCell::new(Vec::new()),
        }
    }

    /// Queued cookies, leaving the queue empty.
    pub fn take_cookies(&self) -> Vec<Cookie<'static>> {
        std::mem::take(&mut *self.pending.borrow_mut())
    }

    /// Writes queued cookies onto a response.
    pub fn apply(&self, response: &mut HttpResponse) -> Result<(), actix_web::http::Error> {
        for cookie in self.take_cookies() {
            response.add_cookie(&cookie)?;
        }
        Ok(())
    }
}

impl PreferenceStore for CookiePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        let cookie = preference_cookie(key, value);
        let mut pending = self.pending.borrow_mut();
        pending.retain(|c| c.name() != key);
        pending.push(cookie);
    }
}

// ---------------------------------------------------------------------------
// Locale context
// ---------------------------------------------------------------------------

/// The locale chosen by the resolver for the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLocale(pub Locale);

/// Destinations linked from every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CommonLinks {
    pub home: String,
    pub contact: String,
    pub plans: String,
    pub enterprise_demo: String,
    pub blog: String,
    pub help_center: String,
}

/// A page's equivalent under another locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Alternate {
    pub locale: Locale,
    pub href: String,
}

/// Locale state for one render.
pub struct LocaleContext<S: PreferenceStore> {
    locales: Arc<LocaleSet>,
    locale: Locale,
    store: S,
    preference_key: String,
}

impl<S: PreferenceStore> LocaleContext<S> {
    pub fn new(locales: Arc<LocaleSet>, locale: Locale, store: S, preference_key: impl Into<String>) -> Self {
        Self {
            locales,
            locale,
            store,
            preference_key: preference_key.into(),
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// `path` under the active locale.
    pub fn href(&self, path: &str) -> String {
        localized_path(&self.locale, path)
    }

    pub fn links(&self) -> CommonLinks {
        CommonLinks {
            home: self.href("/"),
            contact: self.href("/contact"),
            plans: self.href("/plans"),
            enterprise_demo: self.href("/enterprise-demo"),
            blog: Section::Blog.base_path().to_string(),
            help_center: Section::HelpCenter.base_path().to_string(),
        }
    }

    /// `path` under every supported locale.
    pub fn alternates(&self, path: &str) -> Vec<Alternate> {
        self.locales
            .supported()
            .iter()
            .map(|locale| Alternate {
                locale: locale.clone(),
                href: localized_path(locale, path),
            })
            .collect()
    }

    /// Strips the active locale's prefix from a site path.
    pub fn path_within_locale(&self, path: &str) -> String {
        let (segment, rest) = split_first_segment(path);
        if segment == self.locale.as_str() {
            if rest.is_empty() { "/".to_string() } else { rest.to_string() }
        } else {
            path.to_string()
        }
    }

    /// Re-reads the locale from a newly active path and reports whether it
    /// changed. `None` when the path carries no supported locale, which
    /// leaves the context untouched.
    pub fn on_path_change(&mut self, path: &str) -> Option<bool> {
        let (segment, _) = split_first_segment(path);
        let locale = self.locales.get(segment)?;
        if *locale == self.locale {
            return Some(false);
        }
        self.locale = locale.clone();
        self.store.set(&self.preference_key, self.locale.as_str());
        Some(true)
    }

    /// Switches to another supported locale and returns where to navigate:
    /// the current page under the new locale. `None` when the code is not
    /// supported or already active.
    pub fn switch_locale(&mut self, code: &str, current_path: &str) -> Option<String> {
        let next = self.locales.get(code)?.clone();
        if next == self.locale {
            return None;
        }
        let within = self.path_within_locale(current_path);
        self.locale = next;
        self.store.set(&self.preference_key, self.locale.as_str());
        Some(self.href(&within))
    }
}

/// Builds the locale context for a request that passed the resolver.
///
/// # Panics
///
/// Panics when the route is not wrapped by the locale resolver or the site
/// configuration is not registered. Both are wiring defects.
pub fn locale_context(req: &HttpRequest) -> LocaleContext<CookiePreferences> {
    let active = req.extensions().get::<ActiveLocale>().cloned();
    let Some(ActiveLocale(locale)) = active else {
        panic!(
            "locale context requested for {} outside the locale resolver; wrap the route with resolver::locale_gate",
            req.path()
        );
    };
    let Some(config) = req.app_data::<web::Data<SiteConfig>>() else {
        panic!("locale context requires web::Data<SiteConfig> to be registered");
    };
    LocaleContext::new(
        Arc::clone(&config.locales),
        locale,
        CookiePreferences::from_request(req),
        config.locale_cookie.clone(),
    )
}
