//! Country locales served by the site.
//!
//! A locale is a short country code (`us`, `uk`, ...) used purely as a
//! routing and content-selection key. The configured [`LocaleSet`] knows
//! which codes are supported, which one is the default, and which foreign
//! codes alias onto a supported one (ISO `gb` is served as `uk`).

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use utoipa::ToSchema;

/// A validated, lowercase locale code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of locales a deployment serves.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    supported: Vec<Locale>,
    default: Locale,
    aliases: HashMap<String, Locale>,
}

impl LocaleSet {
    /// Builds a locale set, validating that the default and every alias
    /// target are supported codes.
    pub fn new(codes: &[String], default: &str, aliases: &[(String, String)]) -> Result<Self, String> {
        let mut supported: Vec<Locale> = Vec::new();
        for code in codes {
            let code = normalize_code(code);
            if !is_code_shaped(&code) {
                return Err(format!("invalid locale code '{}'", code));
            }
            if !supported.iter().any(|l| l.0 == code) {
                supported.push(Locale(code));
            }
        }
        if supported.is_empty() {
            return Err("at least one locale must be supported".to_string());
        }

        let default_code = normalize_code(default);
        let default = supported
            .iter()
            .find(|l| l.0 == default_code)
            .cloned()
            .ok_or_else(|| format!("default locale '{}' is not in the supported set", default_code))?;

        let mut alias_map = HashMap::new();
        for (from, to) in aliases {
            let to_code = normalize_code(to);
            let target = supported
                .iter()
                .find(|l| l.0 == to_code)
                .cloned()
                .ok_or_else(|| format!("alias target '{}' is not a supported locale", to_code))?;
            alias_map.insert(normalize_code(from), target);
        }

        Ok(Self {
            supported,
            default,
            aliases: alias_map,
        })
    }

    /// All supported locales, in configuration order.
    pub fn supported(&self) -> &[Locale] {
        &self.supported
    }

    /// The fallback locale.
    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// Exact lookup. Only canonical (lowercase, supported) codes match.
    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.supported.iter().find(|l| l.0 == code)
    }

    /// Maps any spelling of a code onto a supported locale: case and `_`
    /// are normalized, then aliases are applied.
    pub fn canonicalize(&self, code: &str) -> Option<Locale> {
        let code = normalize_code(code);
        if let Some(locale) = self.get(&code) {
            return Some(locale.clone());
        }
        self.aliases.get(&code).cloned()
    }

    /// Returns true when a path segment should be read as a locale code,
    /// supported or not.
    pub fn is_locale_segment(&self, segment: &str) -> bool {
        is_code_shaped(segment) || self.canonicalize(segment).is_some()
    }
}

/// Lowercases and unifies separators (`en_GB` → `en-gb`).
fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_lowercase().replace('_', "-")
}

/// Two ASCII letters: the shape of a country code.
fn is_code_shaped(segment: &str) -> bool {
    segment.len() == 2 && segment.bytes().all(|b| b.is_ascii_alphabetic())
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Splits a site-relative path into its first segment and the remainder.
///
/// The remainder keeps its leading slash and is empty when the path has a
/// single segment: `/us/plans` → `("us", "/plans")`, `/us` → `("us", "")`.
pub fn split_first_segment(path: &str) -> (&str, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    }
}

/// Prefixes a site-relative path with a locale.
///
/// This is the only place the prefixing rule lives. The root path maps to
/// `/<locale>` with no trailing segment.
pub fn localized_path(locale: &Locale, path: &str) -> String {
    let rest = path.trim_start_matches('/');
    if rest.is_empty() {
        format!("/{}", locale)
    } else {
        format!("/{}/{}", locale, rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_set;

    #[test]
    fn test_canonicalize_alias_and_case() {
        let set = sample_set();
        assert_eq!(set.canonicalize("gb").unwrap().as_str(), "uk");
        assert_eq!(set.canonicalize("GB").unwrap().as_str(), "uk");
        assert_eq!(set.canonicalize("AU").unwrap().as_str(), "au");
        assert!(set.canonicalize("fr").is_none());
    }

    #[test]
    fn test_get_is_exact() {
        let set = sample_set();
        assert!(set.get("us").is_some());
        assert!(set.get("US").is_none());
        assert!(set.get("gb").is_none());
    }

    #[test]
    fn test_rejects_unknown_default() {
        let err = LocaleSet::new(&["us".into()], "uk", &[]).unwrap_err();
        assert!(err.contains("default locale"));
    }

    #[test]
    fn test_rejects_alias_to_unsupported() {
        let err = LocaleSet::new(&["us".into()], "us", &[("gb".into(), "uk".into())]).unwrap_err();
        assert!(err.contains("alias target"));
    }

    #[test]
    fn test_locale_segment_shape() {
        let set = sample_set();
        assert!(set.is_locale_segment("fr"));
        assert!(set.is_locale_segment("gb"));
        assert!(!set.is_locale_segment("plans"));
        assert!(!set.is_locale_segment(""));
    }

    #[test]
    fn test_split_first_segment() {
        assert_eq!(split_first_segment("/us/plans/pro"), ("us", "/plans/pro"));
        assert_eq!(split_first_segment("/us"), ("us", ""));
        assert_eq!(split_first_segment("/"), ("", ""));
        assert_eq!(split_first_segment("/us/"), ("us", "/"));
    }

    #[test]
    fn test_localized_path() {
        let set = sample_set();
        let uk = set.get("uk").unwrap();
        assert_eq!(localized_path(uk, "/"), "/uk");
        assert_eq!(localized_path(uk, ""), "/uk");
        assert_eq!(localized_path(uk, "/contact"), "/uk/contact");
        assert_eq!(localized_path(uk, "plans"), "/uk/plans");
    }
}
