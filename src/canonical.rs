//! Class-identity canonicalization.
//!
//! Runtime environments wrap objects in generated proxies whose class ids
//! carry environment-specific prefixes (lazy-loading proxies, test
//! doubles). Every class comparison in the kernel goes through
//! [`ClassCanonicalizer::canonicalize`] first so that a proxied instance
//! and its real class compare equal.

use regex_lite::Regex;

use crate::introspect::ClassId;

/// Default wrapper-marker pattern: strips any leading segment chain ending
/// in a `__proxy__.` or `__mock__.` marker.
const DEFAULT_MARKER_PATTERN: &str = r"^.*__(?:proxy|mock)__\.";

/// Strips wrapper-proxy prefixes off raw class ids.
#[derive(Debug, Clone)]
pub struct ClassCanonicalizer {
    pattern: Regex,
}

impl ClassCanonicalizer {
    /// Canonicalizer with the default proxy/mock markers.
    pub fn new() -> Self {
        Self {
            // The default pattern is a compile-time constant; it always
            // parses.
            pattern: Regex::new(DEFAULT_MARKER_PATTERN).unwrap(),
        }
    }

    /// Canonicalizer stripping custom marker segments.
    ///
    /// Each marker is matched literally as a `marker.` segment prefix;
    /// everything up to and including the last marker occurrence is
    /// stripped.
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let escaped: Vec<String> = markers
            .into_iter()
            .map(|m| escape_literal(m.as_ref()))
            .collect();
        let pattern = format!(r"^.*(?:{})\.", escaped.join("|"));
        match Regex::new(&pattern) {
            Ok(pattern) => Self { pattern },
            Err(_) => Self::new(),
        }
    }

    /// Canonicalize a raw class id.
    pub fn canonicalize(&self, raw: &str) -> ClassId {
        let trimmed = raw.trim();
        let stripped = self
            .pattern
            .find(trimmed)
            .map(|m| &trimmed[m.end()..])
            .unwrap_or(trimmed);
        ClassId::new(stripped)
    }

    /// Canonicalize an existing class id (idempotent on canonical ids).
    pub fn canonicalize_id(&self, id: &ClassId) -> ClassId {
        self.canonicalize(id.as_str())
    }

    /// Whether two raw class ids denote the same canonical class.
    pub fn same_class(&self, a: &ClassId, b: &ClassId) -> bool {
        self.canonicalize_id(a) == self.canonicalize_id(b)
    }
}

impl Default for ClassCanonicalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if !c.is_alphanumeric() && c != '_' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
