//! Type-tag allow-list for YAML deserialization.
//!
//! YAML lets a document attach a *tag* to any node (`!some::Type { ... }`).
//! Formats that resolve tags to types at parse time are a well-known source of
//! deserialization vulnerabilities: a hostile file can ask the parser to build
//! something the application never expected.  Every store therefore carries an
//! explicit set of tags it will accept, and the codec rejects any document
//! containing a tag outside that set.
//!
//! # What counts as a tag name?
//!
//! Local YAML tags are written with a leading `!`.  The allow-list stores and
//! compares names *without* the `!`, so `!my_plugin::Settings` in a document
//! matches the entry `my_plugin::Settings`.

use std::collections::BTreeSet;

/// Predicate deciding whether a type tag found in a document may be accepted.
///
/// Implemented by [`TypeTagAllowList`] and by any `Fn(&str) -> bool`, so tests
/// and callers can pass a closure when a full list is overkill.
pub trait TagInspector {
    /// Returns `true` if a node tagged with `name` may be deserialized.
    fn is_type_allowed(&self, name: &str) -> bool;
}

impl<F> TagInspector for F
where
    F: Fn(&str) -> bool,
{
    fn is_type_allowed(&self, name: &str) -> bool {
        self(name)
    }
}

/// Immutable set of type tags a store accepts.
///
/// Always contains at least the target type's own tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTagAllowList {
    tags: BTreeSet<String>,
}

impl TypeTagAllowList {
    /// Builds the allow-list for a store whose target type is named `target`,
    /// widened by the caller-supplied `extra` tags.
    ///
    /// Leading `!` characters in either argument are ignored.
    pub fn for_target<I, S>(target: &str, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tags: BTreeSet<String> = extra
            .into_iter()
            .map(|tag| normalize(tag.as_ref()).to_string())
            .filter(|tag| !tag.is_empty())
            .collect();
        tags.insert(normalize(target).to_string());
        Self { tags }
    }

    /// Returns `true` if `tag` (with or without a leading `!`) is allowed.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(normalize(tag))
    }

    /// Iterates over the allowed tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Number of allowed tags.  Never zero.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Always `false`: the target tag is always present.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl TagInspector for TypeTagAllowList {
    fn is_type_allowed(&self, name: &str) -> bool {
        self.contains(name)
    }
}

/// Strips the YAML local-tag marker.
pub(crate) fn normalize(tag: &str) -> &str {
    tag.trim_start_matches('!')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
