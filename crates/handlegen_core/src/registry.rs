//! Shareable metadata for the `handlegen_core` registries.
//!
//! Every vocabulary in this crate (annotations, marshal kinds, diagnostics) is a `const` table of entries that share
//! the same core fields. This module provides that shape.
//!
//! ## Notes
//! - These types are intentionally lightweight and `Copy`-friendly so registries can live in `const` tables.
//! - Metadata is meant for tooling, docs and diagnostics; enforcement of the rules lives in the generators.

/// Identify the handlegen version a vocabulary item is available since.
///
/// ## Examples
/// ```rust
/// use handlegen_core::registry::SinceVersion;
///
/// let since: SinceVersion = "0.1.0";
/// assert!(!since.is_empty());
/// ```
pub type SinceVersion = &'static str;

/// Describe the lifecycle status of a vocabulary item.
///
/// ## Notes
/// - This is intended for docs/tooling (e.g. to flag deprecated spellings), not for feature-gating by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    Stable,
    Draft,
    Deprecated,
}

/// Shared metadata shape for registry items.
///
/// - stable identity (`id`)
/// - accepted spellings (`canonical` + `aliases`)
/// - documentation (`description`)
/// - provenance (`since_version`, `stability`)
///
/// Registries that need extra per-item data (e.g. a diagnostic code) wrap this struct in their own info type.
#[derive(Debug, Clone, Copy)]
pub struct ItemInfo<Id> {
    pub id: Id,
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub since_version: Option<SinceVersion>,
    pub stability: Stability,
}

impl<Id> ItemInfo<Id> {
    /// Check whether `name` is the canonical spelling or one of the aliases.
    pub fn matches(&self, name: &str) -> bool {
        self.canonical == name || self.aliases.contains(&name)
    }
}

/// Look up an item by canonical spelling first, then by alias.
///
/// Canonical spellings win so an alias can never shadow another item's canonical name.
pub fn lookup<Id: Copy>(table: &[ItemInfo<Id>], name: &str) -> Option<Id> {
    if let Some(info) = table.iter().find(|i| i.canonical == name) {
        return Some(info.id);
    }
    table.iter().find(|i| i.aliases.contains(&name)).map(|i| i.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Id {
        A,
        B,
    }

    const TABLE: &[ItemInfo<Id>] = &[
        ItemInfo {
            id: Id::A,
            canonical: "a",
            aliases: &["b"],
            description: "first",
            since_version: None,
            stability: Stability::Stable,
        },
        ItemInfo {
            id: Id::B,
            canonical: "b",
            aliases: &[],
            description: "second",
            since_version: None,
            stability: Stability::Stable,
        },
    ];

    #[test]
    fn canonical_spelling_wins_over_alias() {
        assert_eq!(lookup(TABLE, "b"), Some(Id::B));
        assert_eq!(lookup(TABLE, "a"), Some(Id::A));
        assert_eq!(lookup(TABLE, "c"), None);
    }

    #[test]
    fn matches_checks_aliases() {
        assert!(TABLE[0].matches("b"));
        assert!(!TABLE[1].matches("a"));
    }
}
