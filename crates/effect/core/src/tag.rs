//! Hierarchical tags and the small set algebra effects need.
//!
//! A tag is a dot-separated identifier such as `State.Stunned` or
//! `Effect.Debuff.Poison`. A tag *matches* a query when it is the query itself
//! or one of its descendants, so an owner carrying `State.Stunned` satisfies a
//! gate asking for `State`.
//!
//! Containers are ordered sets. Iteration order is lexical and therefore
//! identical across runs, which keeps every scan that walks a container
//! replay-deterministic.

use std::collections::BTreeSet;
use std::fmt;

/// A single hierarchical identifier.
///
/// The empty tag is the "unset" value: [`Tag::is_valid`] returns false for it
/// and it never matches anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Tag(String);

impl Tag {
    /// Hierarchy separator.
    pub const SEPARATOR: char = '.';

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The unset tag.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this tag names something.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }

    /// Returns true if `self` is `query` or a descendant of it.
    ///
    /// ```
    /// # use effect_core::Tag;
    /// let stunned = Tag::new("State.Stunned");
    /// assert!(stunned.matches(&Tag::new("State")));
    /// assert!(stunned.matches(&Tag::new("State.Stunned")));
    /// assert!(!stunned.matches(&Tag::new("State.Stun")));
    /// assert!(!Tag::new("State").matches(&stunned));
    /// ```
    pub fn matches(&self, query: &Tag) -> bool {
        if !self.is_valid() || !query.is_valid() {
            return false;
        }
        match self.0.strip_prefix(query.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(Self::SEPARATOR),
            None => false,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered set of tags.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TagContainer {
    tags: BTreeSet<Tag>,
}

impl TagContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tag. Invalid (empty) tags are ignored.
    ///
    /// Returns true if the tag was not already present.
    pub fn insert(&mut self, tag: Tag) -> bool {
        tag.is_valid() && self.tags.insert(tag)
    }

    pub fn remove(&mut self, tag: &Tag) -> bool {
        self.tags.remove(tag)
    }

    /// Exact membership.
    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// Hierarchical membership: some tag in the container matches `query`.
    pub fn has_tag(&self, query: &Tag) -> bool {
        self.tags.iter().any(|tag| tag.matches(query))
    }

    /// Hierarchical intersection test against every tag of `queries`.
    pub fn has_any(&self, queries: &TagContainer) -> bool {
        queries.iter().any(|query| self.has_tag(query))
    }

    /// Exact intersection test.
    pub fn has_any_exact(&self, other: &TagContainer) -> bool {
        other.iter().any(|tag| self.contains(tag))
    }

    /// Removes every tag that also appears (exactly) in `other`.
    pub fn remove_all(&mut self, other: &TagContainer) {
        self.tags.retain(|tag| !other.contains(tag));
    }

    /// Returns the tags of `self` that are not in `other`.
    pub fn difference(&self, other: &TagContainer) -> TagContainer {
        self.tags
            .iter()
            .filter(|tag| !other.contains(tag))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagContainer {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut container = Self::new();
        for tag in iter {
            container.insert(tag);
        }
        container
    }
}

impl<'a> FromIterator<&'a str> for TagContainer {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Tag::new).collect()
    }
}

impl<'a> IntoIterator for &'a TagContainer {
    type Item = &'a Tag;
    type IntoIter = std::collections::btree_set::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}

impl Extend<Tag> for TagContainer {
    fn extend<I: IntoIterator<Item = Tag>>(&mut self, iter: I) {
        for tag in iter {
            self.insert(tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> TagContainer {
        names.iter().copied().collect()
    }

    #[test]
    fn empty_tag_never_matches() {
        assert!(!Tag::empty().matches(&Tag::empty()));
        assert!(!Tag::new("State").matches(&Tag::empty()));
        assert!(!Tag::empty().is_valid());
    }

    #[test]
    fn container_ignores_invalid_tags() {
        let mut container = TagContainer::new();
        assert!(!container.insert(Tag::empty()));
        assert!(container.insert(Tag::new("State.Grounded")));
        assert!(!container.insert(Tag::new("State.Grounded")));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn has_any_is_hierarchical() {
        let active = tags(&["State.Stunned", "Movement.Grounded"]);
        assert!(active.has_any(&tags(&["State"])));
        assert!(active.has_any(&tags(&["Other", "Movement.Grounded"])));
        assert!(!active.has_any(&tags(&["State.Rooted"])));
        assert!(!active.has_any(&TagContainer::new()));
    }

    #[test]
    fn exact_intersection_does_not_follow_hierarchy() {
        let granted = tags(&["State.Stunned"]);
        assert!(!granted.has_any_exact(&tags(&["State"])));
        assert!(granted.has_any_exact(&tags(&["State.Stunned", "X"])));
    }

    #[test]
    fn difference_and_remove_all() {
        let mut base = tags(&["A", "B", "C"]);
        assert_eq!(base.difference(&tags(&["B"])), tags(&["A", "C"]));

        base.remove_all(&tags(&["A", "C", "D"]));
        assert_eq!(base, tags(&["B"]));
    }

    #[test]
    fn iteration_is_lexically_ordered() {
        let container = tags(&["Zeta", "Alpha", "Mid"]);
        let order: Vec<&str> = container.iter().map(Tag::as_str).collect();
        assert_eq!(order, ["Alpha", "Mid", "Zeta"]);
    }
}
