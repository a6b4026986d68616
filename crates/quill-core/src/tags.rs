// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use indexmap::IndexSet;

/// An ordered set of string tags.
///
/// Tags are either bare names (`"favorite"`) or `name:value` pairs
/// (`"color:rebeccapurple"`). Insertion order is preserved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tags {
    tags: IndexSet<String>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag. Returns false if the tag was already present.
    pub fn add(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Removes a tag. Returns false if the tag was not present.
    pub fn remove(&mut self, tag: &str) -> bool {
        self.tags.shift_remove(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns the value of the first `name:value` tag with the given name.
    /// A bare tag with that name yields an empty value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.tags.iter().find_map(|tag| {
            if tag == name {
                return Some("");
            }
            tag.strip_prefix(name)?.strip_prefix(':')
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
