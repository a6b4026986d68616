// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::contact::{ContactInfo, ContactKey};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberFlags {
    pub founder: bool,
    pub op: bool,
    pub halfop: bool,
    pub voice: bool,
    pub typing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MembershipRecord {
    pub contact: ContactInfo,
    pub is_me: bool,
    pub flags: MemberFlags,
    pub nickname: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub fn new(contact: ContactInfo, is_me: bool) -> Self {
        Self {
            contact,
            is_me,
            flags: MemberFlags::default(),
            nickname: None,
            joined_at: Utc::now(),
        }
    }

    /// The name this member is shown under: their per-conversation nickname,
    /// falling back to the contact's display name.
    pub fn shown_name(&self) -> String {
        self.nickname
            .clone()
            .unwrap_or_else(|| self.contact.name_for_display())
    }
}

/// The members of a conversation, keyed by contact identity in insertion
/// order. Owned exclusively by the conversation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConversationMembers {
    map: IndexMap<ContactKey, MembershipRecord>,
}

impl ConversationMembers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record. Returns false if a member with the same identity
    /// is already present.
    pub fn insert(&mut self, record: MembershipRecord) -> bool {
        let key = record.contact.key();
        if self.map.contains_key(&key) {
            return false;
        }
        self.map.insert(key, record);
        true
    }

    /// Removes the member with the given identity, preserving the order of
    /// the remaining members.
    pub fn remove(&mut self, contact: &ContactInfo) -> Option<MembershipRecord> {
        self.map.shift_remove(&contact.key())
    }

    pub fn get(&self, contact: &ContactInfo) -> Option<&MembershipRecord> {
        self.map.get(&contact.key())
    }

    pub fn get_mut(&mut self, contact: &ContactInfo) -> Option<&mut MembershipRecord> {
        self.map.get_mut(&contact.key())
    }

    pub fn contains(&self, contact: &ContactInfo) -> bool {
        self.map.contains_key(&contact.key())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MembershipRecord> {
        self.map.values()
    }

    /// Members that are not the user themselves, in insertion order.
    pub fn others(&self) -> impl Iterator<Item = &MembershipRecord> {
        self.map.values().filter(|record| !record.is_me)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
