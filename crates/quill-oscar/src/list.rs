// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use bytes::{BufMut, Bytes, BytesMut};

use crate::item::{tlv_kinds, SsiItem, SsiItemKind};

/// The local mirror of the server-stored item list, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SsiList {
    items: Vec<SsiItem>,
}

impl SsiList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[SsiItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts an item as parsed off the wire, ids and all.
    pub fn insert(&mut self, item: SsiItem) {
        self.items.push(item);
    }

    /// Adds a new item, assigning fresh ids: a globally fresh `group_id`
    /// for groups, otherwise a `buddy_id` unique within the parent group.
    /// Returns `(group_id, buddy_id)` of the new item.
    pub fn add(
        &mut self,
        name: Option<String>,
        kind: SsiItemKind,
        parent_group: Option<u16>,
    ) -> (u16, u16) {
        let mut item = SsiItem::new(name, 0, 0, kind);

        if kind == SsiItemKind::Group {
            if item.name.is_some() {
                loop {
                    item.group_id = item.group_id.wrapping_add(1);
                    if !self.items.iter().any(|i| i.group_id == item.group_id) {
                        break;
                    }
                }
            }
        } else {
            item.group_id = parent_group.unwrap_or(0);
            loop {
                item.buddy_id = item.buddy_id.wrapping_add(1);
                if !self
                    .items
                    .iter()
                    .any(|i| i.buddy_id == item.buddy_id && i.group_id == item.group_id)
                {
                    break;
                }
            }
        }

        let ids = (item.group_id, item.buddy_id);
        self.items.push(item);
        ids
    }

    pub fn remove(&mut self, group_id: u16, buddy_id: u16) -> Option<SsiItem> {
        let position = self
            .items
            .iter()
            .position(|i| i.group_id == group_id && i.buddy_id == buddy_id)?;
        Some(self.items.remove(position))
    }

    pub fn find(&self, group_id: u16, buddy_id: u16) -> Option<&SsiItem> {
        self.items
            .iter()
            .find(|i| i.group_id == group_id && i.buddy_id == buddy_id)
    }

    pub fn find_mut(&mut self, group_id: u16, buddy_id: u16) -> Option<&mut SsiItem> {
        self.items
            .iter_mut()
            .find(|i| i.group_id == group_id && i.buddy_id == buddy_id)
    }

    /// Finds an item by group name, item name and kind. With no names at
    /// all, the first item of the kind wins (how the singleton pd-info and
    /// presence items are looked up).
    pub fn find_item(
        &self,
        group_name: Option<&str>,
        name: Option<&str>,
        kind: SsiItemKind,
    ) -> Option<&SsiItem> {
        match (group_name, name) {
            (Some(group_name), Some(name)) => {
                let group = self.find_item(None, Some(group_name), SsiItemKind::Group)?;
                self.items.iter().find(|i| {
                    i.kind == kind
                        && i.group_id == group.group_id
                        && i.name.as_deref() == Some(name)
                })
            }
            (None, Some(name)) => self
                .items
                .iter()
                .find(|i| i.kind == kind && i.name.as_deref() == Some(name)),
            (_, None) => self.items.iter().find(|i| i.kind == kind),
        }
    }

    /// The group containing the named buddy.
    pub fn find_parent(&self, buddy_name: &str) -> Option<&SsiItem> {
        let buddy = self.find_item(None, Some(buddy_name), SsiItemKind::Buddy)?;
        self.items
            .iter()
            .find(|i| i.kind == SsiItemKind::Group && i.group_id == buddy.group_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &SsiItem> {
        self.items.iter().filter(|i| i.kind == SsiItemKind::Group)
    }

    /// Regenerates the group's membership summary: the ordered child ids as
    /// a big-endian `u16` run in the `0x00C8` TLV. A group with no children
    /// loses the TLV entirely.
    pub fn rebuild_group(&mut self, group_id: u16) {
        let members = self.group_member_ids(group_id);

        let Some(group) = self
            .items
            .iter_mut()
            .find(|i| i.kind == SsiItemKind::Group && i.group_id == group_id)
        else {
            return;
        };

        if members.is_empty() {
            group.data.remove(tlv_kinds::GROUP_MEMBERS);
            return;
        }

        let mut buffer = BytesMut::with_capacity(members.len() * 2);
        for id in members {
            buffer.put_u16(id);
        }
        group
            .data
            .set_raw(tlv_kinds::GROUP_MEMBERS, buffer.to_vec());
    }

    /// Child ids of a group in list order. For the master group (id 0)
    /// these are the ids of all named groups, otherwise the buddy ids
    /// within the group.
    fn group_member_ids(&self, group_id: u16) -> Vec<u16> {
        if group_id == 0 {
            self.items
                .iter()
                .filter(|i| i.kind == SsiItemKind::Group && i.group_id != 0)
                .map(|i| i.group_id)
                .collect()
        } else {
            self.items
                .iter()
                .filter(|i| i.kind == SsiItemKind::Buddy && i.group_id == group_id)
                .map(|i| i.buddy_id)
                .collect()
        }
    }

    /// The wire image of the whole list, item by item in order.
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::new();
        for item in &self.items {
            buffer.put_slice(&item.to_bytes());
        }
        buffer.freeze()
    }
}
