// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use bytes::{BufMut, Bytes, BytesMut};

use crate::tlv::TlvList;

/// TLV kinds the engine manages inside item data.
pub mod tlv_kinds {
    /// Ordered child ids of a group.
    pub const GROUP_MEMBERS: u16 = 0x00C8;
    /// Presence preference bitmask.
    pub const PRESENCE_PREFS: u16 = 0x00C9;
    /// Permit/deny mode byte.
    pub const PD_MODE: u16 = 0x00CA;
    /// Visibility class bitmask.
    pub const PD_MASK: u16 = 0x00CB;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum SsiItemKind {
    Buddy = 0x0000,
    Group = 0x0001,
    Permit = 0x0002,
    Deny = 0x0003,
    PdInfo = 0x0004,
    PresencePrefs = 0x0005,
}

/// One entry of the server-stored list.
///
/// Groups carry `buddy_id == 0` and a fresh global `group_id`; every other
/// kind lives inside a group (`group_id` of its parent, `0` for the
/// list-level singletons) under a `buddy_id` unique within that group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsiItem {
    pub name: Option<String>,
    pub group_id: u16,
    pub buddy_id: u16,
    pub kind: SsiItemKind,
    pub data: TlvList,
}

impl SsiItem {
    pub fn new(name: Option<String>, group_id: u16, buddy_id: u16, kind: SsiItemKind) -> Self {
        Self {
            name,
            group_id,
            buddy_id,
            kind,
            data: TlvList::new(),
        }
    }

    /// The wire image: name, ids, type and TLV data, all big endian.
    pub fn to_bytes(&self) -> Bytes {
        let name = self.name.as_deref().unwrap_or_default();
        let mut buffer = BytesMut::with_capacity(10 + name.len() + self.data.byte_len());
        buffer.put_u16(name.len() as u16);
        buffer.put_slice(name.as_bytes());
        buffer.put_u16(self.group_id);
        buffer.put_u16(self.buddy_id);
        buffer.put_u16(self.kind as u16);
        buffer.put_u16(self.data.byte_len() as u16);
        buffer.put_slice(&self.data.to_bytes());
        buffer.freeze()
    }
}
