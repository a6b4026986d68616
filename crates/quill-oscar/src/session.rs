// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::item::{tlv_kinds, SsiItem, SsiItemKind};
use crate::list::SsiList;
use crate::snac::{family, subtype, Snac, SnacSink};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SsiError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Server-side permit/deny modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PermitDenyMode {
    AllowAll = 1,
    BlockAll = 2,
    AllowListed = 3,
    BlockListed = 4,
    AllowBuddiesOnly = 5,
}

/// A live SSI session: the local list plus the one-in-flight request
/// queue.
///
/// Every mutation request goes onto the holding queue; the head is sent
/// only while no acknowledgement is pending. The first enqueue while idle
/// sends `mod_begin`; draining the queue sends `mod_end`. Acks arrive in
/// submission order, the transport guarantees nothing else.
pub struct SsiSession {
    list: SsiList,
    sink: Arc<dyn SnacSink>,
    holding_queue: VecDeque<Snac>,
    waiting_for_ack: bool,
    in_transaction: bool,
    next_request_id: u32,
}

impl SsiSession {
    pub fn new(sink: Arc<dyn SnacSink>) -> Self {
        Self {
            list: SsiList::new(),
            sink,
            holding_queue: VecDeque::new(),
            waiting_for_ack: false,
            in_transaction: false,
            next_request_id: 1,
        }
    }

    pub fn list(&self) -> &SsiList {
        &self.list
    }

    /// Direct access to the local mirror, e.g. while parsing the initial
    /// list the server sends.
    pub fn list_mut(&mut self) -> &mut SsiList {
        &mut self.list
    }

    pub fn is_waiting_for_ack(&self) -> bool {
        self.waiting_for_ack
    }

    pub fn pending_requests(&self) -> usize {
        self.holding_queue.len()
    }

    /// Requests that the server add the given items.
    pub fn request_add(&mut self, items: &[SsiItem]) -> Result<(), SsiError> {
        self.request(subtype::ADD, items)
    }

    /// Requests that the server modify the given items.
    pub fn request_modify(&mut self, items: &[SsiItem]) -> Result<(), SsiError> {
        self.request(subtype::MODIFY, items)
    }

    /// Requests that the server delete the given items.
    pub fn request_delete(&mut self, items: &[SsiItem]) -> Result<(), SsiError> {
        self.request(subtype::DELETE, items)
    }

    /// Handles a server acknowledgement for the request in flight: clears
    /// the pending flag and dispatches the next queued request, or closes
    /// the transaction.
    pub fn handle_ack(&mut self) -> Result<(), SsiError> {
        self.waiting_for_ack = false;
        self.dispatch()
    }

    /// Enforces list hygiene: every buddy lives in a real group (orphans
    /// migrate into an arbitrary or freshly created "Unknown" group), every
    /// group's membership summary is rebuilt, and groups left empty are
    /// deleted. No-op when no buddy is orphaned.
    pub fn clean_list(&mut self) -> Result<(), SsiError> {
        let has_orphans = self
            .list
            .items()
            .iter()
            .any(|i| i.kind == SsiItemKind::Buddy && i.group_id == 0);
        if !has_orphans {
            return Ok(());
        }

        debug!("cleaning server-stored list");

        // Make sure there is a group to migrate orphans into.
        if self.list.groups().all(|g| g.group_id == 0) {
            let (group_id, _) =
                self.list
                    .add(Some("Unknown".to_string()), SsiItemKind::Group, None);
            let group = self.list.find(group_id, 0).cloned().expect("group exists");
            self.request_add(&[group])?;
        }

        let target_group = self
            .list
            .groups()
            .find(|g| g.group_id != 0)
            .map(|g| g.group_id)
            .expect("a real group exists");

        // Migrating an orphan changes its server identity, so it is deleted
        // under the old ids and re-added under the new ones.
        let orphans = self
            .list
            .items()
            .iter()
            .filter(|i| i.kind == SsiItemKind::Buddy && i.group_id == 0)
            .cloned()
            .collect::<Vec<_>>();
        for orphan in orphans {
            self.request_delete(&[orphan.clone()])?;

            let buddy_id = fresh_buddy_id(&self.list, target_group);
            let item = self
                .list
                .find_mut(orphan.group_id, orphan.buddy_id)
                .expect("orphan exists");
            item.group_id = target_group;
            item.buddy_id = buddy_id;
            let item = item.clone();
            self.request_add(&[item])?;
        }

        let group_ids = self.list.groups().map(|g| g.group_id).collect::<Vec<_>>();
        for group_id in &group_ids {
            self.list.rebuild_group(*group_id);
        }

        let groups = self.list.groups().cloned().collect::<Vec<_>>();
        if !groups.is_empty() {
            self.request_modify(&groups)?;
        }

        let empty_groups = self
            .list
            .groups()
            .filter(|g| g.group_id != 0 && g.data.get(tlv_kinds::GROUP_MEMBERS).is_none())
            .cloned()
            .collect::<Vec<_>>();
        if !empty_groups.is_empty() {
            self.request_delete(&empty_groups)?;
            for group in &empty_groups {
                self.list.remove(group.group_id, group.buddy_id);
            }
        }

        Ok(())
    }

    /// Stores the permit/deny mode and visibility mask on the singleton
    /// pd-info item, modifying it in place when it exists and adding it
    /// otherwise. Unrelated TLVs on the item are preserved.
    pub fn set_permit_deny(
        &mut self,
        mode: PermitDenyMode,
        visibility_mask: u32,
    ) -> Result<(), SsiError> {
        self.update_singleton(SsiItemKind::PdInfo, |data| {
            data.set_u8(tlv_kinds::PD_MODE, mode as u8);
            data.set_u32(tlv_kinds::PD_MASK, visibility_mask);
        })
    }

    /// Stores the presence preference bitmask on the singleton presence
    /// item, modifying it in place when it exists and adding it otherwise.
    pub fn set_presence(&mut self, presence_mask: u32) -> Result<(), SsiError> {
        self.update_singleton(SsiItemKind::PresencePrefs, |data| {
            data.set_u32(tlv_kinds::PRESENCE_PREFS, presence_mask);
        })
    }

    fn update_singleton(
        &mut self,
        kind: SsiItemKind,
        update: impl FnOnce(&mut crate::tlv::TlvList),
    ) -> Result<(), SsiError> {
        let existing = self
            .list
            .find_item(None, None, kind)
            .map(|item| (item.group_id, item.buddy_id));

        match existing {
            Some((group_id, buddy_id)) => {
                let item = self
                    .list
                    .find_mut(group_id, buddy_id)
                    .expect("item was just found");
                update(&mut item.data);
                let item = item.clone();
                self.request_modify(&[item])
            }
            None => {
                let (group_id, buddy_id) = self.list.add(None, kind, None);
                let item = self
                    .list
                    .find_mut(group_id, buddy_id)
                    .expect("item was just added");
                update(&mut item.data);
                let item = item.clone();
                self.request_add(&[item])
            }
        }
    }

    fn request(&mut self, action: u16, items: &[SsiItem]) -> Result<(), SsiError> {
        let mut data = BytesMut::new();
        for item in items {
            data.put_slice(&item.to_bytes());
        }
        let snac = Snac::new(family::FEEDBAG, action, self.take_request_id(), data.freeze());
        self.enqueue(snac)?;
        self.dispatch()
    }

    fn enqueue(&mut self, snac: Snac) -> Result<(), SsiError> {
        if self.holding_queue.is_empty() && !self.waiting_for_ack && !self.in_transaction {
            self.in_transaction = true;
            let begin = Snac::new(
                family::FEEDBAG,
                subtype::MOD_BEGIN,
                self.take_request_id(),
                Bytes::new(),
            );
            self.sink.send_snac(begin)?;
        }
        self.holding_queue.push_back(snac);
        Ok(())
    }

    fn dispatch(&mut self) -> Result<(), SsiError> {
        if self.waiting_for_ack {
            return Ok(());
        }

        if let Some(snac) = self.holding_queue.pop_front() {
            self.waiting_for_ack = true;
            self.sink.send_snac(snac)
        } else if self.in_transaction {
            self.in_transaction = false;
            let end = Snac::new(
                family::FEEDBAG,
                subtype::MOD_END,
                self.take_request_id(),
                Bytes::new(),
            );
            self.sink.send_snac(end)
        } else {
            Ok(())
        }
    }

    fn take_request_id(&mut self) -> u32 {
        let id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        id
    }
}

fn fresh_buddy_id(list: &SsiList, group_id: u16) -> u16 {
    let mut buddy_id = 0u16;
    loop {
        buddy_id = buddy_id.wrapping_add(1);
        if list.find(group_id, buddy_id).is_none() {
            return buddy_id;
        }
    }
}
