// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use bytes::{BufMut, Bytes, BytesMut};

/// A single type-length-value entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tlv {
    kind: u16,
    value: Vec<u8>,
}

impl Tlv {
    pub fn new(kind: u16, value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> u16 {
        self.kind
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// An ordered TLV chain.
///
/// Updates overwrite an existing entry in place, resizing its buffer to the
/// new length; unknown kinds are appended at the end. Order is part of the
/// wire image and is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlvList {
    tlvs: Vec<Tlv>,
}

impl TlvList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: u16) -> Option<&Tlv> {
        self.tlvs.iter().find(|tlv| tlv.kind == kind)
    }

    pub fn set_raw(&mut self, kind: u16, value: impl Into<Vec<u8>>) {
        let value = value.into();
        match self.tlvs.iter_mut().find(|tlv| tlv.kind == kind) {
            Some(tlv) => tlv.value = value,
            None => self.tlvs.push(Tlv::new(kind, value)),
        }
    }

    pub fn set_u8(&mut self, kind: u16, value: u8) {
        self.set_raw(kind, vec![value]);
    }

    pub fn set_u16(&mut self, kind: u16, value: u16) {
        self.set_raw(kind, value.to_be_bytes().to_vec());
    }

    pub fn set_u32(&mut self, kind: u16, value: u32) {
        self.set_raw(kind, value.to_be_bytes().to_vec());
    }

    pub fn remove(&mut self, kind: u16) -> bool {
        let len = self.tlvs.len();
        self.tlvs.retain(|tlv| tlv.kind != kind);
        self.tlvs.len() != len
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tlv> {
        self.tlvs.iter()
    }

    pub fn len(&self) -> usize {
        self.tlvs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tlvs.is_empty()
    }

    /// The encoded length in bytes: four header bytes per entry plus the
    /// value.
    pub fn byte_len(&self) -> usize {
        self.tlvs.iter().map(|tlv| 4 + tlv.value.len()).sum()
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.byte_len());
        for tlv in &self.tlvs {
            buffer.put_u16(tlv.kind);
            buffer.put_u16(tlv.value.len() as u16);
            buffer.put_slice(&tlv.value);
        }
        buffer.freeze()
    }
}
