// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use bytes::{BufMut, Bytes, BytesMut};

use crate::session::SsiError;

pub mod family {
    /// Server-stored information (the "feedbag").
    pub const FEEDBAG: u16 = 0x0013;
}

pub mod subtype {
    pub const ADD: u16 = 0x0008;
    pub const MODIFY: u16 = 0x0009;
    pub const DELETE: u16 = 0x000A;
    pub const SRV_ACK: u16 = 0x000E;
    pub const MOD_BEGIN: u16 = 0x0011;
    pub const MOD_END: u16 = 0x0012;
}

/// One SNAC frame: family, subtype, flags, request id and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snac {
    pub family: u16,
    pub subtype: u16,
    pub flags: u16,
    pub request_id: u32,
    pub data: Bytes,
}

impl Snac {
    pub fn new(family: u16, subtype: u16, request_id: u32, data: Bytes) -> Self {
        Self {
            family,
            subtype,
            flags: 0,
            request_id,
            data,
        }
    }

    /// The ten-byte SNAC header followed by the payload.
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(10 + self.data.len());
        buffer.put_u16(self.family);
        buffer.put_u16(self.subtype);
        buffer.put_u16(self.flags);
        buffer.put_u32(self.request_id);
        buffer.put_slice(&self.data);
        buffer.freeze()
    }
}

/// Outbound transport for SNAC frames. The session owns queueing; a sink
/// only moves bytes.
pub trait SnacSink: Send + Sync {
    fn send_snac(&self, snac: Snac) -> Result<(), SsiError>;
}
