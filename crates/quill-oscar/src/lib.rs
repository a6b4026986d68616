// quill/quill-oscar
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

//! The OSCAR server-stored information (SSI) engine: a local mirror of the
//! server-side contact list plus the one-in-flight request queue that keeps
//! both ends consistent.

pub use item::{tlv_kinds, SsiItem, SsiItemKind};
pub use list::SsiList;
pub use session::{PermitDenyMode, SsiError, SsiSession};
pub use snac::{family, subtype, Snac, SnacSink};
pub use tlv::{Tlv, TlvList};

mod item;
mod list;
mod session;
mod snac;
mod tlv;
