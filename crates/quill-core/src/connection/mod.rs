// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use connection::{Connection, ConnectionEvent, ConnectionState};

mod connection;
