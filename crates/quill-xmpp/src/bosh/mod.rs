// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use connection::{BoshConfig, BoshConnection, BoshError, BoshEvent, BoshEventHandler};
pub use poster::{BoshPoster, ReqwestPoster};

mod connection;
mod poster;
