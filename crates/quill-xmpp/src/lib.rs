// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

//! XMPP protocol building blocks for quill protocol plugins: the
//! SCRAM-SHA-1 SASL client state machine and the BOSH (XMPP over HTTP
//! long-polling) transport.

pub use bosh::{BoshConfig, BoshConnection, BoshError, BoshEvent, BoshEventHandler, BoshPoster};
pub use sasl::{ScramError, ScramSha1, Step};

pub mod bosh;
pub mod ns;
pub mod sasl;
