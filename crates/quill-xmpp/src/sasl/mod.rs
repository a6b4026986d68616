// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use scram::{select_mechanism, ScramError, ScramSha1, Step, MECHANISM};
pub use xml::{abort_element, auth_element, response_element};

mod saslprep;
mod scram;
mod xml;
