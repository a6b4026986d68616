// quill/quill-xmpp
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub const SASL: &str = "urn:ietf:params:xml:ns:xmpp-sasl";
pub const BOSH: &str = "http://jabber.org/protocol/httpbind";
pub const XBOSH: &str = "urn:xmpp:xbosh";
pub const CLIENT: &str = "jabber:client";
