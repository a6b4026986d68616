// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

pub use contact::Contact;
pub use info::{
    ContactInfo, ContactInfoBuilder, ContactInfoEvent, ContactKey, ContactProperty, Presence,
};
pub use manager::{ContactManager, ContactManagerEvent};
pub use person::{Person, PersonEvent, PersonEventKind};

mod contact;
mod info;
mod manager;
mod person;
