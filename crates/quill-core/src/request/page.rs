// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::collections::HashMap;

use tracing::warn;

use crate::account::Account;
use crate::request::{FieldValue, RequestField, RequestGroup};

/// A protocol-driven form: an ordered list of groups plus a flat index of
/// fields by id.
///
/// The typed accessors return a zero value when the id is absent; asking
/// for the wrong type is a programmer error and is logged and refused.
#[derive(Debug, Default)]
pub struct RequestPage {
    groups: Vec<RequestGroup>,
    index: HashMap<String, RequestField>,
}

impl RequestPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, group: RequestGroup) {
        for field in group.fields() {
            let id = field.id().to_string();
            if self.index.contains_key(&id) {
                warn!(id, "a field with this id already exists on the page");
                continue;
            }
            self.index.insert(id, field.clone());
        }
        self.groups.push(group);
    }

    pub fn with_group(mut self, group: RequestGroup) -> Self {
        self.add_group(group);
        self
    }

    pub fn groups(&self) -> &[RequestGroup] {
        &self.groups
    }

    pub fn field(&self, id: &str) -> Option<&RequestField> {
        self.index.get(id)
    }

    /// Whether every required field holds a value.
    pub fn all_required_filled(&self) -> bool {
        self.index
            .values()
            .all(|field| !field.required() || field.is_filled())
    }

    /// Whether every field passes validation.
    pub fn all_valid(&self) -> bool {
        self.index.values().all(RequestField::is_valid)
    }

    pub fn string_value(&self, id: &str) -> Option<String> {
        match self.typed_value(id, "string")? {
            FieldValue::String(value) => value,
            _ => None,
        }
    }

    pub fn int_value(&self, id: &str) -> i64 {
        match self.typed_value(id, "int") {
            Some(FieldValue::Int(value)) => value,
            _ => 0,
        }
    }

    pub fn bool_value(&self, id: &str) -> bool {
        match self.typed_value(id, "bool") {
            Some(FieldValue::Bool(value)) => value,
            _ => false,
        }
    }

    /// The selected option of a choice field.
    pub fn choice_value(&self, id: &str) -> Option<String> {
        match self.typed_value(id, "choice")? {
            FieldValue::Choice { options, selected } => {
                selected.and_then(|index| options.get(index).cloned())
            }
            _ => None,
        }
    }

    pub fn account_value(&self, id: &str) -> Option<Account> {
        match self.typed_value(id, "account")? {
            FieldValue::Account(account) => account,
            _ => None,
        }
    }

    pub fn image_value(&self, id: &str) -> Option<Vec<u8>> {
        match self.typed_value(id, "image")? {
            FieldValue::Image(data) => data,
            _ => None,
        }
    }

    fn typed_value(&self, id: &str, expected: &str) -> Option<FieldValue> {
        let field = self.index.get(id)?;
        let value = field.value();
        let actual = value.kind().to_string();
        if actual != expected {
            warn!(id, expected, %actual, "request field accessed with the wrong type");
            return None;
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_page() -> RequestPage {
        let username = RequestField::string("username", "Username", None);
        username.set_required(true);

        let mut group = RequestGroup::new(Some("Login".to_string()));
        group.add_field(username);
        group.add_field(RequestField::bool("remember", "Remember password", false));
        group.add_field(RequestField::int("port", "Port", 5222));

        RequestPage::new().with_group(group)
    }

    #[test]
    fn test_required_and_valid() {
        let page = login_page();
        assert!(!page.all_required_filled());
        assert!(!page.all_valid());

        page.field("username")
            .unwrap()
            .set_value(FieldValue::String(Some("alice".to_string())));
        assert!(page.all_required_filled());
        assert!(page.all_valid());
    }

    #[test]
    fn test_typed_accessors() {
        let page = login_page();
        page.field("username")
            .unwrap()
            .set_value(FieldValue::String(Some("alice".to_string())));

        assert_eq!(page.string_value("username").as_deref(), Some("alice"));
        assert_eq!(page.int_value("port"), 5222);
        assert!(!page.bool_value("remember"));

        // Absent ids yield zero values.
        assert_eq!(page.string_value("missing"), None);
        assert_eq!(page.int_value("missing"), 0);

        // Wrong-type access is refused, not coerced.
        assert_eq!(page.int_value("username"), 0);
        assert_eq!(page.string_value("port"), None);
    }

    #[test]
    fn test_validator() {
        let port = RequestField::int("port", "Port", 0);
        port.set_validator(|value| matches!(value, FieldValue::Int(p) if (1..=65535).contains(p)));

        let page = RequestPage::new()
            .with_group(RequestGroup::new(None).with_field(port));

        assert!(!page.all_valid());
        page.field("port").unwrap().set_value(FieldValue::Int(5222));
        assert!(page.all_valid());
    }
}
