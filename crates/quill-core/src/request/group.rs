// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use crate::request::RequestField;

/// An ordered, optionally titled run of fields within a page.
#[derive(Debug, Clone, Default)]
pub struct RequestGroup {
    title: Option<String>,
    fields: Vec<RequestField>,
}

impl RequestGroup {
    pub fn new(title: Option<String>) -> Self {
        Self {
            title,
            fields: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn add_field(&mut self, field: RequestField) {
        self.fields.push(field);
    }

    pub fn with_field(mut self, field: RequestField) -> Self {
        self.add_field(field);
        self
    }

    pub fn fields(&self) -> &[RequestField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
