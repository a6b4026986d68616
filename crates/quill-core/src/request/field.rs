// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;
use strum_macros::Display;
use tracing::warn;

use crate::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum FieldKind {
    String,
    Int,
    Bool,
    Choice,
    Account,
    Image,
    Datasheet,
    Label,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(Option<String>),
    Int(i64),
    Bool(bool),
    Choice {
        options: Vec<String>,
        selected: Option<usize>,
    },
    Account(Option<Account>),
    Image(Option<Vec<u8>>),
    Datasheet(Vec<Vec<String>>),
    Label,
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Choice { .. } => FieldKind::Choice,
            FieldValue::Account(_) => FieldKind::Account,
            FieldValue::Image(_) => FieldKind::Image,
            FieldValue::Datasheet(_) => FieldKind::Datasheet,
            FieldValue::Label => FieldKind::Label,
        }
    }
}

pub type FieldValidator = Arc<dyn Fn(&FieldValue) -> bool + Send + Sync>;

/// One entry of a protocol-driven form.
#[derive(Clone)]
pub struct RequestField {
    inner: Arc<RequestFieldInner>,
}

struct RequestFieldInner {
    id: String,
    label: String,
    state: RwLock<FieldState>,
}

struct FieldState {
    value: FieldValue,
    required: bool,
    visible: bool,
    sensitive: bool,
    tooltip: Option<String>,
    validator: Option<FieldValidator>,
}

impl RequestField {
    fn build(id: impl Into<String>, label: impl Into<String>, value: FieldValue) -> Self {
        Self {
            inner: Arc::new(RequestFieldInner {
                id: id.into(),
                label: label.into(),
                state: RwLock::new(FieldState {
                    value,
                    required: false,
                    visible: true,
                    sensitive: true,
                    tooltip: None,
                    validator: None,
                }),
            }),
        }
    }

    pub fn string(
        id: impl Into<String>,
        label: impl Into<String>,
        default: Option<&str>,
    ) -> Self {
        Self::build(id, label, FieldValue::String(default.map(String::from)))
    }

    pub fn int(id: impl Into<String>, label: impl Into<String>, default: i64) -> Self {
        Self::build(id, label, FieldValue::Int(default))
    }

    pub fn bool(id: impl Into<String>, label: impl Into<String>, default: bool) -> Self {
        Self::build(id, label, FieldValue::Bool(default))
    }

    pub fn choice(
        id: impl Into<String>,
        label: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self::build(
            id,
            label,
            FieldValue::Choice {
                options,
                selected: None,
            },
        )
    }

    pub fn account(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::build(id, label, FieldValue::Account(None))
    }

    pub fn image(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::build(id, label, FieldValue::Image(None))
    }

    pub fn datasheet(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::build(id, label, FieldValue::Datasheet(Vec::new()))
    }

    /// A static text row; carries no value.
    pub fn static_label(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::build(id, text, FieldValue::Label)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn kind(&self) -> FieldKind {
        self.inner.state.read().value.kind()
    }

    pub fn value(&self) -> FieldValue {
        self.inner.state.read().value.clone()
    }

    /// Replaces the value. The new value must be of the field's kind;
    /// mismatches are refused with a warning.
    pub fn set_value(&self, value: FieldValue) -> bool {
        let mut state = self.inner.state.write();
        if state.value.kind() != value.kind() {
            let expected = state.value.kind();
            drop(state);
            warn!(
                field = %self.inner.id,
                %expected,
                got = %value.kind(),
                "refusing to change the type of a request field"
            );
            return false;
        }
        state.value = value;
        true
    }

    pub fn required(&self) -> bool {
        self.inner.state.read().required
    }

    pub fn set_required(&self, required: bool) {
        self.inner.state.write().required = required;
    }

    pub fn visible(&self) -> bool {
        self.inner.state.read().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.inner.state.write().visible = visible;
    }

    pub fn sensitive(&self) -> bool {
        self.inner.state.read().sensitive
    }

    pub fn set_sensitive(&self, sensitive: bool) {
        self.inner.state.write().sensitive = sensitive;
    }

    pub fn tooltip(&self) -> Option<String> {
        self.inner.state.read().tooltip.clone()
    }

    pub fn set_tooltip(&self, tooltip: Option<String>) {
        self.inner.state.write().tooltip = tooltip;
    }

    pub fn set_validator(&self, validator: impl Fn(&FieldValue) -> bool + Send + Sync + 'static) {
        self.inner.state.write().validator = Some(Arc::new(validator));
    }

    /// Whether the field holds a value. Int, bool, label and datasheet
    /// fields always count as filled.
    pub fn is_filled(&self) -> bool {
        match &self.inner.state.read().value {
            FieldValue::String(value) => value.as_ref().is_some_and(|v| !v.is_empty()),
            FieldValue::Choice { selected, .. } => selected.is_some(),
            FieldValue::Account(account) => account.is_some(),
            FieldValue::Image(data) => data.as_ref().is_some_and(|d| !d.is_empty()),
            FieldValue::Int(_)
            | FieldValue::Bool(_)
            | FieldValue::Datasheet(_)
            | FieldValue::Label => true,
        }
    }

    /// Whether the field passes its validator; required fields must also
    /// be filled.
    pub fn is_valid(&self) -> bool {
        let (value, required, validator) = {
            let state = self.inner.state.read();
            (state.value.clone(), state.required, state.validator.clone())
        };
        if required && !self.is_filled() {
            return false;
        }
        validator.map_or(true, |validate| validate(&value))
    }
}

impl Debug for RequestField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestField")
            .field("id", &self.inner.id)
            .field("kind", &self.kind())
            .field("required", &self.required())
            .finish()
    }
}
