use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Number, Value};

use crate::domain::field::TicketField;
use crate::domain::schema::{FieldKind, TICKET_FORM, spec_for};
use crate::domain::ticket::{TicketDraft, join_values, scalar_display};
use crate::validate::FieldError;

/// Form state for one ticket: the raw text of every field plus the set of
/// fields the user may not change.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketForm {
    values: BTreeMap<TicketField, String>,
    locked: BTreeSet<TicketField>,
}

impl TicketForm {
    /// Empty form populated with schema defaults.
    pub fn with_defaults() -> Self {
        let values = TICKET_FORM
            .iter()
            .map(|spec| (spec.field, spec.default.to_string()))
            .collect();
        Self {
            values,
            locked: BTreeSet::new(),
        }
    }

    /// Populates the form from a stored draft; fields missing from the
    /// draft keep their schema default.
    pub fn from_draft(draft: &TicketDraft) -> Self {
        let mut form = Self::with_defaults();
        for field in TicketField::ALL {
            if let Some(value) = draft.get(field.as_str()) {
                form.values.insert(field, display_value(field, value));
            }
        }
        form
    }

    pub fn get(&self, field: TicketField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: TicketField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn lock(&mut self, fields: impl IntoIterator<Item = TicketField>) {
        self.locked.extend(fields);
    }

    pub fn is_locked(&self, field: TicketField) -> bool {
        self.locked.contains(&field) || spec_for(field).read_only
    }

    /// Applies a user edit. Locked and read-only fields keep their value; an
    /// edit that would change them is rejected.
    pub fn apply_edit(&mut self, field: TicketField, value: &str) -> Result<(), FieldError> {
        if self.is_locked(field) {
            if self.get(field) == value {
                return Ok(());
            }
            return Err(FieldError::Locked);
        }
        self.set(field, value);
        Ok(())
    }

    /// Serializes the form for the ticket service. Integer fields are sent
    /// as numbers, everything else as the text the user entered.
    pub fn to_draft(&self) -> TicketDraft {
        let mut draft = TicketDraft::new();
        for (field, value) in &self.values {
            let value = match spec_for(*field).kind {
                FieldKind::Integer { .. } => value
                    .trim()
                    .parse::<i64>()
                    .map(|number| Value::Number(Number::from(number)))
                    .unwrap_or_else(|_| Value::String(value.clone())),
                _ => Value::String(value.clone()),
            };
            draft.insert(field.as_str().to_string(), value);
        }
        draft
    }
}

/// Text shown in a form input for a stored value.
pub fn display_value(field: TicketField, value: &Value) -> String {
    match value {
        Value::Array(items) if field == TicketField::InputDatasets => join_values(items, "\n"),
        Value::Array(items) => join_values(items, ", "),
        Value::Object(_) => value.to_string(),
        other => scalar_display(other),
    }
}
