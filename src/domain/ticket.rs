use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields owned by the ticket service; an update must echo them back untouched.
pub const SERVER_OWNED_FIELDS: [&str; 3] = ["status", "history", "created_relvals"];

/// Per-field flag telling whether a field may still be edited.
pub type EditingInfo = BTreeMap<String, bool>;

/// Raw ticket object as exchanged with the ticket service.
pub type TicketDraft = Map<String, Value>;

/// A ticket as returned by `get` and `search`. Only the columns the client
/// shows are typed; everything else is kept verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub prepid: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub batch_name: String,
    #[serde(default)]
    pub cmssw_release: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub scram_arch: String,
    #[serde(default)]
    pub cpu_cores: Option<i64>,
    #[serde(default)]
    pub memory: Option<i64>,
    #[serde(default)]
    pub workflow_ids: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Ticket {
    pub fn workflow_display(&self) -> String {
        join_values(&self.workflow_ids, ", ")
    }
}

/// The editable view of a ticket: draft values plus the permission map.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditableTicket {
    pub object: TicketDraft,
    #[serde(default)]
    pub editing_info: EditingInfo,
}

/// Renders a scalar JSON value the way a form input shows it.
pub fn scalar_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

pub fn join_values(values: &[Value], separator: &str) -> String {
    values
        .iter()
        .map(scalar_display)
        .collect::<Vec<_>>()
        .join(separator)
}
