use std::collections::BTreeSet;

use crate::domain::field::TicketField;
use crate::domain::ticket::EditingInfo;

/// Fields that must be locked for an edit.
///
/// Only fields known to both the form schema and `editing_info` are
/// considered; a field in that intersection stays editable only when
/// `editing_info` marks it `true`. Keys the form does not know are ignored,
/// and fields missing from `editing_info` are left unrestricted.
pub fn resolve_locked(
    schema_fields: impl IntoIterator<Item = TicketField>,
    editing_info: &EditingInfo,
) -> BTreeSet<TicketField> {
    let fields = schema_fields.into_iter().collect::<Vec<_>>();
    let editable = resolve_editable(fields.iter().copied(), editing_info);
    fields
        .into_iter()
        .filter(|field| !editable.contains(field))
        .collect()
}

/// Complement of [`resolve_locked`] over the given schema fields.
pub fn resolve_editable(
    schema_fields: impl IntoIterator<Item = TicketField>,
    editing_info: &EditingInfo,
) -> BTreeSet<TicketField> {
    schema_fields
        .into_iter()
        .filter(|field| !matches!(editing_info.get(field.as_str()), Some(false)))
        .collect()
}
