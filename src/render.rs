//! Plain-text output for the terminal: the edit form and the ticket table.

use std::fmt::Write as _;

use crate::domain::form::TicketForm;
use crate::domain::schema::{FieldKind, TICKET_FORM};
use crate::domain::ticket::Ticket;
use crate::validate::FieldErrors;

/// Renders every schema field with its value, lock state and errors.
pub fn render_form(form: &TicketForm, errors: Option<&FieldErrors>) -> String {
    let mut out = String::new();

    for spec in TICKET_FORM.iter() {
        let value = form.get(spec.field);
        let mut marks = Vec::new();
        if spec.required.is_some() {
            marks.push("required");
        }
        if form.is_locked(spec.field) {
            marks.push("locked");
        }
        if errors.is_some_and(|errors| errors.has(spec.field)) {
            marks.push("invalid");
        }
        let marks = if marks.is_empty() {
            String::new()
        } else {
            format!(" ({})", marks.join(", "))
        };

        let _ = write!(out, "{} [{}]{}:", spec.label, spec.field, marks);
        if value.is_empty() {
            if spec.placeholder.is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, " <{}>", spec.placeholder);
            }
        } else if value.contains('\n') {
            out.push('\n');
            for line in value.lines() {
                let _ = writeln!(out, "    {line}");
            }
        } else {
            let _ = writeln!(out, " {value}");
        }

        if let FieldKind::Select { choices } = spec.kind {
            let _ = writeln!(out, "    one of: {}", choices.join(", "));
        }
        for error in errors.map(|errors| errors.get(spec.field)).unwrap_or(&[]) {
            let _ = writeln!(out, "    ! {error}");
        }
    }
    out
}

const TABLE_HEADERS: [&str; 10] = [
    "Prep ID",
    "Status",
    "Actions",
    "CMSSW Release",
    "Batch Name",
    "CPU Cores",
    "Label",
    "Memory",
    "Scram Arch",
    "Workflows",
];

fn ticket_row(ticket: &Ticket) -> [String; 10] {
    let number = |value: Option<i64>| value.map(|v| v.to_string()).unwrap_or_default();
    [
        ticket.prepid.clone(),
        ticket.status.clone(),
        format!(
            "--prepid {0} | --clone {0} | api/tickets/run_the_matrix/{0}",
            ticket.prepid
        ),
        ticket.cmssw_release.clone(),
        ticket.batch_name.clone(),
        number(ticket.cpu_cores),
        ticket.label.clone(),
        number(ticket.memory),
        ticket.scram_arch.clone(),
        ticket.workflow_display(),
    ]
}

/// Aligned text table of tickets; an empty list still prints the header.
pub fn render_table(tickets: &[Ticket]) -> String {
    let rows = tickets.iter().map(ticket_row).collect::<Vec<_>>();
    let mut widths = TABLE_HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: Vec<&str>| {
        let line = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(out, "{}", line.trim_end());
    };

    push_line(TABLE_HEADERS.to_vec());
    for row in &rows {
        push_line(row.iter().map(String::as_str).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::TicketField;
    use crate::validate::FieldError;

    #[test]
    fn form_marks_locked_fields_and_errors() {
        let mut form = TicketForm::with_defaults();
        form.set(TicketField::InputDatasets, "/A/B-v1/RAW\n/C/D-v1/RAW");
        form.lock([TicketField::CmsswRelease]);
        let mut errors = FieldErrors::default();
        errors.push(TicketField::BatchName, FieldError::Required("Please provide a batch".to_string()));

        let text = render_form(&form, Some(&errors));

        assert!(text.contains("Prep ID [prepid] (locked):"));
        assert!(text.contains("CMSSW Release [cmssw_release] (required, locked):"));
        assert!(text.contains("Batch Name [batch_name] (required, invalid):"));
        assert!(text.contains("    ! Please provide a batch"));
        assert!(text.contains("Datasets [input_datasets]:\n    /A/B-v1/RAW\n    /C/D-v1/RAW\n"));
        assert!(text.contains("one of: alca, standard, upgrade"));
    }

    #[test]
    fn table_lists_ticket_columns() {
        let ticket = Ticket {
            prepid: "TICKET-1".to_string(),
            status: "new".to_string(),
            cmssw_release: "CMSSW_12_4_0".to_string(),
            cpu_cores: Some(8),
            workflow_ids: vec![serde_json::json!(6.13), serde_json::json!(6.14)],
            ..Ticket::default()
        };

        let text = render_table(&[ticket]);
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Prep ID   Status  Actions"));
        assert!(lines[1].contains(
            "--prepid TICKET-1 | --clone TICKET-1 | api/tickets/run_the_matrix/TICKET-1"
        ));
        assert!(lines[1].ends_with("6.13, 6.14"));
    }
}
