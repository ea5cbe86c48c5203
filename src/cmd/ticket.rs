use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use serde_json::Value;
use tracing::warn;

use crate::context::AppContext;
use crate::domain::field::TicketField;
use crate::domain::form::display_value;
use crate::error::{AppError, AppResult};
use crate::render::{render_form, render_table};
use crate::workflow::ticket::{Intent, SubmitOutcome, current_form, open_ticket, submit_ticket};

#[derive(Args, Debug, Clone)]
pub struct TicketArgs {
    #[command(subcommand)]
    pub command: TicketCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TicketCommand {
    /// Load a ticket into the edit session (or start a new one) and print the form.
    Open(TargetArgs),
    /// Print the form held by the edit session.
    Show(TargetArgs),
    /// Apply edits to the session draft, validate it and save the ticket.
    Submit(SubmitArgs),
    /// Search tickets, e.g. `relval ticket list status=new`.
    List {
        /// Search filters as FIELD=VALUE.
        filters: Vec<String>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Edit the ticket with this prepid.
    #[arg(long)]
    pub prepid: Option<String>,
    /// Create a new ticket copied from this prepid.
    #[arg(long)]
    pub clone: Option<String>,
}

impl TargetArgs {
    fn intent(&self) -> Intent {
        Intent::from_params(self.prepid.as_deref(), self.clone.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Field edit as FIELD=VALUE; may be repeated.
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub set: Vec<String>,
    /// JSON object of field values, applied before any --set.
    #[arg(long = "from", value_name = "FILE")]
    pub from: Option<PathBuf>,
}

pub async fn run(ctx: &AppContext, command: TicketCommand) -> AppResult<()> {
    match command {
        TicketCommand::Open(target) => {
            let intent = target.intent();
            let form = open_ticket(ctx, &intent).await?;
            print!("{}", render_form(&form, None));
            Ok(())
        }
        TicketCommand::Show(target) => {
            let form = current_form(ctx, &target.intent())?;
            print!("{}", render_form(&form, None));
            Ok(())
        }
        TicketCommand::Submit(args) => run_submit(ctx, args).await,
        TicketCommand::List { filters } => {
            let query = parse_filters(&filters)?;
            let tickets = ctx.tickets.search(&query).await?;
            print!("{}", render_table(&tickets));
            Ok(())
        }
    }
}

async fn run_submit(ctx: &AppContext, args: SubmitArgs) -> AppResult<()> {
    let intent = args.target.intent();
    let edits = parse_edits(&args.set, args.from.as_deref())?;

    match submit_ticket(ctx, &intent, &edits).await? {
        SubmitOutcome::Saved { prepid, created } => {
            let verb = if created { "created" } else { "updated" };
            println!("Success! Ticket {prepid} {verb}.");
            // The ticket is already saved; a failed listing must not read as a failed submit.
            let query = vec![("prepid".to_string(), prepid)];
            match ctx.tickets.search(&query).await {
                Ok(tickets) => print!("{}", render_table(&tickets)),
                Err(err) => warn!(error = %err, "could not list the saved ticket"),
            }
            Ok(())
        }
        SubmitOutcome::Invalid { form, errors } => {
            print!("{}", render_form(&form, Some(&errors)));
            Err(AppError::Usage(format!(
                "ticket not saved; fix the fields below and submit again:\n{errors}"
            )))
        }
        SubmitOutcome::Rejected { form, notice } => {
            print!("{}", render_form(&form, None));
            Err(AppError::Proxy(notice))
        }
    }
}

/// File values first, then `--set` pairs in order; later values win.
fn parse_edits(set: &[String], from: Option<&Path>) -> AppResult<Vec<(TicketField, String)>> {
    let mut edits = Vec::new();

    if let Some(path) = from {
        let contents = fs::read_to_string(path)?;
        let Value::Object(values) = serde_json::from_str::<Value>(&contents)? else {
            return Err(AppError::Usage(format!(
                "{} must contain a JSON object of field values",
                path.display()
            )));
        };
        for (key, value) in values {
            let field = parse_field(&key)?;
            edits.push((field, display_value(field, &value)));
        }
    }

    for pair in set {
        let (key, value) = split_pair(pair)?;
        edits.push((parse_field(key)?, value.to_string()));
    }
    Ok(edits)
}

fn parse_filters(filters: &[String]) -> AppResult<Vec<(String, String)>> {
    filters
        .iter()
        .map(|pair| split_pair(pair).map(|(key, value)| (key.to_string(), value.to_string())))
        .collect()
}

fn split_pair(pair: &str) -> AppResult<(&str, &str)> {
    pair.split_once('=')
        .map(|(key, value)| (key.trim(), value))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| AppError::Usage(format!("expected FIELD=VALUE, got '{pair}'")))
}

fn parse_field(name: &str) -> AppResult<TicketField> {
    TicketField::from_str(name)
        .ok_or_else(|| AppError::Usage(format!("unknown ticket field '{name}'")))
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use super::*;
    use crate::session::MemorySessionStore;
    use crate::testing::{FakeCatalog, FakeTicketService, TicketCall, test_context};

    #[tokio::test]
    async fn submit_succeeds_when_listing_the_saved_ticket_fails() {
        let tickets = Arc::new(FakeTicketService::default().failing_search());
        let ctx = test_context(
            Arc::clone(&tickets) as _,
            FakeCatalog::default(),
            Arc::new(MemorySessionStore::default()),
        );
        run(&ctx, TicketCommand::Open(TargetArgs { prepid: None, clone: None }))
            .await
            .expect("open");

        let result = run_submit(
            &ctx,
            SubmitArgs {
                target: TargetArgs { prepid: None, clone: None },
                set: vec![
                    "batch_name=Tracker".to_string(),
                    "cmssw_release=CMSSW_12_4_0".to_string(),
                    "jira_ticket=None".to_string(),
                ],
                from: None,
            },
        )
        .await;

        assert!(result.is_ok(), "{result:?}");
        assert!(matches!(&tickets.calls()[..], [TicketCall::Create(_)]));
        assert!(matches!(
            run(&ctx, TicketCommand::List { filters: Vec::new() }).await,
            Err(AppError::Proxy(_))
        ));
    }

    #[test]
    fn parses_set_pairs_after_file_values() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"batch_name": "Tracker", "workflow_ids": [1.1, 1.2], "input_datasets": ["/A/B-v1/RAW", "/C/D-v1/RAW"]}}"#
        )
        .expect("write");

        let edits = parse_edits(
            &["batch_name=Muon".to_string(), "notes=a=b".to_string()],
            Some(file.path()),
        )
        .expect("edits parse");

        assert!(edits.contains(&(TicketField::WorkflowIds, "1.1, 1.2".to_string())));
        assert!(edits.contains(&(
            TicketField::InputDatasets,
            "/A/B-v1/RAW\n/C/D-v1/RAW".to_string()
        )));
        let batch = edits
            .iter()
            .filter(|(field, _)| *field == TicketField::BatchName)
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>();
        assert_eq!(batch, vec!["Tracker", "Muon"]);
        assert!(edits.contains(&(TicketField::Notes, "a=b".to_string())));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_pairs() {
        assert!(matches!(
            parse_edits(&["status=done".to_string()], None),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            parse_edits(&["batch_name".to_string()], None),
            Err(AppError::Usage(_))
        ));
        assert!(matches!(
            parse_filters(&["=new".to_string()]),
            Err(AppError::Usage(_))
        ));
    }

    #[test]
    fn parses_search_filters() {
        let filters = parse_filters(&["status=new".to_string(), "batch_name=Tracker".to_string()])
            .expect("filters parse");
        assert_eq!(
            filters,
            vec![
                ("status".to_string(), "new".to_string()),
                ("batch_name".to_string(), "Tracker".to_string()),
            ]
        );
    }
}
