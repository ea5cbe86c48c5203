use serde_json::Value;
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::domain::field::TicketField;
use crate::domain::form::TicketForm;
use crate::domain::permissions::resolve_locked;
use crate::domain::schema::schema_fields;
use crate::domain::ticket::{SERVER_OWNED_FIELDS, TicketDraft, join_values};
use crate::error::{AppError, AppResult};
use crate::session::{EditSession, SessionMode};
use crate::validate::{FieldErrors, validate_form};

/// What the user is doing with the ticket form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Create,
    Edit(String),
    /// Copy of the ticket with the given prepid.
    Clone(String),
}

impl Intent {
    /// `prepid` selects an edit and wins over `clone`; blank values count as
    /// absent.
    pub fn from_params(prepid: Option<&str>, clone: Option<&str>) -> Self {
        let present = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };
        match (present(prepid), present(clone)) {
            (Some(prepid), _) => Intent::Edit(prepid),
            (None, Some(source)) => Intent::Clone(source),
            (None, None) => Intent::Create,
        }
    }

    pub fn mode(&self) -> SessionMode {
        match self {
            Intent::Create => SessionMode::Create,
            Intent::Edit(_) => SessionMode::Edit,
            Intent::Clone(_) => SessionMode::Clone,
        }
    }

    pub fn source_prepid(&self) -> Option<&str> {
        match self {
            Intent::Create => None,
            Intent::Edit(prepid) | Intent::Clone(prepid) => Some(prepid.as_str()),
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The ticket service accepted the ticket; `prepid` is the redirect target.
    Saved { prepid: String, created: bool },
    /// Validation failed; the form is shown again with per-field errors.
    Invalid { form: TicketForm, errors: FieldErrors },
    /// The ticket service refused the request.
    Rejected { form: TicketForm, notice: String },
}

/// First step of the flow: loads the ticket into the edit session, or resets
/// the session when creating a new ticket.
pub async fn open_ticket(ctx: &AppContext, intent: &Intent) -> AppResult<TicketForm> {
    let mut session = ctx.sessions.load(&ctx.session_key)?;

    match intent.source_prepid() {
        Some(prepid) => {
            ctx.tickets.get(prepid).await?;
            let editable = ctx.tickets.get_editable(prepid).await?;

            let mut draft = editable.object;
            join_workflow_ids(&mut draft);
            session.set_ticket_data(draft);
            session.set_editing_info(editable.editing_info);
            info!(prepid, user = %ctx.config.user, "opened ticket for editing");
        }
        None => {
            session.clear_ticket_data();
            session.set_editing_info(Default::default());
            debug!("started a new ticket draft");
        }
    }

    session.set_mode(intent.mode());
    ctx.sessions.save(&ctx.session_key, &session)?;
    Ok(prepare_form(&session, intent))
}

/// The form as currently held by the edit session.
pub fn current_form(ctx: &AppContext, intent: &Intent) -> AppResult<TicketForm> {
    let session = ctx.sessions.load(&ctx.session_key)?;
    ensure_session_matches(&session, intent)?;
    Ok(prepare_form(&session, intent))
}

/// Rebuilds the form from the session draft, locks fields on edit and clears
/// the prepid on clone.
pub fn prepare_form(session: &EditSession, intent: &Intent) -> TicketForm {
    let mut form = match session.ticket_data() {
        Some(draft) => TicketForm::from_draft(draft),
        None => TicketForm::with_defaults(),
    };

    match intent {
        Intent::Edit(_) => form.lock(resolve_locked(schema_fields(), session.editing_info())),
        Intent::Clone(_) => form.set(TicketField::Prepid, ""),
        Intent::Create => {}
    }
    form
}

/// Second step of the flow: applies the edits, validates and hands the
/// ticket to the ticket service.
pub async fn submit_ticket(
    ctx: &AppContext,
    intent: &Intent,
    edits: &[(TicketField, String)],
) -> AppResult<SubmitOutcome> {
    let mut session = ctx.sessions.load(&ctx.session_key)?;
    ensure_session_matches(&session, intent)?;

    let mut form = prepare_form(&session, intent);
    let mut errors = FieldErrors::default();
    for (field, value) in edits {
        if let Err(error) = form.apply_edit(*field, value) {
            warn!(field = %field, "rejected edit to a locked field");
            errors.push(*field, error);
        }
    }

    for (field, field_errors) in validate_form(&form, &ctx.catalogs).await.iter() {
        errors.extend(field, field_errors.iter().cloned());
    }
    if !errors.is_empty() {
        debug!(fields = errors.iter().count(), "ticket failed validation");
        keep_draft(ctx, &mut session, &form)?;
        return Ok(SubmitOutcome::Invalid { form, errors });
    }

    let mut payload = form.to_draft();
    let result = match intent {
        Intent::Edit(_) => {
            if let Some(original) = session.ticket_data() {
                for key in SERVER_OWNED_FIELDS {
                    if let Some(value) = original.get(key) {
                        payload.insert(key.to_string(), value.clone());
                    }
                }
            }
            ctx.tickets.update(&payload).await
        }
        Intent::Create | Intent::Clone(_) => ctx.tickets.create(&payload).await,
    };

    match result {
        Ok(prepid) => {
            ctx.sessions.clear(&ctx.session_key)?;
            let created = !matches!(intent, Intent::Edit(_));
            info!(prepid = %prepid, created, "ticket saved");
            Ok(SubmitOutcome::Saved { prepid, created })
        }
        Err(AppError::Proxy(notice)) => {
            warn!(notice = %notice, "ticket service refused the ticket");
            keep_draft(ctx, &mut session, &form)?;
            Ok(SubmitOutcome::Rejected { form, notice })
        }
        Err(err) => Err(err),
    }
}

/// Edits and clones need the matching ticket opened first with the same
/// intent; a new ticket may only reuse a draft that has no prepid yet.
fn ensure_session_matches(session: &EditSession, intent: &Intent) -> AppResult<()> {
    let stored = session
        .ticket_data()
        .map(|draft| draft_prepid(draft).to_string());

    match (intent.source_prepid(), session.mode()) {
        (Some(_), Some(opened)) if opened != intent.mode() => {
            return Err(AppError::Session(format!(
                "the open draft was opened for {opened}; open it again to {}",
                intent.mode()
            )));
        }
        (None, Some(opened)) if opened != SessionMode::Create => {
            return Err(AppError::Session(format!(
                "the open draft was opened for {opened}; open a new ticket before submitting"
            )));
        }
        _ => {}
    }

    match (intent.source_prepid(), stored) {
        (Some(prepid), Some(stored)) if stored == prepid && session.mode().is_some() => Ok(()),
        (Some(prepid), _) => Err(AppError::Session(format!(
            "no open draft for {prepid}; open the ticket before submitting"
        ))),
        (None, Some(stored)) if !stored.is_empty() => Err(AppError::Session(format!(
            "the open draft belongs to {stored}; open a new ticket before submitting"
        ))),
        (None, _) => Ok(()),
    }
}

/// Stores the submitted values so a failed submission can be corrected and
/// sent again. The stored prepid and server-owned fields are left alone.
fn keep_draft(ctx: &AppContext, session: &mut EditSession, form: &TicketForm) -> AppResult<()> {
    let mut draft = session.ticket_data().cloned().unwrap_or_default();
    for (key, value) in form.to_draft() {
        if key != TicketField::Prepid.as_str() {
            draft.insert(key, value);
        }
    }
    session.set_ticket_data(draft);
    ctx.sessions.save(&ctx.session_key, session)
}

fn draft_prepid(draft: &TicketDraft) -> &str {
    draft
        .get(TicketField::Prepid.as_str())
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn join_workflow_ids(draft: &mut TicketDraft) {
    let key = TicketField::WorkflowIds.as_str();
    if let Some(Value::Array(ids)) = draft.get(key) {
        let joined = join_values(ids, ", ");
        draft.insert(key.to_string(), Value::String(joined));
    }
}
