//! Field validation for the ticket form: schema rules, cross-field rules and
//! the catalog lookups in [`metadata`].

pub mod metadata;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::field::TicketField;
use crate::domain::form::TicketForm;
use crate::domain::runs::{RunSpec, split_entries};
use crate::domain::schema::{FieldKind, TICKET_FORM};
use crate::services::{MetadataCatalog, ReleaseCatalog};

static WORKFLOW_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)*$").expect("workflow id pattern"));

const COMMON_PROMPT_GT_REQUIRED: &str = "Since you have chosen to use HLT global tag, you are required to provide common prompt global tag, which is to be used in RECO step of workflow";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("{0}")]
    Required(String),
    #[error("not a whole number")]
    NotAnInteger,
    #[error("must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64 },
    #[error("not a valid choice: {0}")]
    InvalidChoice(String),
    #[error("invalid format: {}", .0.join(", "))]
    InvalidFormat(Vec<String>),
    #[error("run numbers must have exactly 6 digits: {}", .0.join(", "))]
    NumericFormat(Vec<String>),
    #[error("accepted only comma separated list of runs or JSON formatted lumisections ({0})")]
    MalformedRunSpec(String),
    #[error("not found in catalog: {}", .0.join(", "))]
    NotFound(Vec<String>),
    #[error("{0}")]
    CrossFieldViolation(String),
    #[error("catalog lookup failed: {0}")]
    CatalogUnavailable(String),
    #[error("CMSSW release {0} is not valid")]
    ReleaseNotFound(String),
    #[error("field is locked for this ticket")]
    Locked,
}

/// Errors collected per field during one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<TicketField, Vec<FieldError>>,
}

impl FieldErrors {
    pub fn push(&mut self, field: TicketField, error: FieldError) {
        self.errors.entry(field).or_default().push(error);
    }

    pub fn extend(&mut self, field: TicketField, errors: impl IntoIterator<Item = FieldError>) {
        for error in errors {
            self.push(field, error);
        }
    }

    pub fn get(&self, field: TicketField) -> &[FieldError] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: TicketField) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TicketField, &[FieldError])> {
        self.errors
            .iter()
            .map(|(field, errors)| (*field, errors.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (field, errors) in self.iter() {
            for error in errors {
                writeln!(f, "{field}: {error}")?;
            }
        }
        Ok(())
    }
}

/// Catalogs consulted while validating a submission.
#[derive(Clone)]
pub struct Catalogs {
    pub metadata: Arc<dyn MetadataCatalog>,
    pub releases: Option<Arc<dyn ReleaseCatalog>>,
}

/// Runs every validator over the form and returns all errors found.
pub async fn validate_form(form: &TicketForm, catalogs: &Catalogs) -> FieldErrors {
    let mut errors = validate_schema(form);
    validate_cross_fields(form, &mut errors);

    let datasets = split_entries(form.get(TicketField::InputDatasets));
    let runs = match RunSpec::parse(form.get(TicketField::InputRuns)) {
        Ok(spec) => spec.run_ids(),
        Err(err) => {
            errors.push(TicketField::InputRuns, FieldError::MalformedRunSpec(err.0));
            Vec::new()
        }
    };
    let release = form.get(TicketField::CmsswRelease).trim().to_string();
    let check_release = match &catalogs.releases {
        Some(releases) if !release.is_empty() => Some(Arc::clone(releases)),
        _ => None,
    };

    let (dataset_errors, run_errors, release_error) = tokio::join!(
        metadata::check_datasets(Arc::clone(&catalogs.metadata), &datasets),
        metadata::check_runs(Arc::clone(&catalogs.metadata), &runs),
        async move {
            match check_release {
                Some(releases) => metadata::check_release(releases.as_ref(), &release).await,
                None => None,
            }
        },
    );

    errors.extend(TicketField::InputDatasets, dataset_errors);
    errors.extend(TicketField::InputRuns, run_errors);
    errors.extend(TicketField::CmsswRelease, release_error);
    errors
}

/// Checks driven by the schema table: required fields, integer ranges,
/// select choices and workflow ID syntax.
pub fn validate_schema(form: &TicketForm) -> FieldErrors {
    let mut errors = FieldErrors::default();

    for spec in TICKET_FORM.iter() {
        let value = form.get(spec.field).trim();
        if value.is_empty() {
            if let Some(message) = spec.required {
                errors.push(spec.field, FieldError::Required(message.to_string()));
            }
            continue;
        }

        match spec.kind {
            FieldKind::Integer { min, max } => match value.parse::<i64>() {
                Ok(number) if (min..=max).contains(&number) => {}
                Ok(_) => errors.push(spec.field, FieldError::OutOfRange { min, max }),
                Err(_) => errors.push(spec.field, FieldError::NotAnInteger),
            },
            FieldKind::Select { choices } => {
                if !choices.contains(&value) {
                    errors.push(spec.field, FieldError::InvalidChoice(value.to_string()));
                }
            }
            FieldKind::Text | FieldKind::TextArea => {}
        }
    }

    let bad_ids = split_entries(form.get(TicketField::WorkflowIds))
        .into_iter()
        .filter(|id| !WORKFLOW_ID.is_match(id))
        .collect::<Vec<_>>();
    if !bad_ids.is_empty() {
        errors.push(TicketField::WorkflowIds, FieldError::InvalidFormat(bad_ids));
    }

    errors
}

/// Co-requirements between fields: a target HLT GT needs a common prompt GT,
/// and datasets and runs go together.
pub fn validate_cross_fields(form: &TicketForm, errors: &mut FieldErrors) {
    let hlt_gt = form.get(TicketField::HltGt).trim();
    let common_prompt_gt = form.get(TicketField::CommonPromptGt).trim();
    if !hlt_gt.is_empty() && common_prompt_gt.is_empty() {
        errors.push(
            TicketField::CommonPromptGt,
            FieldError::CrossFieldViolation(COMMON_PROMPT_GT_REQUIRED.to_string()),
        );
    }

    let has_datasets = !form.get(TicketField::InputDatasets).trim().is_empty();
    let has_runs = !form.get(TicketField::InputRuns).trim().is_empty();
    if has_runs && !has_datasets {
        errors.push(
            TicketField::InputDatasets,
            FieldError::CrossFieldViolation(
                "Input dataset field is required when 'Run numbers' are provided".to_string(),
            ),
        );
    }
    if has_datasets && !has_runs {
        errors.push(
            TicketField::InputRuns,
            FieldError::CrossFieldViolation(
                "Run numbers field is required when 'Dataset' field is provided".to_string(),
            ),
        );
    }
}
