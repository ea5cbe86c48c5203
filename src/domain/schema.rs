//! Declarative description of the ticket edit form.
//!
//! Every field is described once here; rendering and validation walk this
//! table instead of carrying per-field code.

use crate::domain::field::TicketField;

/// Workflow suites `runTheMatrix` can run.
pub const MATRIX_CHOICES: [&str; 8] = [
    "alca",
    "standard",
    "upgrade",
    "generator",
    "pileup",
    "premix",
    "extendedgen",
    "gpu",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Integer { min: i64, max: i64 },
    Select { choices: &'static [&'static str] },
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: TicketField,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: &'static str,
    /// Message reported when the field is left empty; `None` means optional.
    pub required: Option<&'static str>,
    pub placeholder: &'static str,
    /// Always rendered disabled and never accepted from the user.
    pub read_only: bool,
}

impl FieldSpec {
    const fn text(field: TicketField, label: &'static str, placeholder: &'static str) -> Self {
        Self {
            field,
            label,
            kind: FieldKind::Text,
            default: "",
            required: None,
            placeholder,
            read_only: false,
        }
    }

    const fn required(mut self, message: &'static str) -> Self {
        self.required = Some(message);
        self
    }

    const fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    const fn default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }
}

pub const TICKET_FORM: [FieldSpec; 22] = [
    FieldSpec {
        read_only: true,
        ..FieldSpec::text(TicketField::Prepid, "Prep ID", "")
    },
    FieldSpec::text(
        TicketField::BatchName,
        "Batch Name",
        "Subsystem name or DPG/POG. e.g. Tracker",
    )
    .required("Please provide appropriate batch name"),
    FieldSpec::text(TicketField::CmsswRelease, "CMSSW Release", "E.g CMSSW_12_3_...")
        .required("Please provide correct CMSSW release"),
    FieldSpec::text(
        TicketField::JiraTicket,
        "Jira Ticket",
        "Jira ticket associated with this request, or None",
    )
    .required("Please select Jira ticket out of given list. Or choose to create new"),
    FieldSpec::text(
        TicketField::Label,
        "Label (--label)",
        "This label will be included in ReqMgr2 workflow name",
    ),
    FieldSpec::text(TicketField::Title, "Title", "Title/purpose of the validation"),
    FieldSpec::text(
        TicketField::CmsTalkLink,
        "CMS-Talk link",
        "Put a link from where this validation was requested",
    ),
    FieldSpec::text(TicketField::HltGt, "Target HLT GT", "HLT target global tag"),
    FieldSpec::text(
        TicketField::CommonPromptGt,
        "Common Prompt GT",
        "Global tag to be used in RECO step of HLT workflow",
    ),
    FieldSpec::text(TicketField::HltGtRef, "Reference HLT GT", "HLT reference global tag"),
    FieldSpec::text(TicketField::PromptGt, "Target Prompt GT", "Prompt target global tag"),
    FieldSpec::text(
        TicketField::PromptGtRef,
        "Reference Prompt GT",
        "Prompt reference global tag",
    ),
    FieldSpec::text(TicketField::ExpressGt, "Target Express GT", "Express target global tag"),
    FieldSpec::text(
        TicketField::ExpressGtRef,
        "Reference Express GT",
        "Express reference global tag",
    ),
    FieldSpec::text(
        TicketField::InputDatasets,
        "Datasets",
        "Comma or line separated datasets. e.g: /HLTPhysics/Run2022C-v1/RAW",
    )
    .kind(FieldKind::TextArea),
    FieldSpec::text(
        TicketField::InputRuns,
        "Run numbers",
        "Comma separated run numbers e.g. 346512, 346513 or lumisections as JSON e.g. {\"354553\": [[1, 300]]}",
    )
    .kind(FieldKind::TextArea),
    FieldSpec::text(TicketField::CpuCores, "CPU Cores (-t)", "")
        .kind(FieldKind::Integer { min: 1, max: 16 })
        .default("8"),
    FieldSpec::text(TicketField::Memory, "Memory", "")
        .kind(FieldKind::Integer { min: 0, max: 30000 })
        .default("16000"),
    FieldSpec::text(TicketField::NStreams, "Streams (--nStreams)", "")
        .kind(FieldKind::Integer { min: 0, max: 16 })
        .default("2"),
    FieldSpec::text(TicketField::Matrix, "Matrix (--what)", "")
        .kind(FieldKind::Select {
            choices: &MATRIX_CHOICES,
        })
        .default("alca")
        .required("Please select a matrix"),
    FieldSpec::text(
        TicketField::WorkflowIds,
        "Workflow IDs",
        "Workflow IDs separated by comma. E.g. 1.1,1.2",
    )
    .default("6.13, 6.14")
    .required("Please provide at least one workflow ID"),
    FieldSpec::text(
        TicketField::Notes,
        "Notes",
        "Description of the request. TWiki links etc..",
    )
    .kind(FieldKind::TextArea),
];

pub fn spec_for(field: TicketField) -> &'static FieldSpec {
    // The table lists every variant in declaration order.
    &TICKET_FORM[field as usize]
}

pub fn schema_fields() -> impl Iterator<Item = TicketField> {
    TICKET_FORM.iter().map(|spec| spec.field)
}
