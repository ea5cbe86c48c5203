use std::fmt;

/// A field of the ticket edit form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TicketField {
    Prepid,
    BatchName,
    CmsswRelease,
    JiraTicket,
    Label,
    Title,
    CmsTalkLink,
    HltGt,
    CommonPromptGt,
    HltGtRef,
    PromptGt,
    PromptGtRef,
    ExpressGt,
    ExpressGtRef,
    InputDatasets,
    InputRuns,
    CpuCores,
    Memory,
    NStreams,
    Matrix,
    WorkflowIds,
    Notes,
}

impl TicketField {
    pub const ALL: [TicketField; 22] = [
        TicketField::Prepid,
        TicketField::BatchName,
        TicketField::CmsswRelease,
        TicketField::JiraTicket,
        TicketField::Label,
        TicketField::Title,
        TicketField::CmsTalkLink,
        TicketField::HltGt,
        TicketField::CommonPromptGt,
        TicketField::HltGtRef,
        TicketField::PromptGt,
        TicketField::PromptGtRef,
        TicketField::ExpressGt,
        TicketField::ExpressGtRef,
        TicketField::InputDatasets,
        TicketField::InputRuns,
        TicketField::CpuCores,
        TicketField::Memory,
        TicketField::NStreams,
        TicketField::Matrix,
        TicketField::WorkflowIds,
        TicketField::Notes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketField::Prepid => "prepid",
            TicketField::BatchName => "batch_name",
            TicketField::CmsswRelease => "cmssw_release",
            TicketField::JiraTicket => "jira_ticket",
            TicketField::Label => "label",
            TicketField::Title => "title",
            TicketField::CmsTalkLink => "cms_talk_link",
            TicketField::HltGt => "hlt_gt",
            TicketField::CommonPromptGt => "common_prompt_gt",
            TicketField::HltGtRef => "hlt_gt_ref",
            TicketField::PromptGt => "prompt_gt",
            TicketField::PromptGtRef => "prompt_gt_ref",
            TicketField::ExpressGt => "express_gt",
            TicketField::ExpressGtRef => "express_gt_ref",
            TicketField::InputDatasets => "input_datasets",
            TicketField::InputRuns => "input_runs",
            TicketField::CpuCores => "cpu_cores",
            TicketField::Memory => "memory",
            TicketField::NStreams => "n_streams",
            TicketField::Matrix => "matrix",
            TicketField::WorkflowIds => "workflow_ids",
            TicketField::Notes => "notes",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == value)
    }
}

impl fmt::Display for TicketField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
