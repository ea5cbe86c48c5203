//! In-memory fakes for the service traits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::ticket::{EditableTicket, Ticket, TicketDraft};
use crate::error::{AppError, AppResult};
use crate::services::{MetadataCatalog, ReleaseCatalog, SessionStore, TicketService};
use crate::validate::Catalogs;

#[derive(Default)]
pub struct FakeCatalog {
    datasets: BTreeSet<String>,
    runs: BTreeSet<String>,
    failing: bool,
    lookups: Arc<AtomicUsize>,
}

impl FakeCatalog {
    pub fn with_datasets(datasets: &[&str]) -> Self {
        Self {
            datasets: datasets.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn runs(mut self, runs: &[&str]) -> Self {
        self.runs = runs.iter().map(|run| run.to_string()).collect();
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn lookups(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.lookups)
    }

    fn lookup(&self, set: &BTreeSet<String>, key: &str) -> AppResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Catalog("catalog offline".to_string()));
        }
        Ok(set.contains(key))
    }
}

#[async_trait]
impl MetadataCatalog for FakeCatalog {
    async fn dataset_exists(&self, dataset: &str) -> AppResult<bool> {
        self.lookup(&self.datasets, dataset)
    }

    async fn run_exists(&self, run: &str) -> AppResult<bool> {
        self.lookup(&self.runs, run)
    }
}

#[derive(Default)]
pub struct FakeReleases {
    releases: BTreeSet<String>,
    failing: bool,
    lookups: Arc<AtomicUsize>,
}

impl FakeReleases {
    pub fn new(releases: &[&str]) -> Self {
        Self {
            releases: releases.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn lookups(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.lookups)
    }
}

#[async_trait]
impl ReleaseCatalog for FakeReleases {
    async fn release_exists(&self, release: &str) -> AppResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(AppError::Catalog("GitHub returned 503".to_string()));
        }
        Ok(self.releases.contains(release))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TicketCall {
    Create(TicketDraft),
    Update(TicketDraft),
}

/// Ticket service backed by a map of editable tickets. Created tickets get
/// sequential prepids; `reject_with` makes create and update fail and
/// `failing_search` makes search fail.
#[derive(Default)]
pub struct FakeTicketService {
    tickets: BTreeMap<String, EditableTicket>,
    rejection: Option<String>,
    search_fails: bool,
    calls: Mutex<Vec<TicketCall>>,
}

impl FakeTicketService {
    pub fn with_ticket(mut self, prepid: &str, ticket: EditableTicket) -> Self {
        self.tickets.insert(prepid.to_string(), ticket);
        self
    }

    pub fn reject_with(mut self, message: &str) -> Self {
        self.rejection = Some(message.to_string());
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<TicketCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: TicketCall) -> AppResult<()> {
        self.calls
            .lock()
            .map_err(|_| AppError::Proxy("poisoned".to_string()))?
            .push(call);
        match &self.rejection {
            Some(message) => Err(AppError::Proxy(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TicketService for FakeTicketService {
    async fn get(&self, prepid: &str) -> AppResult<Ticket> {
        self.tickets
            .get(prepid)
            .map(|_| Ticket {
                prepid: prepid.to_string(),
                ..Ticket::default()
            })
            .ok_or_else(|| not_found(prepid))
    }

    async fn get_editable(&self, prepid: &str) -> AppResult<EditableTicket> {
        self.tickets
            .get(prepid)
            .cloned()
            .ok_or_else(|| not_found(prepid))
    }

    async fn create(&self, draft: &TicketDraft) -> AppResult<String> {
        self.record(TicketCall::Create(draft.clone()))?;
        Ok(format!("TICKET-{}", self.tickets.len() + 100))
    }

    async fn update(&self, draft: &TicketDraft) -> AppResult<String> {
        self.record(TicketCall::Update(draft.clone()))?;
        Ok(draft
            .get("prepid")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string())
    }

    async fn search(&self, _query: &[(String, String)]) -> AppResult<Vec<Ticket>> {
        if self.search_fails {
            return Err(AppError::Proxy("search is unavailable".to_string()));
        }
        Ok(self
            .tickets
            .keys()
            .map(|prepid| Ticket {
                prepid: prepid.clone(),
                ..Ticket::default()
            })
            .collect())
    }
}

fn not_found(prepid: &str) -> AppError {
    AppError::TicketNotFound {
        prepid: prepid.to_string(),
        message: format!("Object {prepid} does not exist"),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        api_url: Some("http://ticket-api.test".to_string()),
        api_token: None,
        api_user: None,
        api_password: None,
        dbs_url: "http://dbs.test".to_string(),
        github_url: "http://github.test".to_string(),
        grid_cert: None,
        grid_key: None,
        check_release: false,
        http_timeout: Duration::from_secs(5),
        user: "tester".to_string(),
    }
}

pub fn test_context(
    tickets: Arc<dyn TicketService>,
    catalog: FakeCatalog,
    sessions: Arc<dyn SessionStore>,
) -> AppContext {
    AppContext::new(
        test_config(),
        tickets,
        Catalogs {
            metadata: Arc::new(catalog),
            releases: None,
        },
        sessions,
        "tester-session".to_string(),
    )
}
