use async_trait::async_trait;

use crate::domain::ticket::{EditableTicket, Ticket, TicketDraft};
use crate::error::AppResult;

/// Ticket CRUD and search on the remote ticket service.
#[async_trait]
pub trait TicketService: Send + Sync {
    async fn get(&self, prepid: &str) -> AppResult<Ticket>;
    async fn get_editable(&self, prepid: &str) -> AppResult<EditableTicket>;
    /// Creates a ticket and returns the prepid the service assigned.
    async fn create(&self, draft: &TicketDraft) -> AppResult<String>;
    /// Updates a ticket and returns its prepid.
    async fn update(&self, draft: &TicketDraft) -> AppResult<String>;
    async fn search(&self, query: &[(String, String)]) -> AppResult<Vec<Ticket>>;
}
