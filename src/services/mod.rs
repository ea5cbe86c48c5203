pub mod catalog;
pub mod session_store;
pub mod ticket_service;

pub use catalog::{MetadataCatalog, ReleaseCatalog};
pub use session_store::SessionStore;
pub use ticket_service::TicketService;
