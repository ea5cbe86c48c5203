pub mod field;
pub mod form;
pub mod permissions;
pub mod runs;
pub mod schema;
pub mod ticket;
