//! Ticketing-system source reader

pub mod queries;
pub mod reader;

pub use reader::PgTicketingReader;
