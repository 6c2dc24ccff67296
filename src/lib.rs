pub mod api_router;
pub mod core;
pub mod directory;
pub mod responses;
pub mod tickets;
