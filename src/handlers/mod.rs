// Catalog and table management
pub mod tables;

// Row access
pub mod rows;

// Raw SQL console
pub mod query;

// Schema bootstrap and reset
pub mod admin;

pub mod common;
