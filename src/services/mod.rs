// Database administration
pub mod admin;

pub use admin::AdminService;
