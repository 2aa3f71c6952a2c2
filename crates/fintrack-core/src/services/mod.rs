//! Services shared by fintrack clients

mod database;

pub use database::DatabaseService;
