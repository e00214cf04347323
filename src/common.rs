mod catalog;
mod database;

pub use catalog::Catalog;
pub use database::Database;
