pub mod db;
pub mod holidays;
pub mod models;
pub mod naming;

pub use rusqlite;
