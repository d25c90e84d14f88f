mod database;
mod result;

pub use database::Database;
pub use result::{DriverError, Error};
