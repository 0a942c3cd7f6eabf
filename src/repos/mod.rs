pub mod articles;
pub mod error;
pub mod users;
