pub mod manager;
pub mod models;
pub mod schema;
pub mod seeder;
pub mod service;

pub use manager::{DatabaseError, DatabaseManager};
pub use service::PgIdentityStore;
