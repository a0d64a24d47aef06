pub mod analytics;
pub mod answer_keys;
pub mod backup_exchange;
pub mod classes;
pub mod core;
pub mod results;
pub mod setup;
pub mod students;
