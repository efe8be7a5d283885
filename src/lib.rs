pub mod app;
pub mod config;
pub mod employees;
pub mod error;
pub mod salaries;
pub mod state;
pub mod store;
