pub mod cache;
pub mod observability;
pub mod providers;
pub mod tasks;
