pub mod adapters;
pub mod artifacts;
pub mod engine;
pub mod fabric;
pub mod render;
pub mod scheduler;
pub mod store;
pub mod validation;
