// Infrastructure layer (shared components)
pub mod config;
pub mod error;
pub mod metrics;
pub mod source;

// Domain layer
pub mod template;
pub mod transformer;

// Application layer
pub mod manager;
