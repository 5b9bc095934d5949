pub mod broadcast;
pub mod configuration;
pub mod digest;
pub mod domain;
pub mod github_client;
pub mod notifier;
pub mod routes;
pub mod startup;
pub mod store;
pub mod subscriptions;
pub mod telemetry;
pub mod templates;
mod utils;
pub mod verification;
