pub mod auth;
pub mod clients;
pub mod documents;
pub mod notifications;
pub mod reports;
pub mod settings;
pub mod subscriptions;
