pub mod auth;
pub mod billing;
pub mod client_service;
pub mod credential_migration;
pub mod document_service;
pub mod notifications;
pub mod recurrence;
pub mod report_service;
pub mod reports;
pub mod subscription_service;
