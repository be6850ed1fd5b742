pub mod auth;
pub mod client;
pub mod notification;
pub mod report;
pub mod settings;
pub mod subscription;
