pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod subscription_repo;
pub use subscription_repo::SubscriptionRepository;
pub mod payment_history_repo;
pub use payment_history_repo::PaymentHistoryRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
