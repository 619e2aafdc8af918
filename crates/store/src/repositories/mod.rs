pub mod notification_repo;
pub mod profile_repo;
pub mod webhook_repo;

pub use notification_repo::NotificationRepo;
pub use profile_repo::ProfileRepo;
pub use webhook_repo::WebhookRepo;
