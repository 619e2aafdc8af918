//! SFMCP event bus and notification delivery.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MonitoringEvent`]: the event envelope published by monitoring checks.
//! - [`delivery`]: external delivery channels (webhook, email).
//! - [`DeliveryRouter`]: background task fanning events out to the channels.

pub mod bus;
pub mod delivery;
pub mod router;

pub use bus::{EventBus, MonitoringEvent};
pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::webhook::{WebhookDelivery, WebhookError};
pub use router::{DeliveryReport, DeliveryRouter};
