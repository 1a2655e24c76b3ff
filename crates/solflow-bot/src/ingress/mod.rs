//! Webhook ingress listener.

mod server;

pub use server::{IngressError, WebhookListener, WebhookTrigger};
