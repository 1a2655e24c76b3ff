//! Webhook-triggered swap flow.

mod flow;

pub use flow::{FlowError, SwapFlow};
