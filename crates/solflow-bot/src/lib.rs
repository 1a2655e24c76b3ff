//! Webhook-triggered swap bot built on the `solflow-tx` submission core.
//!
//! A webhook notification triggers one swap: quote the configured pair
//! through the aggregator, sign the returned transaction, simulate it, then
//! hand it to [`solflow_tx::TxConfirmClient`] to submit and confirm.
//!
//! External users should start from:
//! - [`crate::runtime`] to run the packaged bot loop, either from the shipped
//!   binary or embedded with [`crate::runtime::RuntimeSetup`] overrides.

#[doc(hidden)]
mod app;
/// Runtime environment override storage used by code-driven setup APIs.
mod runtime_env;

#[doc(hidden)]
pub mod aggregator;
#[doc(hidden)]
pub mod ingress;
/// Packaged runtime entrypoints for embedding the bot.
pub mod runtime;
#[doc(hidden)]
pub mod swap;
