pub(super) use std::sync::Arc;

pub(super) use super::super::config::*;
pub(super) use crate::{
    aggregator::{AggregatorClient, AggregatorError, QuoteParams},
    ingress::{IngressError, WebhookListener, WebhookTrigger},
    swap::SwapFlow,
};
pub(super) use solana_signer::Signer;
pub(super) use solflow_tx::{
    ConnectionError, JsonRpcConnection, RpcConnection, SendTransactionConfig, TxConfirmClient,
};
pub(super) use tokio::sync::mpsc;
