use super::*;
use thiserror::Error;

// Triggers that arrive while a swap is in flight queue up to this depth.
const TRIGGER_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub(in crate::app::runtime) enum RuntimeRunloopError {
    #[error("configuration failed: {source}")]
    Config { source: ConfigError },
    #[error("rpc connection setup failed: {source}")]
    Connection { source: ConnectionError },
    #[error("aggregator client setup failed: {source}")]
    Aggregator { source: AggregatorError },
    #[error("webhook listener setup failed: {source}")]
    Ingress { source: IngressError },
}

pub(in crate::app::runtime) async fn run_bot() -> Result<(), RuntimeRunloopError> {
    init_tracing();
    let config = BotConfig::from_env().map_err(|source| RuntimeRunloopError::Config { source })?;
    let keypair = read_signing_keypair().map_err(|source| RuntimeRunloopError::Config { source })?;
    tracing::info!(
        rpc_url = %config.rpc_url,
        quote_api_url = %config.quote_api_url,
        webhook_bind_addr = %config.webhook_bind_addr,
        input_mint = %config.input_mint,
        output_mint = %config.output_mint,
        swap_amount = config.swap_amount,
        max_slippage_bps = config.max_slippage_bps,
        priority_fee_lamports = config.priority_fee_lamports,
        skip_preflight = config.skip_preflight,
        signer = %keypair.pubkey(),
        "swap bot starting"
    );

    let connection = JsonRpcConnection::new(config.rpc_url.as_str())
        .map_err(|source| RuntimeRunloopError::Connection { source })?;
    let connection: Arc<dyn RpcConnection> = Arc::new(connection);
    let confirm_client =
        TxConfirmClient::new(Arc::clone(&connection)).with_send_config(SendTransactionConfig {
            skip_preflight: config.skip_preflight,
            preflight_commitment: None,
        });
    let aggregator = AggregatorClient::new(config.quote_api_url.as_str())
        .map_err(|source| RuntimeRunloopError::Aggregator { source })?;
    let quote_params = QuoteParams::new(
        config.input_mint.clone(),
        config.output_mint.clone(),
        config.swap_amount,
        config.max_slippage_bps,
    );
    let flow = SwapFlow::new(
        aggregator,
        Arc::clone(&connection),
        confirm_client,
        keypair,
        quote_params,
        config.priority_fee_lamports,
    );

    let (trigger_tx, mut trigger_rx) = mpsc::channel::<WebhookTrigger>(TRIGGER_CHANNEL_CAPACITY);
    let listener = WebhookListener::bind(config.webhook_bind_addr)
        .await
        .map_err(|source| RuntimeRunloopError::Ingress { source })?;
    let local_addr = listener.local_addr();
    let listener_task = listener.spawn(trigger_tx);
    tracing::info!(%local_addr, "webhook listener started; waiting for notifications");

    loop {
        tokio::select! {
            maybe_trigger = trigger_rx.recv() => {
                let Some(trigger) = maybe_trigger else {
                    break;
                };
                tracing::info!(peer = %trigger.peer, "webhook trigger received; starting swap");
                if let Err(error) = flow.run().await {
                    tracing::error!(error = %error, "swap flow failed");
                }
            }
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("ctrl-c received; shutting down"),
                    Err(error) => {
                        tracing::warn!(error = %error, "ctrl-c handler failed; shutting down");
                    }
                }
                break;
            }
        }
    }

    listener_task.abort();
    Ok(())
}
