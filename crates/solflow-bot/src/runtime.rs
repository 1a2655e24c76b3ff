use std::net::SocketAddr;

use thiserror::Error;

/// Public runtime error surface for packaged bot entrypoints.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Tokio runtime initialization failed before the bot started.
    #[error("failed to build tokio runtime: {0}")]
    BuildTokioRuntime(std::io::Error),
    /// Runtime runloop exited with an operational error.
    #[error("runtime runloop failed: {0}")]
    Runloop(String),
}

impl From<crate::app::runtime::RuntimeEntrypointError> for RuntimeError {
    fn from(value: crate::app::runtime::RuntimeEntrypointError) -> Self {
        match value {
            crate::app::runtime::RuntimeEntrypointError::BuildTokioRuntime { source } => {
                Self::BuildTokioRuntime(source)
            }
            crate::app::runtime::RuntimeEntrypointError::Runloop { reason } => {
                Self::Runloop(reason)
            }
        }
    }
}

/// Programmatic runtime setup that mirrors the bot's SOLFLOW environment
/// variables.
///
/// This lets embedders configure startup in code while keeping the env-based
/// configuration model for everything else.
#[derive(Clone, Debug, Default)]
pub struct RuntimeSetup {
    /// Env-like key/value overrides applied before runtime bootstrap.
    env_overrides: Vec<(String, String)>,
}

impl RuntimeSetup {
    /// Creates an empty setup that preserves standard env/default behavior.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            env_overrides: Vec::new(),
        }
    }

    /// Adds an explicit env-style override.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.push((key.into(), value.into()));
        self
    }

    /// Sets `RUST_LOG`.
    #[must_use]
    pub fn with_rust_log_filter(self, filter: impl Into<String>) -> Self {
        self.with_env("RUST_LOG", filter)
    }

    /// Sets `SOLFLOW_RPC_URL`.
    #[must_use]
    pub fn with_rpc_url(self, rpc_url: impl Into<String>) -> Self {
        self.with_env("SOLFLOW_RPC_URL", rpc_url)
    }

    /// Sets `SOLFLOW_QUOTE_API_URL`.
    #[must_use]
    pub fn with_quote_api_url(self, quote_api_url: impl Into<String>) -> Self {
        self.with_env("SOLFLOW_QUOTE_API_URL", quote_api_url)
    }

    /// Sets `SOLFLOW_PRIVATE_KEY` from a base58-encoded keypair.
    #[must_use]
    pub fn with_private_key(self, private_key: impl Into<String>) -> Self {
        self.with_env("SOLFLOW_PRIVATE_KEY", private_key)
    }

    /// Sets `SOLFLOW_WEBHOOK_BIND_ADDR`.
    #[must_use]
    pub fn with_webhook_bind_addr(self, bind_addr: SocketAddr) -> Self {
        self.with_env("SOLFLOW_WEBHOOK_BIND_ADDR", bind_addr.to_string())
    }

    /// Sets `SOLFLOW_INPUT_MINT`.
    #[must_use]
    pub fn with_input_mint(self, input_mint: impl Into<String>) -> Self {
        self.with_env("SOLFLOW_INPUT_MINT", input_mint)
    }

    /// Sets `SOLFLOW_OUTPUT_MINT`.
    #[must_use]
    pub fn with_output_mint(self, output_mint: impl Into<String>) -> Self {
        self.with_env("SOLFLOW_OUTPUT_MINT", output_mint)
    }

    /// Sets `SOLFLOW_SWAP_AMOUNT` in base units of the input mint.
    #[must_use]
    pub fn with_swap_amount(self, swap_amount: u64) -> Self {
        self.with_env("SOLFLOW_SWAP_AMOUNT", swap_amount.to_string())
    }

    /// Sets `SOLFLOW_MAX_SLIPPAGE_BPS`.
    #[must_use]
    pub fn with_max_slippage_bps(self, max_slippage_bps: u64) -> Self {
        self.with_env("SOLFLOW_MAX_SLIPPAGE_BPS", max_slippage_bps.to_string())
    }

    /// Sets `SOLFLOW_PRIORITY_FEE_LAMPORTS`.
    #[must_use]
    pub fn with_priority_fee_lamports(self, priority_fee_lamports: u64) -> Self {
        self.with_env(
            "SOLFLOW_PRIORITY_FEE_LAMPORTS",
            priority_fee_lamports.to_string(),
        )
    }

    /// Sets `SOLFLOW_SKIP_PREFLIGHT`.
    #[must_use]
    pub fn with_skip_preflight(self, enabled: bool) -> Self {
        self.with_env("SOLFLOW_SKIP_PREFLIGHT", enabled.to_string())
    }

    /// Sets `SOLFLOW_WORKER_THREADS`.
    #[must_use]
    pub fn with_worker_threads(self, worker_threads: usize) -> Self {
        self.with_env("SOLFLOW_WORKER_THREADS", worker_threads.to_string())
    }

    /// Applies setup overrides to the runtime config layer.
    fn apply(&self) {
        crate::runtime_env::set_runtime_env_overrides(self.env_overrides.clone());
    }
}

/// Runs the packaged bot runtime on a Tokio multi-thread runtime.
///
/// # Errors
/// Returns any runtime initialization or shutdown error from the underlying bot runtime.
pub fn run() -> Result<(), RuntimeError> {
    crate::runtime_env::clear_runtime_env_overrides();
    Ok(crate::app::runtime::run()?)
}

/// Runs the packaged bot runtime with explicit code-driven setup overrides.
///
/// # Errors
/// Returns any runtime initialization or shutdown error from the underlying bot runtime.
pub fn run_with_setup(setup: &RuntimeSetup) -> Result<(), RuntimeError> {
    setup.apply();
    Ok(crate::app::runtime::run()?)
}

/// Async variant of [`run`], for callers that already own a Tokio runtime.
///
/// # Errors
/// Returns any runtime initialization or shutdown error from the underlying bot runtime.
pub async fn run_async() -> Result<(), RuntimeError> {
    crate::runtime_env::clear_runtime_env_overrides();
    Ok(crate::app::runtime::run_async().await?)
}

/// Async variant of [`run_with_setup`], for callers that already own a Tokio runtime.
///
/// # Errors
/// Returns any runtime initialization or shutdown error from the underlying bot runtime.
pub async fn run_async_with_setup(setup: &RuntimeSetup) -> Result<(), RuntimeError> {
    setup.apply();
    Ok(crate::app::runtime::run_async().await?)
}
