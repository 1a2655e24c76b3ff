use std::{
    net::{AddrParseError, SocketAddr},
    num::NonZeroUsize,
    str::FromStr,
};

use solana_keypair::Keypair;
use thiserror::Error;

use super::{read_bool_env, read_env_var};

/// JSON-RPC endpoint used when `SOLFLOW_RPC_URL` is unset.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
/// Aggregator base URL used when `SOLFLOW_QUOTE_API_URL` is unset.
pub const DEFAULT_QUOTE_API_URL: &str = "https://quote-api.jup.ag/v6";
/// Webhook bind address used when `SOLFLOW_WEBHOOK_BIND_ADDR` is unset.
pub const DEFAULT_WEBHOOK_BIND_ADDR: &str = "0.0.0.0:5001";
/// Wrapped SOL, the input side of the swap unless overridden.
pub const DEFAULT_INPUT_MINT: &str = "So11111111111111111111111111111111111111112";
/// USDC, the output side of the swap unless overridden.
pub const DEFAULT_OUTPUT_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Errors raised while reading the startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `SOLFLOW_PRIVATE_KEY` is not set.
    #[error("SOLFLOW_PRIVATE_KEY is not set")]
    MissingPrivateKey,
    /// `SOLFLOW_PRIVATE_KEY` is set but does not decode into a keypair.
    ///
    /// The offending value is never echoed back.
    #[error("SOLFLOW_PRIVATE_KEY is not a valid base-58 keypair: {reason}")]
    InvalidPrivateKey { reason: String },
    /// `SOLFLOW_WEBHOOK_BIND_ADDR` could not be parsed as a socket address.
    #[error("invalid SOLFLOW_WEBHOOK_BIND_ADDR address `{value}`: {source}")]
    InvalidWebhookBindAddr {
        value: String,
        source: AddrParseError,
    },
}

pub fn read_rpc_url() -> String {
    read_env_var("SOLFLOW_RPC_URL")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string())
}

pub fn read_quote_api_url() -> String {
    read_env_var("SOLFLOW_QUOTE_API_URL")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_QUOTE_API_URL.to_string())
}

pub fn read_input_mint() -> String {
    read_env_var("SOLFLOW_INPUT_MINT")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_INPUT_MINT.to_string())
}

pub fn read_output_mint() -> String {
    read_env_var("SOLFLOW_OUTPUT_MINT")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_OUTPUT_MINT.to_string())
}

pub fn read_swap_amount() -> u64 {
    read_env_var("SOLFLOW_SWAP_AMOUNT")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(10_000_000)
}

pub fn read_max_slippage_bps() -> u64 {
    read_env_var("SOLFLOW_MAX_SLIPPAGE_BPS")
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(1_000)
}

pub fn read_priority_fee_lamports() -> u64 {
    read_env_var("SOLFLOW_PRIORITY_FEE_LAMPORTS")
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(100_000)
}

pub fn read_skip_preflight() -> bool {
    read_bool_env("SOLFLOW_SKIP_PREFLIGHT", true)
}

pub fn read_worker_threads() -> usize {
    read_env_var("SOLFLOW_WORKER_THREADS")
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
}

/// Reads the webhook listener bind address from `SOLFLOW_WEBHOOK_BIND_ADDR`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidWebhookBindAddr`] when the value does not
/// parse as a socket address.
pub fn read_webhook_bind_addr() -> Result<SocketAddr, ConfigError> {
    let value = read_env_var("SOLFLOW_WEBHOOK_BIND_ADDR")
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_WEBHOOK_BIND_ADDR.to_string());
    SocketAddr::from_str(&value)
        .map_err(|source| ConfigError::InvalidWebhookBindAddr { value, source })
}

/// Reads and decodes the signing keypair from `SOLFLOW_PRIVATE_KEY`.
///
/// Kept out of [`BotConfig`] so the secret never travels with the loggable
/// settings.
///
/// # Errors
///
/// Returns [`ConfigError::MissingPrivateKey`] when the variable is unset and
/// [`ConfigError::InvalidPrivateKey`] when it does not decode into a 64-byte
/// ed25519 keypair.
pub fn read_signing_keypair() -> Result<Keypair, ConfigError> {
    let encoded = read_env_var("SOLFLOW_PRIVATE_KEY")
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingPrivateKey)?;
    let bytes = bs58::decode(encoded.trim())
        .into_vec()
        .map_err(|source| ConfigError::InvalidPrivateKey {
            reason: source.to_string(),
        })?;
    Keypair::from_bytes(&bytes).map_err(|source| ConfigError::InvalidPrivateKey {
        reason: source.to_string(),
    })
}

/// Resolved bot settings, read once at startup.
///
/// The signing key is read separately via [`read_signing_keypair`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub rpc_url: String,
    pub quote_api_url: String,
    pub webhook_bind_addr: SocketAddr,
    pub input_mint: String,
    pub output_mint: String,
    pub swap_amount: u64,
    pub max_slippage_bps: u64,
    pub priority_fee_lamports: u64,
    pub skip_preflight: bool,
}

impl BotConfig {
    /// Reads every setting from the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the offending variable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: read_rpc_url(),
            quote_api_url: read_quote_api_url(),
            webhook_bind_addr: read_webhook_bind_addr()?,
            input_mint: read_input_mint(),
            output_mint: read_output_mint(),
            swap_amount: read_swap_amount(),
            max_slippage_bps: read_max_slippage_bps(),
            priority_fee_lamports: read_priority_fee_lamports(),
            skip_preflight: read_skip_preflight(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, PoisonError};

    use solana_signer::Signer;

    use super::*;
    use crate::runtime_env::{clear_runtime_env_overrides, set_runtime_env_overrides};

    // The override map is process-global, so env tests serialize on one lock.
    static ENV_GUARD: Mutex<()> = Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_GUARD.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn overrides(entries: &[(&str, &str)]) {
        set_runtime_env_overrides(
            entries
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string())),
        );
    }

    #[test]
    fn defaults_apply_without_overrides() {
        let _guard = lock_env();
        clear_runtime_env_overrides();

        let config = BotConfig::from_env();
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
            assert_eq!(config.quote_api_url, DEFAULT_QUOTE_API_URL);
            assert_eq!(config.webhook_bind_addr.port(), 5_001);
            assert_eq!(config.input_mint, DEFAULT_INPUT_MINT);
            assert_eq!(config.output_mint, DEFAULT_OUTPUT_MINT);
            assert_eq!(config.swap_amount, 10_000_000);
            assert_eq!(config.max_slippage_bps, 1_000);
            assert_eq!(config.priority_fee_lamports, 100_000);
            assert!(config.skip_preflight);
        }
    }

    #[test]
    fn overrides_feed_every_setting() {
        let _guard = lock_env();
        overrides(&[
            ("SOLFLOW_RPC_URL", "http://localhost:8899"),
            ("SOLFLOW_QUOTE_API_URL", "http://localhost:9001/v6/"),
            ("SOLFLOW_WEBHOOK_BIND_ADDR", "127.0.0.1:0"),
            ("SOLFLOW_INPUT_MINT", "MintAAA"),
            ("SOLFLOW_OUTPUT_MINT", "MintBBB"),
            ("SOLFLOW_SWAP_AMOUNT", "42"),
            ("SOLFLOW_MAX_SLIPPAGE_BPS", "250"),
            ("SOLFLOW_PRIORITY_FEE_LAMPORTS", "0"),
            ("SOLFLOW_SKIP_PREFLIGHT", "no"),
        ]);

        let config = BotConfig::from_env();
        clear_runtime_env_overrides();
        assert!(config.is_ok());
        if let Ok(config) = config {
            assert_eq!(config.rpc_url, "http://localhost:8899");
            assert_eq!(config.quote_api_url, "http://localhost:9001/v6/");
            assert!(config.webhook_bind_addr.ip().is_loopback());
            assert_eq!(config.input_mint, "MintAAA");
            assert_eq!(config.output_mint, "MintBBB");
            assert_eq!(config.swap_amount, 42);
            assert_eq!(config.max_slippage_bps, 250);
            assert_eq!(config.priority_fee_lamports, 0);
            assert!(!config.skip_preflight);
        }
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let _guard = lock_env();
        overrides(&[
            ("SOLFLOW_SWAP_AMOUNT", "not-a-number"),
            ("SOLFLOW_MAX_SLIPPAGE_BPS", "0"),
        ]);

        let amount = read_swap_amount();
        let slippage = read_max_slippage_bps();
        clear_runtime_env_overrides();
        assert_eq!(amount, 10_000_000);
        assert_eq!(slippage, 1_000);
    }

    #[test]
    fn invalid_bind_addr_is_rejected() {
        let _guard = lock_env();
        overrides(&[("SOLFLOW_WEBHOOK_BIND_ADDR", "not-an-addr")]);

        let result = read_webhook_bind_addr();
        clear_runtime_env_overrides();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidWebhookBindAddr { .. })
        ));
    }

    #[test]
    fn signing_keypair_round_trips() {
        let _guard = lock_env();
        let keypair = Keypair::new();
        let encoded = keypair.to_base58_string();
        overrides(&[("SOLFLOW_PRIVATE_KEY", encoded.as_str())]);

        let loaded = read_signing_keypair();
        clear_runtime_env_overrides();
        assert!(loaded.is_ok());
        if let Ok(loaded) = loaded {
            assert_eq!(loaded.pubkey(), keypair.pubkey());
        }
    }

    #[test]
    fn signing_keypair_rejects_bad_values() {
        let _guard = lock_env();
        clear_runtime_env_overrides();
        assert!(matches!(
            read_signing_keypair(),
            Err(ConfigError::MissingPrivateKey)
        ));

        overrides(&[("SOLFLOW_PRIVATE_KEY", "!!!not-base58!!!")]);
        let garbage = read_signing_keypair();
        clear_runtime_env_overrides();
        assert!(matches!(
            garbage,
            Err(ConfigError::InvalidPrivateKey { .. })
        ));
    }
}
