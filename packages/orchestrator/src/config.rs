#![allow(dead_code)]

use eyre::{eyre, Result, WrapErr};
use gravity_rs::{BridgeId, DelayRange, FinalityRule};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct Config {
    /// 32-byte bridge instance id every commitment is bound to
    pub bridge_id: BridgeId,
    pub ethereum: EthereumConfig,
    pub cosmos: CosmosConfig,
    pub orchestrator: OrchestratorConfig,
    /// Confirmation-delay rule for the Ethereum side
    pub finality: FinalityRule,
}

/// Ethereum-side configuration
#[derive(Debug, Clone)]
pub struct EthereumConfig {
    pub rpc_url: String,
    /// Address of the deployed bridge (Gravity) contract
    pub gravity_address: String,
    /// Block to start scanning events from (contract deploy height)
    pub start_block: u64,
    /// Maximum blocks per eth_getLogs request
    pub max_scan_range: u64,
}

/// Cosmos-side configuration
#[derive(Debug, Clone)]
pub struct CosmosConfig {
    pub lcd_url: String,
    pub chain_id: String,
    /// This orchestrator's bech32 account address, used for the
    /// pending-confirmation queries
    pub orchestrator_address: String,
}

/// Loop timing and external-collaborator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base URL of the external signer/broadcaster daemon
    pub signer_url: String,
    pub poll_interval: Duration,
    /// Bound on a single denom lookup before it is treated as cancelled
    pub denom_lookup_timeout: Duration,
}

/// Default functions
fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_denom_lookup_timeout_ms() -> u64 {
    10_000
}

fn default_start_block() -> u64 {
    0
}

fn default_max_scan_range() -> u64 {
    5_000
}

impl Config {
    /// Load configuration from environment variables
    /// Loads .env file if present, then reads from environment
    pub fn load() -> Result<Self> {
        Self::load_from_file(".env").or_else(|_| Self::load_from_env())
    }

    /// Load from a specific .env file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            dotenvy::from_filename(path)
                .wrap_err_with(|| format!("Failed to load .env file from {}", path))?;
        }
        Self::load_from_env()
    }

    /// Load configuration from environment variables
    fn load_from_env() -> Result<Self> {
        let bridge_id_raw = env::var("BRIDGE_ID")
            .map_err(|_| eyre!("BRIDGE_ID environment variable is required"))?;
        let bridge_id = parse_bridge_id(&bridge_id_raw)?;

        let ethereum = EthereumConfig {
            rpc_url: env::var("ETH_RPC_URL")
                .map_err(|_| eyre!("ETH_RPC_URL environment variable is required"))?,
            gravity_address: env::var("GRAVITY_CONTRACT_ADDRESS")
                .map_err(|_| eyre!("GRAVITY_CONTRACT_ADDRESS environment variable is required"))?,
            start_block: env::var("ETH_START_BLOCK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_start_block()),
            max_scan_range: env::var("ETH_MAX_SCAN_RANGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default_max_scan_range()),
        };

        let cosmos = CosmosConfig {
            lcd_url: env::var("COSMOS_LCD_URL")
                .map_err(|_| eyre!("COSMOS_LCD_URL environment variable is required"))?,
            chain_id: env::var("COSMOS_CHAIN_ID")
                .map_err(|_| eyre!("COSMOS_CHAIN_ID environment variable is required"))?,
            orchestrator_address: env::var("ORCHESTRATOR_ADDRESS")
                .map_err(|_| eyre!("ORCHESTRATOR_ADDRESS environment variable is required"))?,
        };

        let orchestrator = OrchestratorConfig {
            signer_url: env::var("SIGNER_URL")
                .map_err(|_| eyre!("SIGNER_URL environment variable is required"))?,
            poll_interval: Duration::from_millis(
                env::var("POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default_poll_interval_ms()),
            ),
            denom_lookup_timeout: Duration::from_millis(
                env::var("DENOM_LOOKUP_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(default_denom_lookup_timeout_ms()),
            ),
        };

        let finality = load_finality_rule()?;

        let config = Config {
            bridge_id,
            ethereum,
            cosmos,
            orchestrator,
            finality,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.ethereum.rpc_url.is_empty() {
            return Err(eyre!("ethereum.rpc_url cannot be empty"));
        }

        if self.ethereum.gravity_address.len() != 42
            || !self.ethereum.gravity_address.starts_with("0x")
        {
            return Err(eyre!(
                "ethereum.gravity_address must be a valid hex address (42 chars with 0x prefix)"
            ));
        }

        if self.ethereum.max_scan_range == 0 {
            return Err(eyre!("ethereum.max_scan_range must be at least 1"));
        }

        if self.cosmos.lcd_url.is_empty() {
            return Err(eyre!("cosmos.lcd_url cannot be empty"));
        }

        if self.cosmos.chain_id.is_empty() {
            return Err(eyre!("cosmos.chain_id cannot be empty"));
        }

        // bech32 account addresses are hrp + '1' + data
        if !self.cosmos.orchestrator_address.contains('1')
            || self.cosmos.orchestrator_address.len() < 8
        {
            return Err(eyre!(
                "cosmos.orchestrator_address must be a bech32 account address"
            ));
        }

        if self.orchestrator.signer_url.is_empty() {
            return Err(eyre!("orchestrator.signer_url cannot be empty"));
        }

        Ok(())
    }
}

/// A bridge id is configured either as 64 hex chars or as a short ASCII
/// label that is right-padded to 32 bytes (the conventional deployment form).
fn parse_bridge_id(raw: &str) -> Result<BridgeId> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let looks_hex = stripped.len() == 64 && stripped.chars().all(|c| c.is_ascii_hexdigit());
    let parsed = if looks_hex {
        BridgeId::from_hex(raw)
    } else {
        BridgeId::from_label(raw)
    };
    parsed.map_err(|e| eyre!("BRIDGE_ID is invalid: {}", e))
}

/// Load the finality rule from `FINALITY_DELAY_RANGES` / `FINALITY_DEFAULT_DELAY`,
/// falling back to the built-in breakpoint table.
fn load_finality_rule() -> Result<FinalityRule> {
    let ranges = match env::var("FINALITY_DELAY_RANGES") {
        Ok(raw) => Some(parse_delay_ranges(&raw)?),
        Err(_) => None,
    };
    let default_delay = env::var("FINALITY_DEFAULT_DELAY")
        .ok()
        .map(|v| {
            v.parse::<u64>()
                .wrap_err("FINALITY_DEFAULT_DELAY must be a u64")
        })
        .transpose()?;

    Ok(match (ranges, default_delay) {
        (None, None) => FinalityRule::default(),
        (ranges, default_delay) => FinalityRule::new(
            ranges.unwrap_or_else(default_delay_ranges),
            default_delay.unwrap_or(6),
        ),
    })
}

/// The built-in table, mirrored from `FinalityRule::default`
fn default_delay_ranges() -> Vec<DelayRange> {
    vec![
        DelayRange { from: 4, to: 6, delay: 10 },
        DelayRange { from: 2018, to: 2021, delay: 0 },
        DelayRange { from: 31337, to: 31338, delay: 0 },
    ]
}

/// Parse a range list of the form `"4-6:10,2018-2021:0"`
fn parse_delay_ranges(raw: &str) -> Result<Vec<DelayRange>> {
    let mut ranges = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (span, delay) = part
            .split_once(':')
            .ok_or_else(|| eyre!("range {:?} must look like from-to:delay", part))?;
        let (from, to) = span
            .split_once('-')
            .ok_or_else(|| eyre!("range {:?} must look like from-to:delay", part))?;
        let from: u64 = from.trim().parse().wrap_err_with(|| format!("bad range start in {:?}", part))?;
        let to: u64 = to.trim().parse().wrap_err_with(|| format!("bad range end in {:?}", part))?;
        let delay: u64 = delay.trim().parse().wrap_err_with(|| format!("bad delay in {:?}", part))?;
        if from >= to {
            return Err(eyre!("range {:?} is empty (start must be below end)", part));
        }
        ranges.push(DelayRange { from, to, delay });
    }
    if ranges.is_empty() {
        return Err(eyre!("FINALITY_DELAY_RANGES is set but contains no ranges"));
    }
    Ok(ranges)
}
