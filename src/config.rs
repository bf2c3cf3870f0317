//! Process configuration, loaded from the environment (ambient stack,
//! Modeled on [`crate::auth::AuthConfig::from_env`]: every field has
//! a sane default so the binary runs unconfigured, and each override is
//! a single env var.

use crate::types::{Instrument, Symbol};
use rust_decimal::Decimal;
use std::str::FromStr;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime configuration for the reference binary.
#[derive(Clone, Debug)]
pub struct Config {
    /// `HOST:PORT` to bind the HTTP listener to.
    pub bind_addr: String,
    /// Where persisted order/trade records go. `None` means stdout.
    pub persistence_path: Option<String>,
    /// Bound on the trade broadcast channel (the overflow policy kicks
    /// in once a subscriber falls this far behind).
    pub trade_channel_capacity: usize,
    /// Tick/lot applied to a symbol seen for the first time with no
    /// explicit `SYMBOLS` entry.
    pub default_instrument: Instrument,
    /// Per-symbol tick/lot overrides, parsed from `SYMBOLS`.
    pub symbols: Vec<(Symbol, Instrument)>,
}

impl Config {
    /// Loads configuration from the environment:
    ///
    /// - `BIND_ADDR` (default `0.0.0.0:8080`)
    /// - `PERSISTENCE_PATH` (default unset — stdout)
    /// - `TRADE_CHANNEL_CAPACITY` (default 4096)
    /// - `DEFAULT_TICK`, `DEFAULT_LOT` (default `0.00000001` each)
    /// - `SYMBOLS` — `SYMBOL:tick:lot,...`, e.g. `BTC-USD:0.01:0.0001`
    pub fn from_env() -> Self {
        let default_tick = env_or("DEFAULT_TICK", Decimal::new(1, 8));
        let default_lot = env_or("DEFAULT_LOT", Decimal::new(1, 8));

        let symbols = std::env::var("SYMBOLS")
            .ok()
            .map(|raw| parse_symbols(&raw))
            .unwrap_or_default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            persistence_path: std::env::var("PERSISTENCE_PATH").ok(),
            trade_channel_capacity: env_or("TRADE_CHANNEL_CAPACITY", crate::trade_publisher::DEFAULT_CAPACITY),
            default_instrument: Instrument::new(default_tick, default_lot),
            symbols,
        }
    }
}

fn parse_symbols(raw: &str) -> Vec<(Symbol, Instrument)> {
    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            let mut parts = entry.splitn(3, ':');
            let symbol = parts.next()?.trim();
            let tick: Decimal = parts.next()?.trim().parse().ok()?;
            let lot: Decimal = parts.next()?.trim().parse().ok()?;
            Some((Symbol::new(symbol), Instrument::new(tick, lot)))
        })
        .collect()
}
