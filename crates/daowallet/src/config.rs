use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use daotx::{Network, ScriptConfig};
use datatypes::types::FeeRate;
use serde::Deserialize;
use std::fs;

#[derive(Parser, Debug)]
#[command(about = "Deposit into and withdraw from the Nervos DAO")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the wallet's DAO cells and when they unlock
    List,
    /// Lock capacity into a new deposit
    Deposit {
        /// Amount in shannons
        #[arg(long)]
        amount: u64,
    },
    /// Request withdrawal of a deposit, or unlock a matured request
    Withdraw {
        #[arg(long)]
        tx_hash: String,
        /// Capacity of the cell in shannons
        #[arg(long)]
        amount: u64,
    },
}

#[derive(Deserialize, Debug)]
pub struct Config {
    pub ckb: CkbConfig,
    pub wallet: WalletConfig,
}

#[derive(Deserialize, Debug)]
pub struct CkbConfig {
    pub rpc_url: String,
    /// Defaults to `rpc_url`; recent nodes serve the indexer RPC themselves.
    pub indexer_url: Option<String>,
    #[serde(default)]
    pub network: Network,
    /// Replaces the network's built-in script deps, for dev chains.
    pub scripts: Option<ScriptConfig>,
}

impl CkbConfig {
    pub fn script_config(&self) -> ScriptConfig {
        self.scripts
            .clone()
            .unwrap_or_else(|| self.network.scripts())
    }
}

#[derive(Deserialize, Debug)]
pub struct WalletConfig {
    pub private_key: String,
    #[serde(default)]
    pub fee_rate: FeeRate,
}

pub fn read_config() -> Result<(Cli, Config)> {
    let args = Cli::parse();
    let cfg = load_config(&args.config)?;
    Ok((args, cfg))
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_content =
        fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path))?;
    let config: Config = toml::from_str(&config_content).context("failed to parse config file")?;

    Ok(config)
}
