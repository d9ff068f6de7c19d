//! The chain model the engine works on. Scripts, outputs and transactions are
//! `ckb-types` values; this module adds the live-cell view and wallet knobs.

use anyhow::{anyhow, Result};
use ckb_types::{
    bytes::Bytes,
    core::{Capacity, HeaderView, TransactionView},
    packed::{CellOutput, OutPoint, Script},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub use ckb_types::H256;

pub const ONE_CKB: u64 = 100_000_000;

pub type Header = HeaderView;

/// Reads a hash written with or without the `0x` prefix.
pub fn parse_h256(s: &str) -> Result<H256> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    H256::from_str(trimmed).map_err(|e| anyhow!("invalid hash {}: {:?}", s, e))
}

/// Minimal capacity, in shannons, of `output` holding `data_len` bytes.
pub fn occupied_capacity(output: &CellOutput, data_len: usize) -> Result<u64> {
    let data = Capacity::bytes(data_len).map_err(|e| anyhow!("data capacity: {:?}", e))?;
    let occupied = output
        .occupied_capacity(data)
        .map_err(|e| anyhow!("occupied capacity: {:?}", e))?;
    Ok(occupied.as_u64())
}

pub fn with_capacity(output: &CellOutput, shannons: u64) -> CellOutput {
    output
        .clone()
        .as_builder()
        .capacity(Capacity::shannons(shannons).pack())
        .build()
}

/// A live cell: output, data and where it sits on chain. Cells the engine
/// creates itself carry no out point yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub output: CellOutput,
    pub data: Bytes,
    pub out_point: Option<OutPoint>,
    pub block_hash: Option<H256>,
    pub block_number: Option<u64>,
}

impl Cell {
    pub fn new(output: CellOutput, data: Bytes) -> Self {
        Cell {
            output,
            data,
            ..Default::default()
        }
    }

    pub fn capacity(&self) -> u64 {
        let capacity: Capacity = self.output.capacity().unpack();
        capacity.as_u64()
    }

    pub fn lock(&self) -> Script {
        self.output.lock()
    }

    pub fn type_script(&self) -> Option<Script> {
        self.output.type_().to_opt()
    }

    pub fn occupied_capacity(&self) -> Result<u64> {
        occupied_capacity(&self.output, self.data.len())
    }
}

/// A committed transaction together with the block that holds it.
#[derive(Debug, Clone)]
pub struct TransactionWithStatus {
    pub transaction: TransactionView,
    pub block_hash: Option<H256>,
}

/// Fee tiers in shannons per 1000 serialized bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeRate {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl FeeRate {
    pub fn shannons_per_kb(self) -> u64 {
        match self {
            FeeRate::Slow => 1_000,
            FeeRate::Normal => 100_000,
            FeeRate::Fast => 10_000_000,
        }
    }

    /// Fee for a transaction of `size` bytes, rounded up.
    pub fn fee(self, size: usize) -> u64 {
        let rate = self.shannons_per_kb() as u128;
        let fee = (size as u128 * rate).div_ceil(1000);
        fee as u64
    }
}

impl FromStr for FeeRate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(FeeRate::Slow),
            "normal" => Ok(FeeRate::Normal),
            "fast" => Ok(FeeRate::Fast),
            other => Err(anyhow!("unknown fee rate: {}", other)),
        }
    }
}

/// Points at one withdrawal-request cell the user wants to finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaoUnlockableAmount {
    pub amount: u64,
    pub tx_hash: H256,
}

/// Which live cells to fetch: everything guarded by `lock`, optionally
/// narrowed to one type script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFilter {
    pub lock: Script,
    pub type_script: Option<Script>,
}

impl CellFilter {
    pub fn by_lock(lock: Script) -> Self {
        Self {
            lock,
            type_script: None,
        }
    }

    pub fn with_type(mut self, type_script: Script) -> Self {
        self.type_script = Some(type_script);
        self
    }
}

/// Inputs sharing one lock script, signed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningEntry {
    pub lock: Script,
    pub input_indices: Vec<usize>,
    pub message: H256,
}
