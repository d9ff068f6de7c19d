//! Lifecycle classification of DAO cells and the DAO's consensus arithmetic.

use crate::error::{DaoError, Result};
use crate::scripts::ScriptConfig;
use ckb_dao_utils::extract_dao_data;
use ckb_sdk::util::calculate_dao_maximum_withdraw4;
use ckb_types::{bytes::Bytes, packed::Byte32};
use datatypes::types::{Cell, Header};

/// Minimum lock duration of a deposit, in epochs.
pub const DAO_LOCK_PERIOD_EPOCHS: u64 = 180;

/// Data of a fresh deposit cell.
pub const DEPOSIT_DATA: [u8; 8] = [0; 8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaoStage {
    Deposit,
    WithdrawalRequested,
}

pub fn is_dao_cell(cell: &Cell, scripts: &ScriptConfig) -> bool {
    cell.type_script()
        .map(|script| scripts.dao.matches(&script))
        .unwrap_or(false)
}

pub fn is_deposit(cell: &Cell) -> bool {
    cell.data[..] == DEPOSIT_DATA[..]
}

pub fn stage(cell: &Cell) -> DaoStage {
    if is_deposit(cell) {
        DaoStage::Deposit
    } else {
        DaoStage::WithdrawalRequested
    }
}

/// Block number of the deposit a withdrawal-request cell descends from.
pub fn deposit_block_number(cell: &Cell) -> Result<u64> {
    if is_deposit(cell) {
        return Err(DaoError::UnexpectedStage(
            "deposit cell carries no deposit block number",
        ));
    }
    let raw: [u8; 8] = cell.data[..].try_into().map_err(|_| {
        DaoError::MalformedCellData(format!(
            "expect 8 bytes of withdraw data, got {}",
            cell.data.len()
        ))
    })?;
    Ok(u64::from_le_bytes(raw))
}

pub fn withdrawal_data(deposit_block_number: u64) -> Bytes {
    Bytes::copy_from_slice(&deposit_block_number.to_le_bytes())
}

/// AR, the accumulated rate, from a header's DAO field.
pub fn accumulated_rate(dao: &Byte32) -> u64 {
    let (ar, _c, _s, _u) = extract_dao_data(dao.clone());
    ar
}

/// Capacity `deposit` is worth when withdrawn in `withdraw_header`'s block:
/// the occupied part is returned as is, the rest grows by the ratio of the
/// two accumulated rates.
pub fn calculate_maximum_withdraw(
    deposit: &Cell,
    deposit_header: &Header,
    withdraw_header: &Header,
) -> Result<u64> {
    if accumulated_rate(&deposit_header.dao()) == 0 {
        return Err(DaoError::MalformedCellData(
            "deposit header has zero accumulated rate".to_string(),
        ));
    }
    let occupied = deposit.occupied_capacity().map_err(|_| DaoError::Overflow)?;
    if deposit.capacity() < occupied {
        return Err(DaoError::Overflow);
    }
    Ok(calculate_dao_maximum_withdraw4(
        deposit_header,
        withdraw_header,
        &deposit.output,
        occupied,
    ))
}
