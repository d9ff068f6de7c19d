use crate::dao::{self, DAO_LOCK_PERIOD_EPOCHS};
use crate::error::{DaoError, Result};
use crate::since::{compare, parse_absolute_epoch_since, parse_epoch, EpochNumberWithFraction, Since};
use anyhow::anyhow;
use ckb_sdk::util::minimal_unlock_point;
use datatypes::traits::HeaderSource;
use datatypes::types::{Cell, Header};
use std::cmp::Ordering;
use tracing::debug;

/// Earliest point a deposit made at `deposit` could be withdrawn.
pub fn deposit_earliest_since(deposit: EpochNumberWithFraction) -> Since {
    Since::AbsoluteEpoch(EpochNumberWithFraction::new_unchecked(
        deposit.number() + DAO_LOCK_PERIOD_EPOCHS,
        deposit.index(),
        deposit.length(),
    ))
}

/// Earliest unlock point of a deposit whose withdrawal was requested in
/// `withdraw_header`: the end of the first full lock period covering the
/// request.
pub fn withdraw_earliest_since(deposit_header: &Header, withdraw_header: &Header) -> Result<Since> {
    if compare(withdraw_header.epoch(), deposit_header.epoch()) == Ordering::Less {
        return Err(DaoError::MalformedCellData(format!(
            "withdraw at epoch {} precedes its deposit at {}",
            withdraw_header.epoch(),
            deposit_header.epoch()
        )));
    }
    Ok(Since::AbsoluteEpoch(minimal_unlock_point(
        deposit_header,
        withdraw_header,
    )))
}

/// Header of the block that committed `cell`.
pub async fn cell_header(cell: &Cell, headers: &dyn HeaderSource) -> Result<Header> {
    let header = match (&cell.block_hash, cell.block_number) {
        (Some(hash), _) => headers.get_header(hash).await?,
        (None, Some(number)) => headers.get_header_by_number(number).await?,
        (None, None) => {
            return Err(DaoError::MalformedCellData(
                "cell carries no block reference".to_string(),
            ))
        }
    };
    header.ok_or_else(|| {
        DaoError::Rpc(anyhow!(
            "header of block {:?} / {:?} not found",
            cell.block_hash,
            cell.block_number
        ))
    })
}

pub async fn earliest_unlock_since(cell: &Cell, headers: &dyn HeaderSource) -> Result<Since> {
    let header = cell_header(cell, headers).await?;
    if dao::is_deposit(cell) {
        return Ok(deposit_earliest_since(header.epoch()));
    }
    let deposit_number = dao::deposit_block_number(cell)?;
    let deposit_header = headers
        .get_header_by_number(deposit_number)
        .await?
        .ok_or_else(|| {
            DaoError::DepositNotFound(format!("no header at block {}", deposit_number))
        })?;
    withdraw_earliest_since(&deposit_header, &header)
}

/// True once the chain at `current_epoch` has reached `earliest`.
pub fn is_mature(earliest: Since, current_epoch: u64) -> Result<bool> {
    let earliest = parse_absolute_epoch_since(earliest.to_raw())?;
    Ok(compare(parse_epoch(current_epoch), earliest) != Ordering::Less)
}

/// Fails with `NotYetMature` unless the chain has reached `earliest`.
pub fn ensure_mature(earliest: Since, current: &Header) -> Result<()> {
    let current = current.epoch();
    if is_mature(earliest, current.full_value())? {
        return Ok(());
    }
    Err(DaoError::NotYetMature {
        earliest: parse_absolute_epoch_since(earliest.to_raw())?,
        current,
    })
}

pub async fn is_unlockable(
    cell: &Cell,
    current: &Header,
    headers: &dyn HeaderSource,
) -> Result<bool> {
    let earliest = earliest_unlock_since(cell, headers).await?;
    let unlockable = is_mature(earliest, current.epoch().full_value())?;
    debug!(
        "cell {:?} earliest {:#x} unlockable {}",
        cell.out_point,
        earliest.to_raw(),
        unlockable
    );
    Ok(unlockable)
}
