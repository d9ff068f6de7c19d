use crate::context::ChainContext;
use crate::error::{DaoError, Result};
use crate::skeleton::TransactionSkeleton;
use crate::witness;
use ckb_types::{
    bytes::Bytes,
    packed::{CellOutput, Script},
    prelude::*,
};
use datatypes::types::{Cell, CellFilter, FeeRate};
use tracing::{debug, info};

enum Balance {
    Done(TransactionSkeleton),
    Short { required: u64 },
}

/// Plain capacity cells owned by the fee locks, in source order.
async fn fee_candidates(
    skeleton: &TransactionSkeleton,
    fee_locks: &[Script],
    ctx: &ChainContext<'_>,
) -> Result<Vec<Cell>> {
    let mut candidates: Vec<Cell> = Vec::new();
    for lock in fee_locks {
        let cells = ctx.cells.list_cells(&CellFilter::by_lock(lock.clone())).await?;
        for cell in cells {
            let Some(out_point) = &cell.out_point else {
                continue;
            };
            if cell.type_script().is_some() || !cell.data.is_empty() {
                continue;
            }
            if skeleton.contains_input(out_point)
                || candidates.iter().any(|c| c.out_point.as_ref() == Some(out_point))
            {
                continue;
            }
            candidates.push(cell);
        }
    }
    Ok(candidates)
}

fn change_cell(lock: &Script) -> Cell {
    Cell::new(CellOutput::new_builder().lock(lock.clone()).build(), Bytes::new())
}

fn fee_of(skeleton: &TransactionSkeleton, fee_rate: FeeRate) -> Result<u64> {
    let tx = skeleton.to_transaction()?;
    Ok(fee_rate.fee(tx.data().serialized_size_in_block()))
}

/// Tries to close the skeleton as it stands, first without a change output,
/// then with one to `change_lock`.
fn balance(
    skeleton: &TransactionSkeleton,
    change_lock: &Script,
    fee_rate: FeeRate,
) -> Result<Balance> {
    let inputs = skeleton.inputs_capacity()?;
    let outputs = skeleton.outputs_capacity()?;

    let fee = fee_of(skeleton, fee_rate)?;
    let required = outputs.checked_add(fee).ok_or(DaoError::Overflow)?;
    if inputs < required {
        return Ok(Balance::Short { required });
    }
    if inputs == required {
        return Ok(Balance::Done(skeleton.clone()));
    }

    let mut with_change = skeleton.clone();
    let change = change_cell(change_lock);
    let min_change = change.occupied_capacity().map_err(|_| DaoError::Overflow)?;
    let idx = with_change.add_output(change);
    let fee = fee_of(&with_change, fee_rate)?;
    let required = outputs
        .checked_add(fee)
        .and_then(|v| v.checked_add(min_change))
        .ok_or(DaoError::Overflow)?;
    if inputs < required {
        return Ok(Balance::Short { required });
    }
    // capacity is a fixed 8 bytes, setting it does not change the size
    with_change.set_output_capacity(idx, inputs - outputs - fee);
    Ok(Balance::Done(with_change))
}

/// Adds fee inputs owned by `fee_locks` until inputs cover outputs plus the
/// fee, sending any excess to a change cell on the first lock. The caller's
/// skeleton is left untouched.
pub async fn pay_fee(
    skeleton: &TransactionSkeleton,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
) -> Result<TransactionSkeleton> {
    let change_lock = fee_locks.first().ok_or(DaoError::NoFeeAddress)?;
    let mut candidates = fee_candidates(skeleton, fee_locks, ctx).await?.into_iter();
    let mut working = skeleton.clone();
    loop {
        witness::fill_lock_placeholders(&mut working, ctx.scripts)?;
        let required = match balance(&working, change_lock, fee_rate)? {
            Balance::Done(done) => {
                info!(
                    "fee paid: {} inputs, {} outputs, rate {:?}",
                    done.inputs().len(),
                    done.outputs().len(),
                    fee_rate
                );
                return Ok(done);
            }
            Balance::Short { required } => required,
        };
        let Some(cell) = candidates.next() else {
            return Err(DaoError::InsufficientFunds {
                required,
                available: working.inputs_capacity()?,
            });
        };
        debug!("add fee input {:?}", cell.out_point);
        if ctx.scripts.secp256k1_blake160.matches(&cell.lock()) {
            working.add_cell_dep(ctx.scripts.secp256k1_blake160.cell_dep());
        }
        working.add_input(cell, 0);
    }
}
