//! Finds the deposit a withdrawal-request cell was created from. Unlocking
//! needs both headers, and the DAO script checks the deposit header.

use crate::context::ChainContext;
use crate::dao::{self, DEPOSIT_DATA};
use crate::error::{DaoError, Result};
use ckb_types::{bytes::Bytes, packed::OutPoint, prelude::*};
use datatypes::types::{Cell, Header, TransactionWithStatus, H256};
use std::collections::HashMap;
use tracing::{debug, info};

/// The deposit a withdrawal cell descends from, together with its header.
#[derive(Debug, Clone)]
pub struct DepositCell {
    pub cell: Cell,
    pub header: Header,
}

struct Candidate {
    input_index: usize,
    out_point: OutPoint,
    header: Header,
}

async fn fetch_transaction(
    ctx: &ChainContext<'_>,
    cache: &mut HashMap<H256, TransactionWithStatus>,
    hash: H256,
) -> Result<TransactionWithStatus> {
    if let Some(tx) = cache.get(&hash) {
        return Ok(tx.clone());
    }
    let tx = ctx
        .txs
        .get_transaction(&hash)
        .await
        .map_err(|e| DaoError::DepositNotFound(format!("lookup of tx {:#x} failed: {}", hash, e)))?
        .ok_or_else(|| DaoError::DepositNotFound(format!("tx {:#x} is unknown", hash)))?;
    cache.insert(hash, tx.clone());
    Ok(tx)
}

async fn fetch_header(ctx: &ChainContext<'_>, tx: &TransactionWithStatus) -> Result<Header> {
    let block_hash = tx.block_hash.as_ref().ok_or_else(|| {
        DaoError::DepositNotFound(format!("tx {} is not committed", tx.transaction.hash()))
    })?;
    ctx.headers
        .get_header(block_hash)
        .await
        .map_err(|e| DaoError::DepositNotFound(format!("header {:#x} failed: {}", block_hash, e)))?
        .ok_or_else(|| DaoError::DepositNotFound(format!("header {:#x} is unknown", block_hash)))
}

pub async fn resolve_deposit_cell(
    withdraw_cell: &Cell,
    ctx: &ChainContext<'_>,
) -> Result<DepositCell> {
    let deposit_number = dao::deposit_block_number(withdraw_cell)?;
    let withdraw_out_point = withdraw_cell.out_point.clone().ok_or_else(|| {
        DaoError::MalformedCellData("withdraw cell has no out point".to_string())
    })?;
    let withdraw_index: u32 = withdraw_out_point.index().unpack();

    let mut cache = HashMap::new();
    let withdraw_tx =
        fetch_transaction(ctx, &mut cache, withdraw_out_point.tx_hash().unpack()).await?;

    let mut candidates = Vec::new();
    for (input_index, input) in withdraw_tx.transaction.inputs().into_iter().enumerate() {
        let previous = input.previous_output();
        let prev_tx = fetch_transaction(ctx, &mut cache, previous.tx_hash().unpack()).await?;
        let idx: u32 = previous.index().unpack();
        let Some((output, data)) = prev_tx.transaction.output_with_data(idx as usize) else {
            continue;
        };
        let capacity: u64 = output.capacity().unpack();
        if data[..] != DEPOSIT_DATA[..]
            || output.lock() != withdraw_cell.lock()
            || output.type_().to_opt() != withdraw_cell.type_script()
            || capacity != withdraw_cell.capacity()
        {
            continue;
        }
        let header = fetch_header(ctx, &prev_tx).await?;
        if header.number() != deposit_number {
            continue;
        }
        candidates.push(Candidate {
            input_index,
            out_point: previous,
            header,
        });
    }

    // Several identical deposits from one block: the DAO keeps each
    // withdraw output at the index of its deposit input.
    if candidates.len() > 1 {
        candidates.retain(|c| c.input_index == withdraw_index as usize);
    }
    debug!(
        "withdraw {} has {} deposit candidates at block {}",
        withdraw_out_point,
        candidates.len(),
        deposit_number
    );
    if candidates.len() != 1 {
        return Err(DaoError::AmbiguousDepositReference {
            candidates: candidates.len(),
        });
    }
    let Candidate {
        out_point, header, ..
    } = candidates.remove(0);

    info!("withdraw {} pairs with deposit {}", withdraw_out_point, out_point);
    Ok(DepositCell {
        cell: Cell {
            output: withdraw_cell.output.clone(),
            data: Bytes::from_static(&DEPOSIT_DATA),
            out_point: Some(out_point),
            block_hash: Some(header.hash().unpack()),
            block_number: Some(header.number()),
        },
        header,
    })
}
