//! End-to-end flows the wallet drives: locate a DAO cell, build the right
//! transaction for its stage, seal it and send it.

use crate::builder::{build_deposit, build_unlock, build_withdrawal_request};
use crate::context::ChainContext;
use crate::dao::{self, DaoStage};
use crate::error::{DaoError, Result};
use crate::maturity;
use crate::sender::submit;
use crate::signer::seal;
use crate::since::Since;
use datatypes::traits::{Broadcaster, Signer};
use ckb_types::{packed::Script, prelude::*};
use datatypes::types::{Cell, CellFilter, DaoUnlockableAmount, FeeRate, H256};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaoCellInfo {
    pub cell: Cell,
    pub stage: DaoStage,
    pub earliest_since: Since,
    /// Only a matured withdrawal request can be unlocked.
    pub unlockable: bool,
}

impl DaoCellInfo {
    pub fn unlockable_amount(&self) -> Option<DaoUnlockableAmount> {
        creating_tx(&self.cell).map(|tx_hash| DaoUnlockableAmount {
            amount: self.cell.capacity(),
            tx_hash,
        })
    }
}

fn creating_tx(cell: &Cell) -> Option<H256> {
    cell.out_point.as_ref().map(|op| op.tx_hash().unpack())
}

async fn dao_cells(owner_locks: &[Script], ctx: &ChainContext<'_>) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    for lock in owner_locks {
        let filter = CellFilter::by_lock(lock.clone()).with_type(ctx.scripts.dao_type_script());
        let found = ctx.cells.list_cells(&filter).await?;
        cells.extend(found.into_iter().filter(|c| dao::is_dao_cell(c, ctx.scripts)));
    }
    Ok(cells)
}

pub async fn list_dao_cells(
    owner_locks: &[Script],
    ctx: &ChainContext<'_>,
) -> Result<Vec<DaoCellInfo>> {
    let tip = ctx.headers.get_tip_header().await?;
    let mut infos = Vec::new();
    for cell in dao_cells(owner_locks, ctx).await? {
        let stage = dao::stage(&cell);
        let earliest_since = maturity::earliest_unlock_since(&cell, ctx.headers).await?;
        let unlockable = stage == DaoStage::WithdrawalRequested
            && maturity::is_mature(earliest_since, tip.epoch().full_value())?;
        infos.push(DaoCellInfo {
            cell,
            stage,
            earliest_since,
            unlockable,
        });
    }
    Ok(infos)
}

/// The live DAO cell `amount` refers to.
pub async fn find_cell(
    amount: &DaoUnlockableAmount,
    owner_locks: &[Script],
    ctx: &ChainContext<'_>,
) -> Result<Cell> {
    dao_cells(owner_locks, ctx)
        .await?
        .into_iter()
        .find(|c| {
            c.capacity() == amount.amount && creating_tx(c).as_ref() == Some(&amount.tx_hash)
        })
        .ok_or(DaoError::CellNotFound)
}

/// Requests withdrawal of a deposit, or unlocks a withdrawal request,
/// depending on the stage of the cell `amount` points at.
pub async fn withdraw_or_unlock(
    amount: &DaoUnlockableAmount,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
    signer: &dyn Signer,
    broadcaster: &dyn Broadcaster,
) -> Result<H256> {
    let cell = find_cell(amount, fee_locks, ctx).await?;
    let unsigned = match dao::stage(&cell) {
        DaoStage::Deposit => {
            info!("requesting withdrawal of {:?}", cell.out_point);
            build_withdrawal_request(&cell, fee_locks, fee_rate, ctx).await?
        }
        DaoStage::WithdrawalRequested => {
            info!("unlocking {:?}", cell.out_point);
            build_unlock(&cell, fee_locks, fee_rate, ctx).await?
        }
    };
    let tx = seal(unsigned, signer).await?;
    submit(&tx, broadcaster).await
}

pub async fn deposit(
    amount: u64,
    owner_lock: &Script,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
    signer: &dyn Signer,
    broadcaster: &dyn Broadcaster,
) -> Result<H256> {
    let unsigned = build_deposit(amount, owner_lock, fee_locks, fee_rate, ctx).await?;
    let tx = seal(unsigned, signer).await?;
    submit(&tx, broadcaster).await
}
