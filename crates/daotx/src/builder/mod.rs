//! Skeleton builders for the three DAO steps. Each returns a fee-paid,
//! placeholder-filled transaction plus its signing entries.

pub mod deposit;
pub mod unlock;
pub mod withdraw;

use crate::context::ChainContext;
use crate::dao;
use crate::error::{DaoError, Result};
use crate::skeleton::TransactionSkeleton;
use ckb_types::packed::Script;
use datatypes::types::Cell;

pub use deposit::build_deposit;
pub use unlock::build_unlock;
pub use withdraw::build_withdrawal_request;

fn ensure_dao_cell(cell: &Cell, ctx: &ChainContext<'_>) -> Result<()> {
    if dao::is_dao_cell(cell, ctx.scripts) {
        Ok(())
    } else {
        Err(DaoError::UnexpectedStage("cell does not carry the DAO type script"))
    }
}

/// A skeleton with the DAO script dep, plus the secp256k1 dep group when
/// `lock` needs it.
fn dao_skeleton(lock: &Script, ctx: &ChainContext<'_>) -> TransactionSkeleton {
    let mut skeleton = TransactionSkeleton::new();
    skeleton.add_cell_dep(ctx.scripts.dao.cell_dep());
    if ctx.scripts.secp256k1_blake160.matches(lock) {
        skeleton.add_cell_dep(ctx.scripts.secp256k1_blake160.cell_dep());
    }
    skeleton
}
