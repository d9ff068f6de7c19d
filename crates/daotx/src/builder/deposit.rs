use crate::context::ChainContext;
use crate::dao::DEPOSIT_DATA;
use crate::error::{DaoError, Result};
use crate::fee_rate::pay_fee;
use crate::signer::{prepare_signing_entries, UnsignedTx};
use crate::skeleton::TransactionSkeleton;
use ckb_types::{
    bytes::Bytes,
    core::Capacity,
    packed::{CellOutput, Script},
    prelude::*,
};
use datatypes::types::{occupied_capacity, Cell, FeeRate};
use tracing::info;

/// Locks `amount` shannons into a new DAO deposit cell owned by `owner_lock`.
pub async fn build_deposit(
    amount: u64,
    owner_lock: &Script,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
) -> Result<UnsignedTx> {
    let output = CellOutput::new_builder()
        .capacity(Capacity::shannons(amount).pack())
        .lock(owner_lock.clone())
        .type_(Some(ctx.scripts.dao_type_script()).pack())
        .build();
    let minimum =
        occupied_capacity(&output, DEPOSIT_DATA.len()).map_err(|_| DaoError::Overflow)?;
    if amount < minimum {
        return Err(DaoError::DepositTooSmall { amount, minimum });
    }

    let mut skeleton = TransactionSkeleton::new();
    skeleton.add_cell_dep(ctx.scripts.dao.cell_dep());
    skeleton.add_output(Cell::new(output, Bytes::from_static(&DEPOSIT_DATA)));

    let skeleton = pay_fee(&skeleton, fee_locks, fee_rate, ctx).await?;
    info!("deposit of {} shannons", amount);
    prepare_signing_entries(skeleton, ctx.scripts)
}
