use super::{dao_skeleton, ensure_dao_cell};
use crate::context::ChainContext;
use crate::dao::{self, DaoStage};
use crate::error::{DaoError, Result};
use crate::fee_rate::pay_fee;
use crate::maturity;
use crate::pairing;
use crate::signer::{prepare_signing_entries, UnsignedTx};
use ckb_types::{
    bytes::Bytes,
    core::Capacity,
    packed::{CellOutput, Script, WitnessArgs},
    prelude::*,
};
use datatypes::types::{Cell, FeeRate};
use tracing::info;

/// Phase two: consumes a matured withdrawal-request cell and pays deposit
/// plus compensation to the first fee lock. Maturity is checked before
/// anything is built.
pub async fn build_unlock(
    withdraw: &Cell,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
) -> Result<UnsignedTx> {
    ensure_dao_cell(withdraw, ctx)?;
    if dao::stage(withdraw) != DaoStage::WithdrawalRequested {
        return Err(DaoError::UnexpectedStage(
            "deposit must request withdrawal before unlock",
        ));
    }
    let payout_lock = fee_locks.first().ok_or(DaoError::NoFeeAddress)?;

    let tip = ctx.headers.get_tip_header().await?;
    let earliest = maturity::earliest_unlock_since(withdraw, ctx.headers).await?;
    maturity::ensure_mature(earliest, &tip)?;

    let withdraw_header = maturity::cell_header(withdraw, ctx.headers).await?;
    let deposit = pairing::resolve_deposit_cell(withdraw, ctx).await?;
    let maximum =
        dao::calculate_maximum_withdraw(&deposit.cell, &deposit.header, &withdraw_header)?;
    let compensation = maximum
        .checked_sub(withdraw.capacity())
        .ok_or(DaoError::Overflow)?;

    let mut skeleton = dao_skeleton(&withdraw.lock(), ctx);
    let deposit_header_idx = skeleton.add_header_dep(deposit.header.hash().unpack());
    skeleton.add_header_dep(withdraw_header.hash().unpack());
    // the DAO script reads the deposit header's index from input_type
    let input_type = Bytes::copy_from_slice(&(deposit_header_idx as u64).to_le_bytes());
    let witness = WitnessArgs::new_builder()
        .input_type(Some(input_type).pack())
        .build();
    skeleton.add_input_with_witness(withdraw.clone(), earliest.to_raw(), witness.as_bytes());
    skeleton.add_compensation(compensation);
    let payout = CellOutput::new_builder()
        .capacity(Capacity::shannons(maximum).pack())
        .lock(payout_lock.clone())
        .build();
    skeleton.add_output(Cell::new(payout, Bytes::new()));

    let skeleton = pay_fee(&skeleton, fee_locks, fee_rate, ctx).await?;
    info!(
        "unlock {:?}: {} shannons incl. {} compensation, since {:#x}",
        withdraw.out_point,
        maximum,
        compensation,
        earliest.to_raw()
    );
    prepare_signing_entries(skeleton, ctx.scripts)
}
