use super::{dao_skeleton, ensure_dao_cell};
use crate::context::ChainContext;
use crate::dao::{self, DaoStage};
use crate::error::{DaoError, Result};
use crate::fee_rate::pay_fee;
use crate::maturity;
use crate::signer::{prepare_signing_entries, UnsignedTx};
use ckb_types::{packed::Script, prelude::*};
use datatypes::types::{Cell, FeeRate};
use tracing::info;

/// Phase one: turns a deposit cell into a withdrawal-request cell of the same
/// capacity whose data records the deposit block number.
pub async fn build_withdrawal_request(
    deposit: &Cell,
    fee_locks: &[Script],
    fee_rate: FeeRate,
    ctx: &ChainContext<'_>,
) -> Result<UnsignedTx> {
    ensure_dao_cell(deposit, ctx)?;
    if dao::stage(deposit) != DaoStage::Deposit {
        return Err(DaoError::UnexpectedStage("withdrawal already requested"));
    }
    let header = maturity::cell_header(deposit, ctx.headers).await?;

    let mut skeleton = dao_skeleton(&deposit.lock(), ctx);
    skeleton.add_header_dep(header.hash().unpack());
    skeleton.add_input(deposit.clone(), 0);
    skeleton.add_output(Cell::new(
        deposit.output.clone(),
        dao::withdrawal_data(header.number()),
    ));

    let skeleton = pay_fee(&skeleton, fee_locks, fee_rate, ctx).await?;
    info!(
        "withdrawal request for {:?} deposited at block {}",
        deposit.out_point,
        header.number()
    );
    prepare_signing_entries(skeleton, ctx.scripts)
}
