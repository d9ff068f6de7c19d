//! Witness layout for secp256k1-style locks: the first input of every lock
//! group carries a `WitnessArgs` whose `lock` field holds the signature.

use crate::error::{DaoError, Result};
use crate::scripts::ScriptConfig;
use crate::skeleton::TransactionSkeleton;
use ckb_types::{
    bytes::Bytes,
    core::TransactionView,
    packed::{Script, WitnessArgs},
    prelude::*,
};
use datatypes::types::Cell;

pub const SIGNATURE_SIZE: usize = 65;

/// Input indices grouped by lock script, groups in order of first appearance.
pub fn group_inputs_by_lock(inputs: &[Cell]) -> Vec<(Script, Vec<usize>)> {
    let mut groups: Vec<(Script, Vec<usize>)> = Vec::new();
    for (idx, cell) in inputs.iter().enumerate() {
        let lock = cell.lock();
        match groups.iter_mut().find(|(l, _)| *l == lock) {
            Some((_, indices)) => indices.push(idx),
            None => groups.push((lock, vec![idx])),
        }
    }
    groups
}

fn parse_witness_args(raw: &[u8]) -> Result<WitnessArgs> {
    if raw.is_empty() {
        return Ok(WitnessArgs::default());
    }
    WitnessArgs::from_slice(raw)
        .map_err(|e| DaoError::MalformedCellData(format!("witness is not WitnessArgs: {}", e)))
}

/// `raw` with its lock field replaced, other fields kept.
pub fn with_lock(raw: &[u8], lock: Bytes) -> Result<Bytes> {
    let args = parse_witness_args(raw)?;
    Ok(args.as_builder().lock(Some(lock).pack()).build().as_bytes())
}

/// Puts a zeroed signature in the first witness of every secp256k1 lock
/// group, so the transaction has its final size before the fee is computed.
pub fn fill_lock_placeholders(
    skeleton: &mut TransactionSkeleton,
    scripts: &ScriptConfig,
) -> Result<()> {
    for (lock, indices) in group_inputs_by_lock(skeleton.inputs()) {
        if !scripts.secp256k1_blake160.matches(&lock) {
            continue;
        }
        let first = indices[0];
        let placeholder = Bytes::from(vec![0u8; SIGNATURE_SIZE]);
        let witness = with_lock(&skeleton.witnesses()[first], placeholder)?;
        skeleton.set_witness(first, witness);
    }
    Ok(())
}

/// Index of the first input whose witness still holds the zeroed placeholder.
pub fn check_unsigned_input(tx: &TransactionView) -> Option<usize> {
    tx.witnesses()
        .into_iter()
        .take(tx.inputs().len())
        .position(|w| match WitnessArgs::from_slice(&w.raw_data()) {
            Ok(args) => args
                .lock()
                .to_opt()
                .map(|lock| {
                    let lock = lock.raw_data();
                    lock.len() == SIGNATURE_SIZE && lock.iter().all(|b| *b == 0)
                })
                .unwrap_or(false),
            Err(_) => false,
        })
}
