use crate::error::{DaoError, Result};
use ckb_types::{
    bytes::Bytes,
    core::{TransactionBuilder, TransactionView},
    packed::{CellDep, CellInput, OutPoint},
    prelude::*,
};
use datatypes::types::{with_capacity, Cell, H256};

/// An unsigned transaction under construction. Every input owns exactly one
/// witness slot and one since value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionSkeleton {
    cell_deps: Vec<CellDep>,
    header_deps: Vec<H256>,
    inputs: Vec<Cell>,
    input_sinces: Vec<u64>,
    outputs: Vec<Cell>,
    witnesses: Vec<Bytes>,
    compensation: u64,
}

impl TransactionSkeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cell_dep(&mut self, dep: CellDep) {
        if !self.cell_deps.contains(&dep) {
            self.cell_deps.push(dep);
        }
    }

    /// Index of `hash` in the header deps, appending it if new.
    pub fn add_header_dep(&mut self, hash: H256) -> usize {
        match self.header_deps.iter().position(|h| *h == hash) {
            Some(idx) => idx,
            None => {
                self.header_deps.push(hash);
                self.header_deps.len() - 1
            }
        }
    }

    pub fn add_input(&mut self, cell: Cell, since: u64) -> usize {
        self.add_input_with_witness(cell, since, Bytes::new())
    }

    pub fn add_input_with_witness(&mut self, cell: Cell, since: u64, witness: Bytes) -> usize {
        self.inputs.push(cell);
        self.input_sinces.push(since);
        self.witnesses.push(witness);
        self.inputs.len() - 1
    }

    pub fn add_output(&mut self, cell: Cell) -> usize {
        self.outputs.push(cell);
        self.outputs.len() - 1
    }

    pub fn set_output_capacity(&mut self, idx: usize, capacity: u64) {
        if let Some(cell) = self.outputs.get_mut(idx) {
            cell.output = with_capacity(&cell.output, capacity);
        }
    }

    pub fn set_witness(&mut self, idx: usize, witness: Bytes) {
        if let Some(slot) = self.witnesses.get_mut(idx) {
            *slot = witness;
        }
    }

    /// Value the DAO adds on top of the consumed capacity when unlocking.
    pub fn add_compensation(&mut self, amount: u64) {
        self.compensation += amount;
    }

    pub fn cell_deps(&self) -> &[CellDep] {
        &self.cell_deps
    }

    pub fn header_deps(&self) -> &[H256] {
        &self.header_deps
    }

    pub fn inputs(&self) -> &[Cell] {
        &self.inputs
    }

    pub fn input_sinces(&self) -> &[u64] {
        &self.input_sinces
    }

    pub fn outputs(&self) -> &[Cell] {
        &self.outputs
    }

    pub fn witnesses(&self) -> &[Bytes] {
        &self.witnesses
    }

    pub fn compensation(&self) -> u64 {
        self.compensation
    }

    pub fn contains_input(&self, out_point: &OutPoint) -> bool {
        self.inputs
            .iter()
            .any(|c| c.out_point.as_ref() == Some(out_point))
    }

    /// Consumed capacity plus DAO compensation.
    pub fn inputs_capacity(&self) -> Result<u64> {
        self.inputs
            .iter()
            .try_fold(self.compensation, |acc, c| acc.checked_add(c.capacity()))
            .ok_or(DaoError::Overflow)
    }

    pub fn outputs_capacity(&self) -> Result<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, c| acc.checked_add(c.capacity()))
            .ok_or(DaoError::Overflow)
    }

    pub fn to_transaction(&self) -> Result<TransactionView> {
        let inputs = self
            .inputs
            .iter()
            .zip(&self.input_sinces)
            .map(|(cell, since)| {
                let previous_output = cell.out_point.clone().ok_or_else(|| {
                    DaoError::MalformedCellData("input cell has no out point".to_string())
                })?;
                Ok(CellInput::new(previous_output, *since))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TransactionBuilder::default()
            .cell_deps(self.cell_deps.clone())
            .header_deps(self.header_deps.iter().map(|h| h.pack()))
            .inputs(inputs)
            .outputs(self.outputs.iter().map(|c| c.output.clone()))
            .outputs_data(self.outputs.iter().map(|c| c.data.pack()))
            .witnesses(self.witnesses.iter().map(|w| w.pack()))
            .build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{plain_cell, Fixture};

    #[test]
    fn inputs_and_witnesses_stay_aligned() {
        let fixture = Fixture::new();
        let mut skeleton = TransactionSkeleton::new();
        skeleton.add_input(fixture.deposit_cell(), 0);
        skeleton.add_input_with_witness(fixture.withdraw_cell(), 42, Bytes::from(vec![1, 2, 3]));
        assert_eq!(skeleton.inputs().len(), skeleton.witnesses().len());
        assert_eq!(skeleton.input_sinces(), &[0, 42]);

        let tx = skeleton.to_transaction().unwrap();
        assert_eq!(tx.inputs().len(), tx.witnesses().len());
        let since: u64 = tx.inputs().get(1).unwrap().since().unpack();
        assert_eq!(since, 42);
        assert_eq!(tx.witnesses().get(1).unwrap().raw_data(), Bytes::from(vec![1, 2, 3]));
    }

    #[test]
    fn deps_are_deduplicated() {
        let fixture = Fixture::new();
        let mut skeleton = TransactionSkeleton::new();
        skeleton.add_cell_dep(fixture.scripts.dao.cell_dep());
        skeleton.add_cell_dep(fixture.scripts.dao.cell_dep());
        assert_eq!(skeleton.cell_deps().len(), 1);

        assert_eq!(skeleton.add_header_dep(H256([1; 32])), 0);
        assert_eq!(skeleton.add_header_dep(H256([2; 32])), 1);
        assert_eq!(skeleton.add_header_dep(H256([1; 32])), 0);
    }

    #[test]
    fn capacity_counts_compensation() {
        let fixture = Fixture::new();
        let mut skeleton = TransactionSkeleton::new();
        skeleton.add_input(plain_cell(&fixture.user_lock, 1, 500), 0);
        skeleton.add_compensation(25);
        assert_eq!(skeleton.inputs_capacity().unwrap(), 525);
        skeleton.add_output(plain_cell(&fixture.user_lock, 2, u64::MAX));
        skeleton.add_output(plain_cell(&fixture.user_lock, 3, 1));
        assert!(matches!(skeleton.outputs_capacity(), Err(DaoError::Overflow)));
    }

    #[test]
    fn output_capacity_is_rewritten_in_place() {
        let fixture = Fixture::new();
        let mut skeleton = TransactionSkeleton::new();
        let idx = skeleton.add_output(plain_cell(&fixture.user_lock, 2, 100));
        skeleton.set_output_capacity(idx, 250);
        assert_eq!(skeleton.outputs()[idx].capacity(), 250);
        assert_eq!(skeleton.outputs()[idx].lock(), fixture.user_lock);
    }

    #[test]
    fn output_without_out_point_cannot_be_spent() {
        let fixture = Fixture::new();
        let mut skeleton = TransactionSkeleton::new();
        let mut cell = fixture.deposit_cell();
        cell.out_point = None;
        skeleton.add_input(cell, 0);
        assert!(skeleton.to_transaction().is_err());
    }
}
