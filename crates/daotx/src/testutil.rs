//! In-memory chain used by the unit tests.

use crate::dao::{withdrawal_data, DEPOSIT_DATA};
use crate::scripts::ScriptConfig;
use crate::since::EpochNumberWithFraction;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ckb_dao_utils::pack_dao_data;
use ckb_types::{
    bytes::Bytes,
    core::{Capacity, HeaderBuilder, TransactionBuilder, TransactionView},
    packed::{Byte32, CellInput, CellOutput, OutPoint, Script},
    prelude::*,
};
use datatypes::traits::{
    Broadcaster, HeaderSource, LiveCellSource, NodeRejection, Signer, TransactionLookup,
};
use datatypes::types::*;
use std::collections::HashMap;
use std::sync::Mutex;

pub const DEPOSIT_AR: u64 = 10_000_000_000_000_000;
pub const WITHDRAW_AR: u64 = 10_001_000_000_000_000;
pub const DEPOSIT_CAPACITY: u64 = 20_000_000_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn epoch(number: u64, index: u64, length: u64) -> EpochNumberWithFraction {
    EpochNumberWithFraction::new(number, index, length)
}

pub fn dao_field(ar: u64) -> Byte32 {
    pack_dao_data(ar, Capacity::zero(), Capacity::zero(), Capacity::zero())
}

pub fn dao_header(number: u64, epoch: EpochNumberWithFraction, ar: u64) -> Header {
    HeaderBuilder::default()
        .number(number.pack())
        .epoch(epoch.full_value().pack())
        .timestamp((1_600_000_000_000 + number * 8_000).pack())
        .dao(dao_field(ar))
        .build()
}

pub fn epoch_header(number: u64, epoch: EpochNumberWithFraction) -> Header {
    dao_header(number, epoch, DEPOSIT_AR)
}

pub fn hash_of(header: &Header) -> H256 {
    header.hash().unpack()
}

pub struct MockChain {
    pub cells: Vec<Cell>,
    pub headers: Vec<Header>,
    pub txs: HashMap<H256, TransactionWithStatus>,
    pub tip: Header,
    pub sent: Mutex<Vec<TransactionView>>,
    /// Node answer to every submission, as an error message.
    pub reject_with: Option<String>,
    /// Submissions fail before reaching the node.
    pub offline: bool,
}

impl MockChain {
    pub fn new(tip: Header) -> Self {
        Self {
            cells: Vec::new(),
            headers: Vec::new(),
            txs: HashMap::new(),
            tip,
            sent: Mutex::new(Vec::new()),
            reject_with: None,
            offline: false,
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn last_sent(&self) -> TransactionView {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }

    /// Records `tx` as committed in `block`, returning its hash.
    pub fn commit(&mut self, tx: TransactionView, block: &Header) -> H256 {
        let hash: H256 = tx.hash().unpack();
        self.txs.insert(
            hash.clone(),
            TransactionWithStatus {
                transaction: tx,
                block_hash: Some(hash_of(block)),
            },
        );
        hash
    }
}

#[async_trait]
impl LiveCellSource for MockChain {
    async fn list_cells(&self, filter: &CellFilter) -> Result<Vec<Cell>> {
        Ok(self
            .cells
            .iter()
            .filter(|c| c.lock() == filter.lock)
            .filter(|c| match &filter.type_script {
                Some(script) => c.type_script().as_ref() == Some(script),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HeaderSource for MockChain {
    async fn get_header(&self, hash: &H256) -> Result<Option<Header>> {
        let hash = hash.pack();
        Ok(self.headers.iter().find(|h| h.hash() == hash).cloned())
    }

    async fn get_header_by_number(&self, number: u64) -> Result<Option<Header>> {
        Ok(self.headers.iter().find(|h| h.number() == number).cloned())
    }

    async fn get_tip_header(&self) -> Result<Header> {
        Ok(self.tip.clone())
    }
}

#[async_trait]
impl TransactionLookup for MockChain {
    async fn get_transaction(&self, hash: &H256) -> Result<Option<TransactionWithStatus>> {
        Ok(self.txs.get(hash).cloned())
    }
}

#[async_trait]
impl Broadcaster for MockChain {
    async fn send_transaction(&self, tx: &TransactionView) -> Result<H256> {
        if self.offline {
            return Err(anyhow!("error sending request: connection refused"));
        }
        if let Some(message) = &self.reject_with {
            return Err(NodeRejection {
                code: -1107,
                message: message.clone(),
            }
            .into());
        }
        self.sent
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(tx.clone());
        Ok(tx.hash().unpack())
    }
}

/// Returns the same signatures whatever it is asked to sign.
pub struct FixedSigner(pub Vec<(Script, Bytes)>);

#[async_trait]
impl Signer for FixedSigner {
    async fn sign(
        &self,
        _tx: &TransactionView,
        _entries: &[SigningEntry],
    ) -> Result<Vec<(Script, Bytes)>> {
        Ok(self.0.clone())
    }
}

pub struct RejectingSigner;

#[async_trait]
impl Signer for RejectingSigner {
    async fn sign(
        &self,
        _tx: &TransactionView,
        _entries: &[SigningEntry],
    ) -> Result<Vec<(Script, Bytes)>> {
        Err(anyhow!("user declined"))
    }
}

/// A deposit committed in block 500 at epoch 100, its withdrawal request in
/// block 600 at epoch 110 1/2, and two plain 1000 CKB cells to pay fees with.
pub struct Fixture {
    pub scripts: ScriptConfig,
    pub user_lock: Script,
    pub dao_output: CellOutput,
    pub deposit_header: Header,
    pub withdraw_header: Header,
    pub deposit_tx: H256,
    pub withdraw_tx: H256,
    pub chain: MockChain,
}

impl Fixture {
    pub fn new() -> Self {
        let scripts = ScriptConfig::testnet();
        let user_lock = scripts.secp256k1_lock(&[7; 20]);
        let dao_output = CellOutput::new_builder()
            .capacity(Capacity::shannons(DEPOSIT_CAPACITY).pack())
            .lock(user_lock.clone())
            .type_(Some(scripts.dao_type_script()).pack())
            .build();

        let deposit_header = dao_header(500, epoch(100, 0, 1000), DEPOSIT_AR);
        let withdraw_header = dao_header(600, epoch(110, 500, 1000), WITHDRAW_AR);

        let deposit = TransactionBuilder::default()
            .input(CellInput::new(out_point(&H256([0xd0; 32]), 0), 0))
            .output(dao_output.clone())
            .output_data(Bytes::from_static(&DEPOSIT_DATA).pack())
            .build();
        let withdraw = TransactionBuilder::default()
            .input(CellInput::new(OutPoint::new(deposit.hash(), 0), 0))
            .output(dao_output.clone())
            .output_data(withdrawal_data(500).pack())
            .header_dep(deposit_header.hash())
            .build();

        let mut chain = MockChain::new(epoch_header(2000, epoch(300, 0, 1000)));
        let deposit_tx = chain.commit(deposit, &deposit_header);
        let withdraw_tx = chain.commit(withdraw, &withdraw_header);
        chain.headers = vec![deposit_header.clone(), withdraw_header.clone()];
        chain.cells = vec![
            Cell {
                output: dao_output.clone(),
                data: Bytes::from_static(&DEPOSIT_DATA),
                out_point: Some(out_point(&deposit_tx, 0)),
                block_hash: None,
                block_number: Some(500),
            },
            Cell {
                output: dao_output.clone(),
                data: withdrawal_data(500),
                out_point: Some(out_point(&withdraw_tx, 0)),
                block_hash: None,
                block_number: Some(600),
            },
            plain_cell(&user_lock, 0xf1, 1000 * ONE_CKB),
            plain_cell(&user_lock, 0xf2, 1000 * ONE_CKB),
        ];

        Self {
            scripts,
            user_lock,
            dao_output,
            deposit_header,
            withdraw_header,
            deposit_tx,
            withdraw_tx,
            chain,
        }
    }

    pub fn deposit_cell(&self) -> Cell {
        self.chain.cells[0].clone()
    }

    pub fn withdraw_cell(&self) -> Cell {
        self.chain.cells[1].clone()
    }

    pub fn fee_locks(&self) -> Vec<Script> {
        vec![self.user_lock.clone()]
    }
}

pub fn out_point(tx_hash: &H256, index: u32) -> OutPoint {
    OutPoint::new(tx_hash.pack(), index)
}

pub fn plain_cell(lock: &Script, tag: u8, capacity: u64) -> Cell {
    let output = CellOutput::new_builder()
        .capacity(Capacity::shannons(capacity).pack())
        .lock(lock.clone())
        .build();
    Cell {
        output,
        data: Bytes::new(),
        out_point: Some(out_point(&H256([tag; 32]), 0)),
        block_hash: None,
        block_number: Some(400),
    }
}
