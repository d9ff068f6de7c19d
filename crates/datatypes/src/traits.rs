//! Contracts the engine needs from the outside world. Transport failures are
//! reported through `anyhow`; the engine decides what they mean.

use crate::types::*;
use anyhow::Result;
use async_trait::async_trait;
use ckb_types::{bytes::Bytes, core::TransactionView, packed::Script};
use thiserror::Error;

/// An error answer from the node. `message` is the node's text as sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NodeRejection {
    pub code: i64,
    pub message: String,
}

#[async_trait]
pub trait LiveCellSource: Send + Sync {
    async fn list_cells(&self, filter: &CellFilter) -> Result<Vec<Cell>>;
}

#[async_trait]
pub trait HeaderSource: Send + Sync {
    async fn get_header(&self, hash: &H256) -> Result<Option<Header>>;

    async fn get_header_by_number(&self, number: u64) -> Result<Option<Header>>;

    async fn get_tip_header(&self) -> Result<Header>;
}

#[async_trait]
pub trait TransactionLookup: Send + Sync {
    /// `None` when the node does not know the transaction.
    async fn get_transaction(&self, hash: &H256) -> Result<Option<TransactionWithStatus>>;
}

#[async_trait]
pub trait Signer: Send + Sync {
    /// One `(lock, signature)` pair per distinct lock among the inputs, in
    /// any order.
    async fn sign(
        &self,
        tx: &TransactionView,
        entries: &[SigningEntry],
    ) -> Result<Vec<(Script, Bytes)>>;
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Fails with a [`NodeRejection`] when the node refuses the transaction.
    async fn send_transaction(&self, tx: &TransactionView) -> Result<H256>;
}
