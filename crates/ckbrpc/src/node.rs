use super::*;
use async_trait::async_trait;
use ckb_types::{core::TransactionView, packed, prelude::*};
use datatypes::traits::{Broadcaster, HeaderSource, TransactionLookup};

#[derive(Debug, Deserialize)]
struct TxStatus {
    status: String,
    #[serde(default)]
    block_hash: Option<H256>,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    transaction: Option<json_types::TransactionView>,
    tx_status: TxStatus,
}

impl TransactionResponse {
    fn into_status(self) -> Option<TransactionWithStatus> {
        let view = self.transaction?;
        debug!("tx {:#x} status {}", view.hash, self.tx_status.status);
        let tx: packed::Transaction = view.inner.into();
        Some(TransactionWithStatus {
            transaction: tx.into_view(),
            block_hash: self.tx_status.block_hash,
        })
    }
}

impl CkbRpcClient {
    pub async fn tip_header(&self) -> Result<Header> {
        let header: json_types::HeaderView = self
            .call(&self.url, "get_tip_header", json!([]))
            .await?
            .ok_or_else(|| anyhow!("node returned no tip header"))?;
        Ok(header.into())
    }

    pub async fn header(&self, hash: &H256) -> Result<Option<Header>> {
        let header: Option<json_types::HeaderView> =
            self.call(&self.url, "get_header", json!([hash])).await?;
        Ok(header.map(Into::into))
    }

    pub async fn header_by_number(&self, number: u64) -> Result<Option<Header>> {
        let header: Option<json_types::HeaderView> = self
            .call(
                &self.url,
                "get_header_by_number",
                json!([json_types::BlockNumber::from(number)]),
            )
            .await?;
        Ok(header.map(Into::into))
    }

    pub async fn transaction(&self, hash: &H256) -> Result<Option<TransactionWithStatus>> {
        let resp: Option<TransactionResponse> =
            self.call(&self.url, "get_transaction", json!([hash])).await?;
        Ok(resp.and_then(TransactionResponse::into_status))
    }

    pub async fn send(&self, tx: &TransactionView) -> Result<H256> {
        let tx: json_types::Transaction = tx.data().into();
        self.call(&self.url, "send_transaction", json!([tx, "passthrough"]))
            .await?
            .ok_or_else(|| anyhow!("node returned no transaction hash"))
    }
}

#[async_trait]
impl HeaderSource for CkbRpcClient {
    async fn get_header(&self, hash: &H256) -> Result<Option<Header>> {
        self.header(hash).await
    }

    async fn get_header_by_number(&self, number: u64) -> Result<Option<Header>> {
        self.header_by_number(number).await
    }

    async fn get_tip_header(&self) -> Result<Header> {
        self.tip_header().await
    }
}

#[async_trait]
impl TransactionLookup for CkbRpcClient {
    async fn get_transaction(&self, hash: &H256) -> Result<Option<TransactionWithStatus>> {
        self.transaction(hash).await
    }
}

#[async_trait]
impl Broadcaster for CkbRpcClient {
    async fn send_transaction(&self, tx: &TransactionView) -> Result<H256> {
        self.send(tx).await
    }
}
