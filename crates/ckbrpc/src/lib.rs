pub mod indexer;
pub mod node;

use anyhow::{anyhow, Result};
use ckb_jsonrpc_types as json_types;
use datatypes::traits::NodeRejection;
use datatypes::types::{Cell, CellFilter, Header, TransactionWithStatus, H256};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8114";

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

impl<T> RpcResponse<T> {
    /// An error object becomes a [`NodeRejection`] carrying the node's text.
    fn into_result(self) -> Result<Option<T>> {
        match self.error {
            Some(err) => Err(NodeRejection {
                code: err.code,
                message: err.message,
            }
            .into()),
            None => Ok(self.result),
        }
    }
}

/// JSON-RPC client for a CKB node. The indexer may live on a separate
/// endpoint; by default it is the node itself.
#[derive(Debug)]
pub struct CkbRpcClient {
    url: String,
    indexer_url: String,
    client: reqwest::Client,
    id: AtomicU64,
}

impl CkbRpcClient {
    pub fn new(url: &str) -> Self {
        Self::with_indexer(url, url)
    }

    pub fn with_indexer(url: &str, indexer_url: &str) -> Self {
        Self {
            url: url.to_string(),
            indexer_url: indexer_url.to_string(),
            client: reqwest::Client::new(),
            id: AtomicU64::new(0),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        url: &str,
        method: &str,
        params: Value,
    ) -> Result<Option<T>> {
        let id = self.id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "id": id,
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });
        debug!("rpc {} -> {} {}", id, url, method);
        let response = self.client.post(url).json(&body).send().await?;
        let resp: RpcResponse<T> = response.json().await?;
        if let Some(err) = &resp.error {
            debug!("rpc {} {} answered code {}", id, method, err.code);
        }
        resp.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_is_decoded() {
        let raw = r#"{"jsonrpc":"2.0","error":{"code":-301,"message":"TransactionFailedToResolve: Resolve failed Dead(OutPoint(0x1234))"},"id":2}"#;
        let resp: RpcResponse<H256> = serde_json::from_str(raw).unwrap();
        assert!(resp.result.is_none());
        let err = resp.error.as_ref().unwrap();
        assert_eq!(err.code, -301);
        assert!(err.message.starts_with("TransactionFailedToResolve"));
    }

    #[test]
    fn node_error_text_is_kept_verbatim() {
        let message = "PoolRejectedDuplicatedTransaction: Transaction(Byte32(0x8f2a)) already exists in transaction_pool";
        let raw = format!(
            r#"{{"jsonrpc":"2.0","error":{{"code":-1107,"message":"{}"}},"id":3}}"#,
            message
        );
        let resp: RpcResponse<H256> = serde_json::from_str(&raw).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.to_string(), message);
        let rejection = err.downcast_ref::<NodeRejection>().unwrap();
        assert_eq!(rejection.code, -1107);
    }

    #[test]
    fn null_result_is_none() {
        let raw = r#"{"jsonrpc":"2.0","result":null,"id":7}"#;
        let resp: RpcResponse<json_types::HeaderView> = serde_json::from_str(raw).unwrap();
        assert!(resp.into_result().unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unreachable_node_is_a_transport_error() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let client = CkbRpcClient::new("http://127.0.0.1:1");
        let err = client.tip_header().await.unwrap_err();
        assert!(err.downcast_ref::<NodeRejection>().is_none());
    }
}
