use crate::error::{DaoError, Result};
use crate::witness::check_unsigned_input;
use ckb_types::{core::TransactionView, prelude::*};
use datatypes::traits::{Broadcaster, NodeRejection};
use datatypes::types::H256;
use tracing::{error, info, warn};

/// Hands a sealed transaction to the network. A node rejection is reported
/// with the node's own message, a transport failure as `Rpc`. Neither is
/// retried.
pub async fn submit(tx: &TransactionView, broadcaster: &dyn Broadcaster) -> Result<H256> {
    if let Some(idx) = check_unsigned_input(tx) {
        warn!("input {} still carries a signature placeholder", idx);
    }
    let tx_hash: H256 = tx.hash().unpack();
    match broadcaster.send_transaction(tx).await {
        Ok(hash) => {
            info!("submitted tx {:#x}", hash);
            Ok(hash)
        }
        Err(e) => match e.downcast::<NodeRejection>() {
            Ok(rejection) => {
                error!("tx {:#x} rejected ({}): {}", tx_hash, rejection.code, rejection.message);
                Err(DaoError::SubmissionRejected {
                    reason: rejection.message,
                })
            }
            Err(e) => {
                error!("tx {:#x} not delivered: {}", tx_hash, e);
                Err(DaoError::Rpc(e))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::Fixture;

    #[tokio::test]
    async fn returns_node_hash() {
        let fixture = Fixture::new();
        let tx = fixture.chain.txs[&fixture.withdraw_tx].transaction.clone();
        let hash = submit(&tx, &fixture.chain).await.unwrap();
        assert_eq!(hash, fixture.withdraw_tx);
        assert_eq!(fixture.chain.sent_count(), 1);
    }

    #[tokio::test]
    async fn rejection_reason_is_verbatim() {
        let mut fixture = Fixture::new();
        let message = "PoolRejectedDuplicatedTransaction: Transaction(Byte32(0x1234)) already exists";
        fixture.chain.reject_with = Some(message.to_string());
        let tx = fixture.chain.txs[&fixture.withdraw_tx].transaction.clone();
        let err = submit(&tx, &fixture.chain).await.unwrap_err();
        match err {
            DaoError::SubmissionRejected { reason } => assert_eq!(reason, message),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(fixture.chain.sent_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_not_a_rejection() {
        let mut fixture = Fixture::new();
        fixture.chain.offline = true;
        let tx = fixture.chain.txs[&fixture.withdraw_tx].transaction.clone();
        let err = submit(&tx, &fixture.chain).await.unwrap_err();
        match err {
            DaoError::Rpc(e) => assert!(e.to_string().contains("connection refused")),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(fixture.chain.sent_count(), 0);
    }
}
