use crate::config::Config;
use anyhow::Result;
use ckbrpc::CkbRpcClient;
use daotx::build_helper::{self, DaoCellInfo};
use daotx::dao::DaoStage;
use daotx::since::parse_absolute_epoch_since;
use daotx::{ChainContext, ScriptConfig, Secp256k1Signer};
use ckb_types::{packed::Script, prelude::*};
use datatypes::types::{parse_h256, DaoUnlockableAmount, FeeRate, H256};
use serde::Serialize;
use tracing::info;

/// One line of `list` output.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DaoCellRow {
    pub tx_hash: String,
    pub index: u32,
    pub capacity: u64,
    pub stage: &'static str,
    pub earliest_unlock_epoch: String,
    pub unlockable: bool,
}

impl TryFrom<&DaoCellInfo> for DaoCellRow {
    type Error = anyhow::Error;

    fn try_from(info: &DaoCellInfo) -> Result<Self> {
        let (tx_hash, index) = info
            .cell
            .out_point
            .as_ref()
            .map(|op| {
                let tx_hash: H256 = op.tx_hash().unpack();
                let index: u32 = op.index().unpack();
                (format!("{:#x}", tx_hash), index)
            })
            .unwrap_or_default();
        Ok(Self {
            tx_hash,
            index,
            capacity: info.cell.capacity(),
            stage: match info.stage {
                DaoStage::Deposit => "deposit",
                DaoStage::WithdrawalRequested => "withdrawing",
            },
            earliest_unlock_epoch: parse_absolute_epoch_since(info.earliest_since.to_raw())?
                .to_string(),
            unlockable: info.unlockable,
        })
    }
}

pub struct Wallet {
    client: CkbRpcClient,
    scripts: ScriptConfig,
    signer: Secp256k1Signer,
    fee_rate: FeeRate,
}

impl Wallet {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = match &cfg.ckb.indexer_url {
            Some(indexer_url) => CkbRpcClient::with_indexer(&cfg.ckb.rpc_url, indexer_url),
            None => CkbRpcClient::new(&cfg.ckb.rpc_url),
        };
        let scripts = cfg.ckb.script_config();
        let signer = Secp256k1Signer::from_hex(&cfg.wallet.private_key, &scripts)?;
        Ok(Self {
            client,
            scripts,
            signer,
            fee_rate: cfg.wallet.fee_rate,
        })
    }

    pub fn lock(&self) -> Script {
        self.signer.lock_script().clone()
    }

    fn context(&self) -> ChainContext<'_> {
        ChainContext::new(&self.client, &self.scripts)
    }

    pub async fn list(&self) -> Result<Vec<DaoCellRow>> {
        let infos = build_helper::list_dao_cells(&[self.lock()], &self.context()).await?;
        info!("found {} DAO cells", infos.len());
        infos.iter().map(DaoCellRow::try_from).collect()
    }

    pub async fn deposit(&self, amount: u64) -> Result<H256> {
        let lock = self.lock();
        let hash = build_helper::deposit(
            amount,
            &lock,
            &[lock.clone()],
            self.fee_rate,
            &self.context(),
            &self.signer,
            &self.client,
        )
        .await?;
        Ok(hash)
    }

    pub async fn withdraw(&self, tx_hash: &str, amount: u64) -> Result<H256> {
        let amount = DaoUnlockableAmount {
            amount,
            tx_hash: parse_h256(tx_hash)?,
        };
        let hash = build_helper::withdraw_or_unlock(
            &amount,
            &[self.lock()],
            self.fee_rate,
            &self.context(),
            &self.signer,
            &self.client,
        )
        .await?;
        Ok(hash)
    }
}
