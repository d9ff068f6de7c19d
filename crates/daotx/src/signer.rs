use crate::error::{DaoError, Result};
use crate::scripts::ScriptConfig;
use crate::skeleton::TransactionSkeleton;
use crate::witness;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use ckb_hash::{blake2b_256, new_blake2b, Blake2b};
use ckb_types::{bytes::Bytes, core::TransactionView, packed::Script, prelude::*};
use datatypes::traits::Signer;
use datatypes::types::{SigningEntry, H256};
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use tracing::{debug, info};

/// A fee-paid skeleton and the messages its lock groups must sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTx {
    pub skeleton: TransactionSkeleton,
    pub entries: Vec<SigningEntry>,
}

impl UnsignedTx {
    pub fn transaction(&self) -> Result<TransactionView> {
        self.skeleton.to_transaction()
    }
}

fn hash_witness(hasher: &mut Blake2b, witness: &[u8]) {
    hasher.update(&(witness.len() as u64).to_le_bytes());
    hasher.update(witness);
}

/// Sighash-all message of one lock group.
fn signing_message(tx: &TransactionView, group: &[usize]) -> H256 {
    let witnesses = tx.witnesses();
    let mut hasher = new_blake2b();
    hasher.update(tx.hash().as_slice());
    for idx in group {
        let witness = witnesses.get(*idx).map(|w| w.raw_data()).unwrap_or_default();
        hash_witness(&mut hasher, &witness);
    }
    for extra in witnesses.into_iter().skip(tx.inputs().len()) {
        hash_witness(&mut hasher, &extra.raw_data());
    }
    let mut message = [0u8; 32];
    hasher.finalize(&mut message);
    H256(message)
}

/// Groups the inputs by lock and computes one message per group.
pub fn prepare_signing_entries(
    mut skeleton: TransactionSkeleton,
    scripts: &ScriptConfig,
) -> Result<UnsignedTx> {
    witness::fill_lock_placeholders(&mut skeleton, scripts)?;
    let tx = skeleton.to_transaction()?;
    let entries = witness::group_inputs_by_lock(skeleton.inputs())
        .into_iter()
        .map(|(lock, input_indices)| {
            let message = signing_message(&tx, &input_indices);
            SigningEntry {
                lock,
                input_indices,
                message,
            }
        })
        .collect::<Vec<_>>();
    let tx_hash: H256 = tx.hash().unpack();
    debug!("tx {:#x} needs {} signatures", tx_hash, entries.len());
    Ok(UnsignedTx { skeleton, entries })
}

/// Writes one signature per lock group into the group's first witness.
pub fn seal_signatures(
    unsigned: UnsignedTx,
    signatures: Vec<(Script, Bytes)>,
) -> Result<TransactionView> {
    let mismatch = DaoError::SignatureCountMismatch {
        expected: unsigned.entries.len(),
        actual: signatures.len(),
    };
    if signatures.len() != unsigned.entries.len() {
        return Err(mismatch);
    }
    let mut skeleton = unsigned.skeleton;
    for entry in &unsigned.entries {
        let Some((_, signature)) = signatures.iter().find(|(lock, _)| lock == &entry.lock) else {
            return Err(mismatch);
        };
        let first = entry.input_indices[0];
        let sealed = witness::with_lock(&skeleton.witnesses()[first], signature.clone())?;
        skeleton.set_witness(first, sealed);
    }
    skeleton.to_transaction()
}

pub async fn seal(unsigned: UnsignedTx, signer: &dyn Signer) -> Result<TransactionView> {
    let tx = unsigned.transaction()?;
    let signatures = signer
        .sign(&tx, &unsigned.entries)
        .await
        .map_err(|e| DaoError::SignerRejected(e.to_string()))?;
    let sealed = seal_signatures(unsigned, signatures)?;
    let tx_hash: H256 = sealed.hash().unpack();
    info!("sealed tx {:#x}", tx_hash);
    Ok(sealed)
}

/// Signs with a single local secp256k1 key, for the one secp256k1-blake160
/// lock whose args are the key's blake160.
pub struct Secp256k1Signer {
    secp: Secp256k1<All>,
    key: SecretKey,
    lock: Script,
}

impl Secp256k1Signer {
    pub fn new(key: SecretKey, scripts: &ScriptConfig) -> Self {
        let secp = Secp256k1::new();
        let pubkey = PublicKey::from_secret_key(&secp, &key);
        let lock = scripts.secp256k1_lock(&blake2b_256(pubkey.serialize())[..20]);
        Self { secp, key, lock }
    }

    pub fn from_hex(private_key: &str, scripts: &ScriptConfig) -> anyhow::Result<Self> {
        let raw = hex::decode(private_key.trim_start_matches("0x"))?;
        let key = SecretKey::from_slice(&raw).map_err(|e| anyhow!("bad private key: {}", e))?;
        Ok(Self::new(key, scripts))
    }

    pub fn lock_args(&self) -> Bytes {
        self.lock.args().raw_data()
    }

    pub fn lock_script(&self) -> &Script {
        &self.lock
    }
}

#[async_trait]
impl Signer for Secp256k1Signer {
    async fn sign(
        &self,
        _tx: &TransactionView,
        entries: &[SigningEntry],
    ) -> anyhow::Result<Vec<(Script, Bytes)>> {
        let mut signatures = Vec::new();
        for entry in entries.iter().filter(|e| e.lock == self.lock) {
            let message = Message::from_digest(entry.message.0);
            let (recovery_id, compact) = self
                .secp
                .sign_ecdsa_recoverable(&message, &self.key)
                .serialize_compact();
            let mut signature = compact.to_vec();
            signature.push(recovery_id.to_i32() as u8);
            signatures.push((entry.lock.clone(), Bytes::from(signature)));
        }
        if signatures.is_empty() {
            bail!("no input is guarded by this key");
        }
        Ok(signatures)
    }
}
