pub mod build_helper;
pub mod builder;
pub mod context;
pub mod dao;
pub mod error;
pub mod fee_rate;
pub mod maturity;
pub mod pairing;
pub mod scripts;
pub mod sender;
pub mod signer;
pub mod since;
pub mod skeleton;
pub mod witness;

#[cfg(test)]
mod testutil;

pub use context::ChainContext;
pub use error::{DaoError, Result};
pub use scripts::{Network, ScriptConfig};
pub use signer::{Secp256k1Signer, UnsignedTx};
pub use skeleton::TransactionSkeleton;
