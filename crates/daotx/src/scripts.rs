//! On-chain locations of the system scripts the engine references.

use ckb_jsonrpc_types::{DepType, ScriptHashType};
use ckb_types::{
    bytes::Bytes,
    core, h256,
    packed::{CellDep, OutPoint, Script},
    prelude::*,
    H256,
};
use serde::Deserialize;

pub const SECP256K1_BLAKE160_CODE_HASH: H256 =
    h256!("0x9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8");
pub const DAO_CODE_HASH: H256 =
    h256!("0x82d76d1b75fe2fd9a27dfbaa65a039221a380d76c926f378d3f81cf3e7e13f2e");

pub const MAINNET_SECP256K1_DEP_GROUP_TX: H256 =
    h256!("0x71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c");
pub const MAINNET_DAO_DEP_TX: H256 =
    h256!("0xe2fb199810d49a4d8beec56718ba2593b665db9d52299a0f9e6e75416d73ff5c");
pub const TESTNET_SECP256K1_DEP_GROUP_TX: H256 =
    h256!("0xf8de3bb47d055cdf460d93a2a6e1b05f7432f9777c8c474abf4eec1d4aee5d37");
pub const TESTNET_DAO_DEP_TX: H256 =
    h256!("0x8f8c79eb6671709633fe6a46de93c0fedc9c1b8a6527a18d3983879542635c9f");

/// Where a script's code lives and how scripts refer to it. Deserializes from
/// the node's JSON spelling, e.g. `hash_type = "type"`, `dep_type = "dep_group"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptInfo {
    pub code_hash: H256,
    pub hash_type: ScriptHashType,
    pub tx_hash: H256,
    pub index: u32,
    pub dep_type: DepType,
}

impl ScriptInfo {
    fn core_hash_type(&self) -> core::ScriptHashType {
        self.hash_type.clone().into()
    }

    pub fn script(&self, args: &[u8]) -> Script {
        Script::new_builder()
            .code_hash(self.code_hash.pack())
            .hash_type(self.core_hash_type().into())
            .args(Bytes::copy_from_slice(args).pack())
            .build()
    }

    pub fn cell_dep(&self) -> CellDep {
        let dep_type: core::DepType = self.dep_type.clone().into();
        CellDep::new_builder()
            .out_point(OutPoint::new(self.tx_hash.pack(), self.index))
            .dep_type(dep_type.into())
            .build()
    }

    /// True when `script` runs this script's code.
    pub fn matches(&self, script: &Script) -> bool {
        let hash_type: ckb_types::packed::Byte = self.core_hash_type().into();
        script.code_hash() == self.code_hash.pack() && script.hash_type() == hash_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptConfig {
    pub dao: ScriptInfo,
    pub secp256k1_blake160: ScriptInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl Network {
    pub fn scripts(self) -> ScriptConfig {
        match self {
            Network::Mainnet => ScriptConfig::mainnet(),
            Network::Testnet => ScriptConfig::testnet(),
        }
    }
}

impl ScriptConfig {
    pub fn mainnet() -> Self {
        Self::with_deps(MAINNET_DAO_DEP_TX, MAINNET_SECP256K1_DEP_GROUP_TX)
    }

    pub fn testnet() -> Self {
        Self::with_deps(TESTNET_DAO_DEP_TX, TESTNET_SECP256K1_DEP_GROUP_TX)
    }

    fn with_deps(dao_tx: H256, secp_tx: H256) -> Self {
        Self {
            dao: ScriptInfo {
                code_hash: DAO_CODE_HASH,
                hash_type: ScriptHashType::Type,
                tx_hash: dao_tx,
                index: 2,
                dep_type: DepType::Code,
            },
            secp256k1_blake160: ScriptInfo {
                code_hash: SECP256K1_BLAKE160_CODE_HASH,
                hash_type: ScriptHashType::Type,
                tx_hash: secp_tx,
                index: 0,
                dep_type: DepType::DepGroup,
            },
        }
    }

    /// The DAO type script carries no args.
    pub fn dao_type_script(&self) -> Script {
        self.dao.script(&[])
    }

    pub fn secp256k1_lock(&self, blake160: &[u8]) -> Script {
        self.secp256k1_blake160.script(blake160)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatypes::types::parse_h256;

    #[test]
    fn known_code_hashes() {
        let cfg = Network::Mainnet.scripts();
        assert_eq!(
            cfg.dao.code_hash,
            parse_h256("0x82d76d1b75fe2fd9a27dfbaa65a039221a380d76c926f378d3f81cf3e7e13f2e")
                .unwrap()
        );
        assert_eq!(
            cfg.secp256k1_blake160.tx_hash,
            parse_h256("0x71a7ba8fc96349fea0ed3a5c47992e3b4084b031a42264a018e0072e8172e46c")
                .unwrap()
        );
        assert!(cfg.dao.matches(&cfg.dao_type_script()));
        assert!(!cfg.dao.matches(&cfg.secp256k1_lock(&[0; 20])));
        assert!(cfg.secp256k1_blake160.matches(&cfg.secp256k1_lock(&[0; 20])));
    }

    #[test]
    fn hash_type_is_part_of_the_match() {
        let cfg = ScriptConfig::testnet();
        let data_lock = cfg
            .secp256k1_lock(&[0; 20])
            .as_builder()
            .hash_type(core::ScriptHashType::Data.into())
            .build();
        assert!(!cfg.secp256k1_blake160.matches(&data_lock));
    }

    #[test]
    fn networks_share_code_but_not_deps() {
        let main = ScriptConfig::mainnet();
        let test = ScriptConfig::testnet();
        assert_eq!(main.dao_type_script(), test.dao_type_script());
        assert_ne!(main.dao.cell_dep(), test.dao.cell_dep());
        let dep_group: ckb_types::packed::Byte = core::DepType::DepGroup.into();
        assert_eq!(test.secp256k1_blake160.cell_dep().dep_type(), dep_group);
    }
}
