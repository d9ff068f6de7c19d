use crate::scripts::ScriptConfig;
use datatypes::traits::{HeaderSource, LiveCellSource, TransactionLookup};

/// Read-only view of the chain a single build works against.
#[derive(Clone, Copy)]
pub struct ChainContext<'a> {
    pub cells: &'a dyn LiveCellSource,
    pub headers: &'a dyn HeaderSource,
    pub txs: &'a dyn TransactionLookup,
    pub scripts: &'a ScriptConfig,
}

impl<'a> ChainContext<'a> {
    /// All three sources served by one client, the usual case for a node RPC.
    pub fn new<C>(client: &'a C, scripts: &'a ScriptConfig) -> Self
    where
        C: LiveCellSource + HeaderSource + TransactionLookup,
    {
        Self {
            cells: client,
            headers: client,
            txs: client,
            scripts,
        }
    }
}
