//! Time-lock values attached to inputs. Epoch positions are the chain's own
//! packed `EpochNumberWithFraction`.

use crate::error::{DaoError, Result};
use std::cmp::Ordering;

pub use ckb_types::core::EpochNumberWithFraction;

const RELATIVE_FLAG: u64 = 1 << 63;
const METRIC_MASK: u64 = 0x6000_0000_0000_0000;
const METRIC_EPOCH: u64 = 0x2000_0000_0000_0000;
const METRIC_RESERVED: u64 = 0x6000_0000_0000_0000;
const RESERVED_FLAGS_MASK: u64 = 0x1f00_0000_0000_0000;
const VALUE_MASK: u64 = 0x00ff_ffff_ffff_ffff;

/// Decodes a packed epoch as is, a zero length included.
pub fn parse_epoch(raw: u64) -> EpochNumberWithFraction {
    EpochNumberWithFraction::from_full_value_unchecked(raw)
}

/// Zero length means the start of the epoch.
fn normalized(epoch: EpochNumberWithFraction) -> EpochNumberWithFraction {
    EpochNumberWithFraction::from_full_value(epoch.full_value())
}

fn is_well_formed(epoch: EpochNumberWithFraction) -> bool {
    (epoch.length() == 0 && epoch.index() == 0) || epoch.index() < epoch.length()
}

/// Orders two positions by epoch number, then by `index / length` brought to
/// a common denominator.
pub fn compare(a: EpochNumberWithFraction, b: EpochNumberWithFraction) -> Ordering {
    let a = normalized(a);
    let b = normalized(b);
    a.number().cmp(&b.number()).then_with(|| {
        let lhs = a.index() as u128 * b.length() as u128;
        let rhs = b.index() as u128 * a.length() as u128;
        lhs.cmp(&rhs)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Since {
    AbsoluteEpoch(EpochNumberWithFraction),
    RelativeEpoch(EpochNumberWithFraction),
    /// Block-number and timestamp forms, kept as the raw value.
    Raw(u64),
}

impl Since {
    pub fn from_raw(raw: u64) -> Result<Self> {
        if raw & RESERVED_FLAGS_MASK != 0 {
            return Err(DaoError::MalformedSince(raw));
        }
        match raw & METRIC_MASK {
            METRIC_EPOCH => {
                let epoch = parse_epoch(raw & VALUE_MASK);
                if !is_well_formed(epoch) {
                    return Err(DaoError::MalformedSince(raw));
                }
                if raw & RELATIVE_FLAG != 0 {
                    Ok(Since::RelativeEpoch(epoch))
                } else {
                    Ok(Since::AbsoluteEpoch(epoch))
                }
            }
            METRIC_RESERVED => Err(DaoError::MalformedSince(raw)),
            _ => Ok(Since::Raw(raw)),
        }
    }

    pub fn to_raw(&self) -> u64 {
        match self {
            Since::AbsoluteEpoch(epoch) => METRIC_EPOCH | epoch.full_value(),
            Since::RelativeEpoch(epoch) => RELATIVE_FLAG | METRIC_EPOCH | epoch.full_value(),
            Since::Raw(raw) => *raw,
        }
    }
}

pub fn parse_absolute_epoch_since(raw: u64) -> Result<EpochNumberWithFraction> {
    match Since::from_raw(raw)? {
        Since::AbsoluteEpoch(epoch) => Ok(epoch),
        _ => Err(DaoError::MalformedSince(raw)),
    }
}
