//! Opaque durable counter snapshot.
//!
//! Layout:
//!
//! ```text
//! +--------+---------+------------------------------+
//! | "HSTS" | version | bincode(SnapshotV1)          |
//! | 4 B    | u16 LE  | ...                          |
//! +--------+---------+------------------------------+
//! ```
//!
//! Only the three persisted levels are stored; locks and reports are rebuilt
//! on load. Hour keys are stored in their `YYMMDDHH` text form.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use hstats_types::HourKey;

use crate::SnapshotError;

pub const MAGIC: [u8; 4] = *b"HSTS";
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// bucket → sub-key → hour → count
#[derive(Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SnapshotV1 {
    pub(crate) buckets: BTreeMap<String, BTreeMap<String, BTreeMap<HourKey, u64>>>,
}

pub(crate) fn encode(snapshot: &SnapshotV1) -> Result<Vec<u8>, SnapshotError> {
    let mut out = Vec::with_capacity(HEADER_LEN + 64);
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bincode::serialize_into(&mut out, snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))?;
    tracing::debug!(
        buckets = snapshot.buckets.len(),
        bytes = out.len(),
        "encoded counter snapshot"
    );
    Ok(out)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<SnapshotV1, SnapshotError> {
    if bytes.len() < HEADER_LEN {
        return Err(SnapshotError::Truncated(bytes.len()));
    }
    let (header, body) = bytes.split_at(HEADER_LEN);
    if header[..MAGIC.len()] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion(version));
    }
    bincode::deserialize(body).map_err(|e| SnapshotError::Decode(e.to_string()))
}
