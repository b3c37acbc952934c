//! Lock policy for movement details.
//!
//! A detail line is locked when a dependent record owns part of its state:
//! either a payment marked it settled, or a cascading delete tombstoned it
//! while keeping the row referenced. Locked lines must not be structurally
//! changed or removed by document edits; the orchestrator consults this
//! predicate before touching any pre-existing line and fails fast with
//! [`EngineError::LinkedDetail`](crate::EngineError::LinkedDetail).
//!
//! The two conditions are explicit fields on the line (`settled`,
//! `deleted_at`), never one overloaded timestamp, so the policy stays a pure
//! function of the row.

use serde::{Deserialize, Serialize};

use crate::details::Detail;

/// Why a detail line refuses changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockReason {
    /// A payment (or similar dependent record) settled the line.
    Settled,
    /// A cascading delete tombstoned the line but kept the row.
    Tombstoned,
}

impl LockReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settled => "settled",
            Self::Tombstoned => "tombstoned",
        }
    }
}

impl core::fmt::Display for LockReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the reason a line is locked, or `None` when it may be changed.
///
/// Tombstoning wins over settlement when both apply: the tombstone is the
/// stronger statement about the row's lifecycle.
pub fn lock_reason(detail: &Detail) -> Option<LockReason> {
    if detail.deleted_at.is_some() {
        return Some(LockReason::Tombstoned);
    }
    if detail.settled {
        return Some(LockReason::Settled);
    }
    None
}
