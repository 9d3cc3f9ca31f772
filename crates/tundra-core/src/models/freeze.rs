//! Freeze and restore records shared by accounts and content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who froze an entity and when.
///
/// Stored as two nullable columns; keeping them in one value means a
/// timestamp without an actor (or the reverse) cannot be represented.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreezeRecord {
    pub frozen_at: DateTime<Utc>,
    pub frozen_by: Uuid,
}

impl FreezeRecord {
    pub fn new(frozen_by: Uuid, frozen_at: DateTime<Utc>) -> Self {
        Self {
            frozen_at,
            frozen_by,
        }
    }

    /// Rebuild a record from its two stored halves.
    ///
    /// Returns `Err` when exactly one half is present.
    pub fn from_parts(
        frozen_at: Option<DateTime<Utc>>,
        frozen_by: Option<Uuid>,
    ) -> Result<Option<Self>, HalfFrozen> {
        match (frozen_at, frozen_by) {
            (Some(frozen_at), Some(frozen_by)) => Ok(Some(Self {
                frozen_at,
                frozen_by,
            })),
            (None, None) => Ok(None),
            _ => Err(HalfFrozen),
        }
    }

    pub fn is_self_imposed(&self, account_id: Uuid) -> bool {
        self.frozen_by == account_id
    }
}

/// Stored freeze columns disagree: one is set, the other is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("frozen_at and frozen_by must be set together")]
pub struct HalfFrozen;

/// Who lifted the most recent freeze and when.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestoreRecord {
    pub restored_at: DateTime<Utc>,
    pub restored_by: Uuid,
}

impl RestoreRecord {
    pub fn new(restored_by: Uuid, restored_at: DateTime<Utc>) -> Self {
        Self {
            restored_at,
            restored_by,
        }
    }
}

/// Target state of a cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeDirection {
    Freeze(FreezeRecord),
    Unfreeze,
}

impl CascadeDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Freeze(_) => "freeze",
            Self::Unfreeze => "unfreeze",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_halves_build_a_record() {
        let now = Utc::now();
        let actor = Uuid::new_v4();
        let record = FreezeRecord::from_parts(Some(now), Some(actor)).unwrap();
        assert_eq!(record, Some(FreezeRecord::new(actor, now)));
    }

    #[test]
    fn no_halves_is_unfrozen() {
        assert_eq!(FreezeRecord::from_parts(None, None).unwrap(), None);
    }

    #[test]
    fn one_half_is_rejected() {
        assert!(FreezeRecord::from_parts(Some(Utc::now()), None).is_err());
        assert!(FreezeRecord::from_parts(None, Some(Uuid::new_v4())).is_err());
    }

    #[test]
    fn self_imposed_freeze() {
        let id = Uuid::new_v4();
        let record = FreezeRecord::new(id, Utc::now());
        assert!(record.is_self_imposed(id));
        assert!(!record.is_self_imposed(Uuid::new_v4()));
    }
}
