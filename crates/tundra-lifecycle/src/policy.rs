//! Pure policy checks for lifecycle transitions.

use tundra_core::models::freeze::FreezeRecord;
use uuid::Uuid;

/// A holder may lift a freeze only if they imposed it themselves. A
/// freeze placed by anyone else (an administrator) needs an admin.
pub fn can_self_unfreeze(freeze: &FreezeRecord, requester: Uuid) -> bool {
    freeze.is_self_imposed(requester)
}
