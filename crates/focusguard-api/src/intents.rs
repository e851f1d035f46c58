//! User intents forwarded from the presentation layer into the engine

use serde::{Deserialize, Serialize};

/// Everything a user can ask the session engine to do
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Add applications to the block list (duplicates ignored)
    AddApps { names: Vec<String> },

    /// Remove one application from the block list
    RemoveApp { name: String },

    /// Empty the block list
    ClearApps,

    /// Add (or subtract) seconds from the pending duration, clamped at zero
    AdjustDuration { delta_seconds: i64 },

    /// Replace the pending duration
    SetDurationAbsolute { hours: u32, minutes: u32 },

    /// Zero the pending duration
    ResetDuration,

    Start,

    Stop,

    /// First step of engaging lock mode
    RequestLock,

    /// Second step of engaging lock mode
    ConfirmLock,

    /// Discard a pending (or pre-start armed) lock
    CancelLockRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_serialization() {
        let intent = Intent::AdjustDuration { delta_seconds: -300 };
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("adjust_duration"));

        let parsed: Intent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, intent);
    }
}
