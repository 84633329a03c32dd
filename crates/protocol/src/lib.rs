//! StaffWatch Protocol
//!
//! Shared vocabulary for the StaffWatch engine: user identity, view
//! descriptors, message handles, and the change events produced by the
//! monitor's diff pass.

pub mod events;
pub mod types;

pub use events::{ChangeEvent, CounterDelta};
pub use types::*;

/// Render a duration in whole seconds as a compact human string.
///
/// `0` renders as `"0m"`; durations of a day or more render as `"Xd Yh"`.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0m".to_string();
    }

    let minutes = seconds / 60;
    let hours = minutes / 60;
    let mins = minutes % 60;

    if hours >= 24 {
        let days = hours / 24;
        return format!("{}d {}h", days, hours % 24);
    }
    if hours > 0 {
        if mins > 0 {
            return format!("{}h {}m", hours, mins);
        }
        return format!("{}h", hours);
    }
    format!("{}m", mins)
}
