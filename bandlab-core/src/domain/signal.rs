//! Signal — the per-bar intent emitted by a strategy.

use serde::{Deserialize, Serialize};

/// Discrete per-bar intent. Every bar gets exactly one; `None` covers both
/// "nothing to do" and "indicators not warmed up yet".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    #[default]
    None,
    EnterLong,
    EnterShort,
    Exit,
}
