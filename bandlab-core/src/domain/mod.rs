//! Domain types shared by the indicator, strategy and engine layers.

pub mod bar;
pub mod position;
pub mod signal;
pub mod trade;

pub use bar::{validate_bars, Bar, DataError};
pub use position::{OpenPosition, Position, PositionSide};
pub use signal::Signal;
pub use trade::{ExitReason, TradeRecord};
