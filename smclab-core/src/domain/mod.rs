//! Domain types for the FVG engine

pub mod bar;
pub mod gap;
pub mod signal;
pub mod trade;

pub use bar::{is_strictly_increasing, position_of, Bar};
pub use gap::{FairValueGap, GapKind};
pub use signal::{Direction, Signal};
pub use trade::{Outcome, Trade};
