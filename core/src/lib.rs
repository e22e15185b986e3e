pub mod core;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

pub use crate::core::Store;
pub use crate::core::error::StoreError;
pub use crate::core::reaper::{Reaper, ReaperHandle, SweepOutcome};
pub use crate::core::sink::{ErrorSink, TracingSink};
