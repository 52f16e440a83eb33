//! OutputSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for outbound sinks.

use crate::ContractError;

/// Outbound delivery trait
///
/// All sink implementations must implement this trait. A sink is shared by
/// every worker of its route, so delivery takes `&self`.
#[trait_variant::make(OutputSink: Send)]
pub trait LocalOutputSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one transformed payload
    ///
    /// # Errors
    /// Returns the delivery failure (should include context). Callers log it
    /// and drop the message; there is no retry.
    async fn deliver(&self, payload: &[u8]) -> Result<(), ContractError>;
}
