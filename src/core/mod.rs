/*!
 * Core Module
 * Guards and limits shared across the crate
 */

pub mod guard;
pub mod limits;

// Re-export for convenience
pub use guard::{Guard, GuardDrop, GuardError, GuardMetadata, GuardResult};
