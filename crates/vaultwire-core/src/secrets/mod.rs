//! Secret handles and their lifecycle
//!
//! - `SecretHandle` / `SecretRef`: one value, many reads, one destroy
//! - `SecretFetcher`: resolves a `SecretDescriptor` through a store client
//! - `SecretRegistry`: registers handles at init, destroys them newest-first at shutdown

mod error;
mod handle;
mod fetcher;
mod registry;

pub use error::{SecretError, SecretResult};
pub use handle::{SecretHandle, SecretRef};
pub use fetcher::SecretFetcher;
pub use registry::{SecretRegistry, SecretRequest, SecretSink, SecretSlot};
