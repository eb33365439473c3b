//! Init and teardown hooks for the host application
//!
//! The host calls `SecretManager::initialize` from its startup path and
//! `SecretManager::shutdown` from its teardown path.

mod manager;

pub use manager::{SecretManager, ManagerState};
