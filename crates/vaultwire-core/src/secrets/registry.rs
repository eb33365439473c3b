//! Secret handle registry
//!
//! Owns every handle created during initialization and destroys them all,
//! newest first, at shutdown.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use zeroize::Zeroizing;

use super::error::SecretResult;
use super::fetcher::SecretFetcher;
use super::handle::{SecretHandle, SecretRef};
use crate::logging::{NoOpLogger, SharedLogger};
use crate::types::SecretDescriptor;
use crate::{log_debug, log_error, log_info, log_warn};

/// Callback that receives the reference for one requested secret
///
/// Returns `false` when the delivery was refused, such as a slot that was
/// already filled.
pub type SecretSink = Box<dyn FnOnce(SecretRef) -> bool + Send>;

/// One secret a consumer asked for, and where to deliver it
pub struct SecretRequest {
    pub descriptor: SecretDescriptor,
    sink: SecretSink,
}

impl SecretRequest {
    /// Request with a custom delivery callback
    pub fn new(descriptor: SecretDescriptor, sink: impl FnOnce(SecretRef) + Send + 'static) -> Self {
        Self {
            descriptor,
            sink: Box::new(move |reference| {
                sink(reference);
                true
            }),
        }
    }

    /// Request delivered into a `SecretSlot`
    pub fn for_slot(descriptor: SecretDescriptor, slot: &SecretSlot) -> Self {
        Self {
            descriptor,
            sink: slot.sink(),
        }
    }
}

impl fmt::Debug for SecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRequest")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Place where a consumer receives its secret reference
///
/// Clones share the same cell. The first delivery wins.
#[derive(Clone, Default)]
pub struct SecretSlot {
    cell: Arc<OnceCell<SecretRef>>,
}

impl SecretSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The delivered reference, if any
    pub fn get(&self) -> Option<&SecretRef> {
        self.cell.get()
    }

    pub fn is_filled(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Read through the delivered reference; `None` if nothing was delivered
    /// or the secret has been destroyed
    pub fn read<R>(&self, f: impl FnOnce(Option<&str>) -> R) -> R {
        match self.cell.get() {
            Some(reference) => reference.read(f),
            None => f(None),
        }
    }

    /// Sink that fills this slot
    pub fn sink(&self) -> SecretSink {
        let cell = Arc::clone(&self.cell);
        Box::new(move |reference| cell.set(reference).is_ok())
    }
}

impl fmt::Debug for SecretSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SecretSlot").field(&self.cell.get()).finish()
    }
}

struct Registered {
    descriptor: SecretDescriptor,
    handle: SecretHandle,
}

/// Registry owning every secret handle of the process
///
/// Handles are kept in creation order and never removed. `destroy_all` walks
/// them back to front. Dropping the registry runs `destroy_all` as well, so
/// values are wiped even if the shutdown hook never ran.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use vaultwire_core::secrets::{SecretFetcher, SecretRegistry, SecretRequest, SecretSlot};
/// use vaultwire_core::store::MemorySecretStore;
/// use vaultwire_core::types::SecretDescriptor;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = Arc::new(MemorySecretStore::new());
/// store.put("secret/app", [("db-password", "hunter2")]);
/// let fetcher = SecretFetcher::new(store);
///
/// let slot = SecretSlot::new();
/// let mut registry = SecretRegistry::new();
/// registry
///     .register_all(&fetcher, vec![SecretRequest::for_slot(
///         SecretDescriptor::new("secret/app", "db-password", 1),
///         &slot,
///     )])
///     .await
///     .unwrap();
///
/// assert!(slot.read(|v| v == Some("hunter2")));
/// registry.destroy_all();
/// assert!(slot.read(|v| v.is_none()));
/// # });
/// ```
pub struct SecretRegistry {
    entries: Vec<Registered>,
    logger: SharedLogger,
    torn_down: AtomicBool,
}

impl Default for SecretRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretRegistry {
    pub fn new() -> Self {
        Self::with_logger(Arc::new(NoOpLogger::new()))
    }

    pub fn with_logger(logger: SharedLogger) -> Self {
        Self {
            entries: Vec::new(),
            logger,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Fetch, wrap, register and deliver every request, in order
    ///
    /// Stops at the first failure and returns it. Handles registered before
    /// the failure stay in the registry so `destroy_all` still wipes them.
    pub async fn register_all<I>(&mut self, fetcher: &SecretFetcher, requests: I) -> SecretResult<()>
    where
        I: IntoIterator<Item = SecretRequest>,
    {
        for SecretRequest { descriptor, sink } in requests {
            let value = match fetcher.fetch(&descriptor).await {
                Ok(value) => value,
                Err(err) => {
                    log_error!(self.logger, "Failed to resolve {}: {}", descriptor, err);
                    return Err(err);
                }
            };
            let reference = self.register(descriptor.clone(), value);
            if !sink(reference) {
                log_warn!(
                    self.logger,
                    "Slot for {} was already filled; it keeps its first reference",
                    descriptor
                );
            }
        }
        log_info!(self.logger, "Registered {} secret(s)", self.entries.len());
        Ok(())
    }

    /// Register an already fetched value and return a reference to it
    pub fn register(&mut self, descriptor: SecretDescriptor, value: Zeroizing<String>) -> SecretRef {
        let handle = SecretHandle::from_zeroizing(value);
        let reference = handle.reference();
        log_debug!(self.logger, "Registered {}", descriptor);
        self.entries.push(Registered { descriptor, handle });
        reference
    }

    /// Destroy every handle, newest first
    ///
    /// Idempotent: handles already destroyed are skipped. Returns how many
    /// handles this call cleared.
    pub fn destroy_all(&self) -> usize {
        let first_pass = !self.torn_down.swap(true, Ordering::SeqCst);

        let mut cleared = 0;
        for entry in self.entries.iter().rev() {
            if entry.handle.destroy() {
                cleared += 1;
                log_debug!(self.logger, "Destroyed {}", entry.descriptor);
            }
        }

        if first_pass || cleared > 0 {
            log_info!(self.logger, "Destroyed {} secret(s)", cleared);
        }
        cleared
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &SecretDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Whether `destroy_all` has run
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for SecretRegistry {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

impl fmt::Debug for SecretRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRegistry")
            .field("descriptors", &self.descriptors().collect::<Vec<_>>())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger};
    use crate::secrets::SecretError;
    use crate::store::{MemorySecretStore, StoreError};
    use parking_lot::Mutex;

    fn fetcher(store: &Arc<MemorySecretStore>) -> SecretFetcher {
        SecretFetcher::new(store.clone())
    }

    fn destroyed_lines(logger: &MemoryLogger) -> Vec<String> {
        logger
            .messages(LogLevel::Debug)
            .into_iter()
            .filter(|m| m.starts_with("Destroyed "))
            .collect()
    }

    #[tokio::test]
    async fn test_register_all_delivers_in_order() {
        let store = Arc::new(MemorySecretStore::new());
        store.put("app", [("a", "1"), ("b", "2"), ("c", "3")]);

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let requests: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|name| {
                let delivered = delivered.clone();
                SecretRequest::new(SecretDescriptor::new("app", name, 1), move |reference| {
                    let value = reference.read(|v| v.unwrap_or_default().to_string());
                    delivered.lock().push((name, value));
                })
            })
            .collect();

        let mut registry = SecretRegistry::new();
        registry.register_all(&fetcher(&store), requests).await.unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(
            *delivered.lock(),
            vec![("a", "1".to_string()), ("b", "2".to_string()), ("c", "3".to_string())]
        );
        let names: Vec<_> = registry.descriptors().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_destroy_all_runs_in_reverse_order() {
        let store = Arc::new(MemorySecretStore::new());
        store.put("app", [("A", "a"), ("B", "b"), ("C", "c")]);
        let logger = Arc::new(MemoryLogger::new());

        let slots: Vec<SecretSlot> = (0..3).map(|_| SecretSlot::new()).collect();
        let requests: Vec<_> = ["A", "B", "C"]
            .iter()
            .zip(&slots)
            .map(|(name, slot)| SecretRequest::for_slot(SecretDescriptor::new("app", *name, 1), slot))
            .collect();

        let mut registry = SecretRegistry::with_logger(logger.clone());
        registry.register_all(&fetcher(&store), requests).await.unwrap();
        assert!(slots.iter().all(|s| s.is_filled() && s.read(|v| v.is_some())));

        assert_eq!(registry.destroy_all(), 3);
        assert_eq!(
            destroyed_lines(&logger),
            vec![
                "Destroyed name [C], version [1], path [app]",
                "Destroyed name [B], version [1], path [app]",
                "Destroyed name [A], version [1], path [app]",
            ]
        );
        assert!(slots.iter().all(|s| s.read(|v| v.is_none())));
        assert!(registry.is_torn_down());
    }

    #[tokio::test]
    async fn test_missing_secret_keeps_earlier_handles() {
        let store = Arc::new(MemorySecretStore::new());
        store.put("p1", [("k1", "x")]);

        let first = SecretSlot::new();
        let second = SecretSlot::new();
        let requests = vec![
            SecretRequest::for_slot(SecretDescriptor::new("p1", "k1", 1), &first),
            SecretRequest::for_slot(SecretDescriptor::new("p1", "missing", 1), &second),
        ];

        let mut registry = SecretRegistry::new();
        let err = registry
            .register_all(&fetcher(&store), requests)
            .await
            .unwrap_err();

        match err {
            SecretError::NotFound { name, path, version } => {
                assert_eq!(name, "missing");
                assert_eq!(path, "p1");
                assert_eq!(version, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert_eq!(registry.len(), 1);
        assert!(first.read(|v| v == Some("x")));
        assert!(!second.is_filled());

        assert_eq!(registry.destroy_all(), 1);
        assert!(first.read(|v| v.is_none()));
    }

    #[tokio::test]
    async fn test_store_failure_stops_registration() {
        let store = Arc::new(MemorySecretStore::new());
        store.put("p1", [("k1", "x")]);

        let mut registry = SecretRegistry::new();
        registry
            .register_all(
                &fetcher(&store),
                vec![SecretRequest::new(SecretDescriptor::new("p1", "k1", 1), |_| {})],
            )
            .await
            .unwrap();

        store.set_unavailable(true);
        let reads_before = store.read_count();
        let err = registry
            .register_all(
                &fetcher(&store),
                vec![
                    SecretRequest::new(SecretDescriptor::new("p1", "k1", 1), |_| {}),
                    SecretRequest::new(SecretDescriptor::new("p1", "k1", 1), |_| {}),
                ],
            )
            .await
            .unwrap_err();

        assert!(matches!(err, SecretError::Store(StoreError::Unavailable(_))));
        assert_eq!(store.read_count(), reads_before + 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_destroy_all_is_idempotent() {
        let logger = Arc::new(MemoryLogger::new());
        let mut registry = SecretRegistry::with_logger(logger.clone());
        let a = registry.register(SecretDescriptor::new("p", "a", 1), Zeroizing::new("1".into()));
        let b = registry.register(SecretDescriptor::new("p", "b", 1), Zeroizing::new("2".into()));

        assert_eq!(registry.destroy_all(), 2);
        assert_eq!(registry.destroy_all(), 0);
        assert!(a.is_destroyed() && b.is_destroyed());
        assert_eq!(destroyed_lines(&logger).len(), 2);
    }

    #[test]
    fn test_drop_destroys_remaining_handles() {
        let mut registry = SecretRegistry::new();
        let reference = registry.register(SecretDescriptor::latest("p", "a"), Zeroizing::new("v".into()));
        let copy = reference.clone();

        drop(registry);
        assert!(reference.is_destroyed());
        assert!(copy.read(|v| v.is_none()));
    }

    #[tokio::test]
    async fn test_empty_registration() {
        let store = Arc::new(MemorySecretStore::new());
        let mut registry = SecretRegistry::new();
        registry.register_all(&fetcher(&store), Vec::new()).await.unwrap();

        assert!(registry.is_empty());
        assert_eq!(registry.destroy_all(), 0);
        assert_eq!(store.read_count(), 0);
    }

    #[test]
    fn test_slot_first_delivery_wins() {
        let slot = SecretSlot::new();
        assert!(slot.read(|v| v.is_none()));

        let first = SecretHandle::new("first");
        let second = SecretHandle::new("second");
        assert!((slot.sink())(first.reference()));
        assert!(!(slot.clone().sink())(second.reference()));

        assert!(slot.read(|v| v == Some("first")));
        assert_eq!(slot.get(), Some(&first.reference()));
    }

    #[tokio::test]
    async fn test_second_delivery_to_slot_is_logged() {
        let store = Arc::new(MemorySecretStore::new());
        store.put("secret/app", [("user", "admin"), ("password", "hunter2")]);
        let fetcher = SecretFetcher::new(store);
        let logger = Arc::new(MemoryLogger::new());
        let mut registry = SecretRegistry::with_logger(logger.clone());

        let slot = SecretSlot::new();
        registry
            .register_all(
                &fetcher,
                vec![
                    SecretRequest::for_slot(SecretDescriptor::new("secret/app", "user", 1), &slot),
                    SecretRequest::for_slot(SecretDescriptor::new("secret/app", "password", 1), &slot),
                ],
            )
            .await
            .unwrap();

        assert!(slot.read(|v| v == Some("admin")));
        assert_eq!(registry.len(), 2);

        let warnings = logger.messages(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("name [password]"));
        assert!(!logger.contains("hunter2"));

        // The undelivered handle is still owned and wiped at teardown
        assert_eq!(registry.destroy_all(), 2);
    }
}
