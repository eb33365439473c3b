//! Secret handles
//!
//! A `SecretHandle` wraps one secret value. It can be read any number of
//! times and destroyed exactly once. Consumers never get the handle itself:
//! they get a `SecretRef`, which can read but not destroy.
//!
//! The value lives in an `ArcSwapOption`. `destroy` swaps it for `None`; a
//! reader that loaded the value before the swap keeps a full copy of the
//! `Arc` until its closure returns, and the bytes are zeroized when that last
//! `Arc` is released.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use zeroize::Zeroizing;

type Slot = ArcSwapOption<Zeroizing<String>>;

/// Owning handle to one secret value
///
/// Only the owner of the handle (normally the `SecretRegistry`) can destroy it.
///
/// # Example
///
/// ```
/// use vaultwire_core::secrets::SecretHandle;
///
/// let handle = SecretHandle::new("hunter2");
/// assert_eq!(handle.read(|v| v.map(str::len)), Some(7));
///
/// handle.destroy();
/// assert!(handle.is_destroyed());
/// assert_eq!(handle.read(|v| v.map(str::len)), None);
/// ```
pub struct SecretHandle {
    slot: Arc<Slot>,
}

impl SecretHandle {
    /// Wrap a value
    pub fn new(value: impl Into<String>) -> Self {
        Self::from_zeroizing(Zeroizing::new(value.into()))
    }

    /// Wrap a value that is already in a zeroizing buffer
    pub fn from_zeroizing(value: Zeroizing<String>) -> Self {
        Self {
            slot: Arc::new(ArcSwapOption::from_pointee(value)),
        }
    }

    /// Apply `f` to the current value, `None` once destroyed
    pub fn read<R>(&self, f: impl FnOnce(Option<&str>) -> R) -> R {
        read_slot(&self.slot, f)
    }

    /// True once `destroy` has taken effect
    pub fn is_destroyed(&self) -> bool {
        self.slot.load().is_none()
    }

    /// Clear the value
    ///
    /// Safe to call concurrently with `read` and with itself. Exactly one call
    /// performs the clearing and returns `true`; every other call is a no-op
    /// returning `false`.
    pub fn destroy(&self) -> bool {
        self.slot.swap(None).is_some()
    }

    /// Read-only reference for a consumer
    pub fn reference(&self) -> SecretRef {
        SecretRef {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_slot("SecretHandle", &self.slot, f)
    }
}

/// Read-only view of a `SecretHandle`
///
/// Cheap to clone and safe to share across threads. It observes the same slot
/// as the handle, so it reads `None` as soon as the handle is destroyed.
#[derive(Clone)]
pub struct SecretRef {
    slot: Arc<Slot>,
}

impl SecretRef {
    /// Apply `f` to the current value, `None` once destroyed
    pub fn read<R>(&self, f: impl FnOnce(Option<&str>) -> R) -> R {
        read_slot(&self.slot, f)
    }

    /// True once the owning handle has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.slot.load().is_none()
    }
}

impl fmt::Debug for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        debug_slot("SecretRef", &self.slot, f)
    }
}

fn read_slot<R>(slot: &Slot, f: impl FnOnce(Option<&str>) -> R) -> R {
    let guard = slot.load();
    f(guard.as_deref().map(|v| v.as_str()))
}

fn debug_slot(name: &str, slot: &Slot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let state = if slot.load().is_some() { "[REDACTED]" } else { "[DESTROYED]" };
    f.debug_tuple(name).field(&format_args!("{}", state)).finish()
}

// Equality and hashing follow the current value, not identity. Two destroyed
// slots compare equal.
fn slots_eq(a: &Slot, b: &Slot) -> bool {
    let left = a.load();
    let right = b.load();
    match (left.as_deref(), right.as_deref()) {
        (Some(l), Some(r)) => l.as_str() == r.as_str(),
        (None, None) => true,
        _ => false,
    }
}

fn hash_slot<H: Hasher>(slot: &Slot, state: &mut H) {
    slot.load().as_deref().map(|v| v.as_str()).hash(state);
}

impl PartialEq for SecretHandle {
    fn eq(&self, other: &Self) -> bool {
        slots_eq(&self.slot, &other.slot)
    }
}

impl Eq for SecretHandle {}

impl Hash for SecretHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_slot(&self.slot, state);
    }
}

impl PartialEq for SecretRef {
    fn eq(&self, other: &Self) -> bool {
        slots_eq(&self.slot, &other.slot)
    }
}

impl Eq for SecretRef {}

impl Hash for SecretRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_slot(&self.slot, state);
    }
}

impl PartialEq<SecretRef> for SecretHandle {
    fn eq(&self, other: &SecretRef) -> bool {
        slots_eq(&self.slot, &other.slot)
    }
}
