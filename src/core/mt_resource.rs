use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` is how the crate shares a value between the tiers that may
/// hold it. Chunk handles handed out by the
/// [`ChunkManager`](crate::world_state::chunk_manager::ChunkManager) are
/// `MtResource<TrackedChunk>`, and the pending-cleanup queue is an
/// `MtResource` so the chunks themselves can enqueue into it.
///
/// Cloning an `MtResource` clones the handle, never the value.
///
/// # Examples
///
/// ```
/// use world_tools::core::MtResource;
///
/// let counter = MtResource::new(0);
/// let alias = counter.clone();
///
/// *alias.get_mut() += 1;
///
/// assert_eq!(*counter.get(), 1);
/// assert!(counter.ptr_eq(&alias));
/// ```
///
/// # Locking
/// - Guards must be dropped before the same thread locks the resource again.
///   A read guard held across a write request on the same thread deadlocks.
/// - A poisoned lock is recovered rather than propagated.
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard over the contained value.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a mutable guard over the contained value.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles point at the same value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }

    /// Number of live handles to this value.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.resource)
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + std::fmt::Debug> std::fmt::Debug for MtResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MtResource").field(&*self.get()).finish()
    }
}
