//! Fetch-or-create over one locked level of the hierarchy.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockWriteGuard};

/// Run `f` against the child stored under `key`, inserting a default child
/// first when it is missing.
///
/// The common case (child exists) only takes the shared lock, so callers
/// working on different children never exclude one another. Insertion takes
/// the exclusive lock just long enough to add the entry, then downgrades so
/// `f` runs under a shared guard again. Two racing callers always end up on
/// the same child.
///
/// `f` runs while the parent's shared guard is held. parking_lot's `RwLock`
/// queues new readers behind a waiting writer, so while one caller waits to
/// insert a missing child, every other caller on this level waits behind it
/// until the insert is done and the in-flight `f`s have returned.
pub(crate) fn with_child<C, R>(
    level: &RwLock<HashMap<String, C>>,
    key: &str,
    f: impl FnOnce(&C) -> R,
) -> R
where
    C: Default,
{
    {
        let children = level.read();
        if let Some(child) = children.get(key) {
            return f(child);
        }
    }

    let mut children = level.write();
    if !children.contains_key(key) {
        children.insert(key.to_owned(), C::default());
        tracing::trace!(key, "created counter level");
    }
    let children = RwLockWriteGuard::downgrade(children);
    f(&children[key])
}
