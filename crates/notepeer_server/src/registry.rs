//! In-memory note registry.

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::info;

/// A mutation applied to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange<'a> {
    /// A note was inserted or overwritten.
    Registered {
        /// Note key.
        key: &'a str,
        /// New content.
        content: &'a str,
    },
    /// A note was removed.
    Deleted {
        /// Note key.
        key: &'a str,
    },
}

/// Receives every registry mutation after it has been applied.
///
/// This is the hook a durable mirror (settings storage, a snapshot file)
/// attaches to; the registry itself never persists anything. Notifications
/// arrive in the order the mutations were applied. An observer must not
/// mutate the registry that calls it.
pub trait RegistryObserver: Send + Sync {
    /// Called once per applied mutation.
    fn on_change(&self, change: &RegistryChange<'_>);
}

impl<F> RegistryObserver for F
where
    F: Fn(&RegistryChange<'_>) + Send + Sync,
{
    fn on_change(&self, change: &RegistryChange<'_>) {
        self(change)
    }
}

/// Authoritative key → content map for one server instance.
///
/// Keys are case-sensitive and kept in first-registration order. The last
/// write to a key wins. Everything is lost when the registry is dropped.
#[derive(Default)]
pub struct NoteRegistry {
    notes: RwLock<IndexMap<String, String>>,
    /// Held across mutate + notify so observers see mutations in order.
    mutations: Mutex<()>,
    observers: RwLock<Vec<Arc<dyn RegistryObserver>>>,
}

impl NoteRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry with one observer attached.
    pub fn with_observer(observer: Arc<dyn RegistryObserver>) -> Self {
        let registry = Self::new();
        registry.add_observer(observer);
        registry
    }

    /// Attaches an observer.
    pub fn add_observer(&self, observer: Arc<dyn RegistryObserver>) {
        self.observers.write().push(observer);
    }

    /// Inserts or overwrites a note.
    pub fn register(&self, key: &str, content: &str) {
        let _serial = self.mutations.lock();
        let size = {
            let mut notes = self.notes.write();
            match notes.get_mut(key) {
                Some(existing) => {
                    existing.clear();
                    existing.push_str(content);
                }
                None => {
                    notes.insert(key.to_string(), content.to_string());
                }
            }
            notes.len()
        };
        info!(key, size, "note registered");
        self.notify(&RegistryChange::Registered { key, content });
    }

    /// Returns the content stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.notes.read().get(key).cloned()
    }

    /// Removes a note. Returns true if something was removed.
    pub fn delete(&self, key: &str) -> bool {
        let _serial = self.mutations.lock();
        let removed = {
            let mut notes = self.notes.write();
            notes.shift_remove(key).map(|_| notes.len())
        };
        match removed {
            Some(size) => {
                info!(key, size, "note deleted");
                self.notify(&RegistryChange::Deleted { key });
                true
            }
            None => false,
        }
    }

    /// Returns all keys in registration order.
    pub fn list_keys(&self) -> Vec<String> {
        self.notes.read().keys().cloned().collect()
    }

    /// Returns true if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.notes.read().contains_key(key)
    }

    /// Returns the number of notes.
    pub fn len(&self) -> usize {
        self.notes.read().len()
    }

    /// Returns true if the registry holds no notes.
    pub fn is_empty(&self) -> bool {
        self.notes.read().is_empty()
    }

    /// Returns a copy of every entry in registration order.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.notes
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn notify(&self, change: &RegistryChange<'_>) {
        // Cloned out so an observer may attach further observers.
        let observers: Vec<_> = self.observers.read().iter().cloned().collect();
        for observer in observers {
            observer.on_change(change);
        }
    }
}

impl std::fmt::Debug for NoteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteRegistry")
            .field("notes", &self.len())
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn register_then_get() {
        let registry = NoteRegistry::new();
        registry.register("Groceries", "- milk");
        assert_eq!(registry.get("Groceries"), Some("- milk".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn get_missing_is_none() {
        let registry = NoteRegistry::new();
        assert_eq!(registry.get("nothing here"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn keys_are_case_sensitive() {
        let registry = NoteRegistry::new();
        registry.register("Plan", "upper");
        registry.register("plan", "lower");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("Plan"), Some("upper".to_string()));
    }

    #[test]
    fn last_writer_wins() {
        let registry = NoteRegistry::new();
        registry.register("k", "first");
        registry.register("k", "second");
        assert_eq!(registry.get("k"), Some("second".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let registry = NoteRegistry::new();
        registry.register("k", "v");
        assert!(registry.delete("k"));
        assert!(!registry.delete("k"));
        assert!(!registry.delete("k"));
        assert_eq!(registry.get("k"), None);
    }

    #[test]
    fn list_keys_in_registration_order() {
        let registry = NoteRegistry::new();
        registry.register("b", "1");
        registry.register("a", "2");
        registry.register("c", "3");
        registry.register("b", "overwritten");
        assert_eq!(registry.list_keys(), vec!["b", "a", "c"]);

        registry.delete("a");
        registry.register("a", "again");
        assert_eq!(registry.list_keys(), vec!["b", "c", "a"]);
    }

    #[test]
    fn observer_sees_mutations() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registry = NoteRegistry::with_observer(Arc::new(move |change: &RegistryChange<'_>| {
            let entry = match change {
                RegistryChange::Registered { key, content } => format!("+{}={}", key, content),
                RegistryChange::Deleted { key } => format!("-{}", key),
            };
            sink.lock().push(entry);
        }));

        registry.register("a", "1");
        registry.register("a", "2");
        registry.delete("a");
        registry.delete("a");

        assert_eq!(*seen.lock(), vec!["+a=1", "+a=2", "-a"]);
    }

    #[test]
    fn snapshot_copies_entries() {
        let registry = NoteRegistry::new();
        registry.register("x", "1");
        registry.register("y", "2");
        assert_eq!(
            registry.snapshot(),
            vec![
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "2".to_string())
            ]
        );
        assert!(registry.contains("x"));
    }

    #[test]
    fn concurrent_writers_leave_one_value() {
        let registry = Arc::new(NoteRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        registry.register("shared", &format!("writer-{}", i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 1);
        let value = registry.get("shared").unwrap();
        assert!(value.starts_with("writer-"));
    }

    #[test]
    fn slow_observer_keeps_mirror_in_step() {
        let mirror = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&mirror);
        let registry = Arc::new(NoteRegistry::with_observer(Arc::new(
            move |change: &RegistryChange<'_>| {
                if let RegistryChange::Registered { content, .. } = change {
                    if *content == "slow" {
                        thread::sleep(Duration::from_millis(200));
                    }
                    *sink.lock() = content.to_string();
                }
            },
        )));

        let slow = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register("k", "slow"))
        };
        thread::sleep(Duration::from_millis(50));
        let fast = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.register("k", "fast"))
        };
        slow.join().unwrap();
        fast.join().unwrap();

        let stored = registry.get("k").unwrap();
        assert_eq!(*mirror.lock(), stored);
    }
}
