//! Compute-once caches for derived fields

use crate::error::{FiregroundError, Result};
use std::sync::{Arc, Mutex};

/// Single-flight lazily computed value
///
/// The first caller computes while holding the lock; concurrent callers
/// block on it and then share the cached `Arc`. A failed computation is
/// not cached, so a later call retries.
#[derive(Debug)]
pub struct Memo<T> {
    name: &'static str,
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Memo<T> {
    /// An empty cache; `name` identifies it in lock errors
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Mutex::new(None),
        }
    }

    /// Cached value, computing it with `compute` on first use
    ///
    /// # Errors
    ///
    /// Propagates `compute`'s error, or `LockPoisoned` if an earlier
    /// computation panicked.
    pub fn get_or_try_init(&self, compute: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| FiregroundError::LockPoisoned(self.name))?;
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(compute()?);
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    /// The cached value if it has been computed
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.lock().ok().and_then(|slot| slot.as_ref().map(Arc::clone))
    }
}

/// A field that is either derived from inputs on demand or was loaded
pub enum FieldModel<I, F> {
    /// Computed from `inputs` at most once
    Derived {
        /// Domain, upstream models and collaborators
        inputs: I,
        /// Lazily computed field
        cache: Memo<F>,
    },
    /// Supplied ready-made (e.g. read from disk)
    Loaded {
        /// The field
        field: Arc<F>,
    },
}

impl<I, F> FieldModel<I, F> {
    /// A derived field over `inputs`
    pub fn derived(name: &'static str, inputs: I) -> Self {
        FieldModel::Derived {
            inputs,
            cache: Memo::new(name),
        }
    }

    /// A pre-computed field
    pub fn loaded(field: F) -> Self {
        FieldModel::Loaded {
            field: Arc::new(field),
        }
    }

    /// Inputs of a derived field
    pub fn inputs(&self) -> Option<&I> {
        match self {
            FieldModel::Derived { inputs, .. } => Some(inputs),
            FieldModel::Loaded { .. } => None,
        }
    }

    /// True for loaded fields and derived fields already computed
    pub fn is_available(&self) -> bool {
        match self {
            FieldModel::Derived { cache, .. } => cache.get().is_some(),
            FieldModel::Loaded { .. } => true,
        }
    }

    /// The field, computing it with `compute` if needed
    ///
    /// # Errors
    ///
    /// Propagates `compute`'s error or a poisoned cache lock.
    pub fn data_with(&self, compute: impl FnOnce(&I) -> Result<F>) -> Result<Arc<F>> {
        match self {
            FieldModel::Derived { inputs, cache } => cache.get_or_try_init(|| compute(inputs)),
            FieldModel::Loaded { field } => Ok(Arc::clone(field)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_memo_computes_once_across_threads() {
        let memo = Arc::new(Memo::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let calls = Arc::clone(&calls);
                thread::spawn(move || {
                    memo.get_or_try_init(|| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(20));
                        Ok(42)
                    })
                    .unwrap()
                })
            })
            .collect();
        let values: Vec<Arc<i32>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
    }

    #[test]
    fn test_failed_compute_is_retried() {
        let memo: Memo<i32> = Memo::new("test");
        let err = memo.get_or_try_init(|| Err(FiregroundError::MissingInput("weather".into())));
        assert!(err.is_err());
        assert!(memo.get().is_none());
        assert_eq!(*memo.get_or_try_init(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn test_loaded_field_skips_compute() {
        let model: FieldModel<(), i32> = FieldModel::loaded(5);
        assert!(model.is_available());
        assert!(model.inputs().is_none());
        let value = model.data_with(|()| panic!("loaded fields never compute")).unwrap();
        assert_eq!(*value, 5);
    }
}
