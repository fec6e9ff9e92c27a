//! Interior-mutable storage for configured properties.
//!
//! Built objects are shared (`Arc`) before the configurer assigns their
//! properties, so fields that will be configured live in a [`Property<T>`].
//! `#[derive(Object)]` generates `set_property` arms that write into them.
//!
//! # Example
//!
//! ```
//! use horizon_weave_core::Property;
//!
//! let title = Property::new(String::from("untitled"));
//! assert!(title.set("Main".to_string()));
//! assert!(!title.set("Main".to_string()));
//! assert_eq!(title.get(), "Main");
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A shared, lock-protected property value.
///
/// `Property<T>` uses interior mutability with `RwLock` and is `Send + Sync`
/// whenever `T` is.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value unconditionally.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }

    /// Replace the value, returning the previous one.
    pub fn take_replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.value.write(), value)
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self::new(self.get())
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Property").field(&*self.value.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_change() {
        let prop = Property::new(1);
        assert!(!prop.set(1));
        assert!(prop.set(2));
        assert_eq!(prop.replace(2), None);
        assert_eq!(prop.replace(5), Some(2));
        assert_eq!(prop.get(), 5);
    }

    #[test]
    fn test_with_and_silent() {
        let prop: Property<Vec<u8>> = Property::default();
        prop.set_silent(vec![1, 2, 3]);
        assert_eq!(prop.with(|v| v.len()), 3);
        assert_eq!(prop.take_replace(Vec::new()), vec![1, 2, 3]);
        assert_eq!(format!("{prop:?}"), "Property([])");
    }
}
