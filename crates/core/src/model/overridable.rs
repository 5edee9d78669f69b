use serde::{Deserialize, Serialize};

/// A configuration field that distinguishes "not set by the author" from
/// "explicitly set". The built-in default is only consulted by [`get`].
///
/// [`get`]: Overridable::get
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overridable<T> {
    default: T,
    value: Option<T>,
}

impl<T: Clone> Overridable<T> {
    pub fn new(default: T) -> Self {
        Overridable {
            default,
            value: None,
        }
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The explicitly set value, if any.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    /// The effective value: the explicit one, else the built-in default.
    pub fn get(&self) -> T {
        self.value.clone().unwrap_or_else(|| self.default.clone())
    }
}
