//! Display-identity provider contract.

use std::{cell::RefCell, rc::Rc};

use rand::Rng;

/// Source of the local user's display name.
pub trait IdentityProvider {
    /// Current display name.
    fn username(&self) -> String;

    /// Replaces the display name.
    fn set_username(&self, username: &str);
}

#[derive(Debug, Clone)]
/// In-memory identity. Clones share the same name.
pub struct MemoryIdentity {
    inner: Rc<RefCell<String>>,
}

impl MemoryIdentity {
    /// Creates an identity holding `username`.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(username.into())),
        }
    }

    /// Creates an identity with a generated `Anonymous-<n>` name.
    pub fn anonymous() -> Self {
        Self::new(anonymous_username(&mut rand::rng()))
    }
}

impl IdentityProvider for MemoryIdentity {
    fn username(&self) -> String {
        self.inner.borrow().clone()
    }

    fn set_username(&self, username: &str) {
        *self.inner.borrow_mut() = username.to_string();
    }
}

/// Generates a placeholder name of the form `Anonymous-<0..999>`.
pub fn anonymous_username<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("Anonymous-{}", rng.random_range(0..1000))
}
