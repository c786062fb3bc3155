#![forbid(unsafe_code)]

//! Scoped release of an observer registration.
//!
//! A [`Disposable`] owns one release action and runs it exactly once: when
//! [`dispose`](Disposable::dispose) is called or when the handle is dropped,
//! whichever comes first. Holding the handle is what keeps a subscription
//! alive; dropping it early silently stops propagation through it.

use std::fmt;

/// RAII guard that runs its release action exactly once.
#[must_use = "dropping a Disposable immediately releases its subscription"]
pub struct Disposable {
    release: Option<Box<dyn FnOnce()>>,
}

impl Disposable {
    /// Wrap a release action.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    /// Run the release action now. Later calls and the eventual drop do
    /// nothing.
    pub fn dispose(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    /// Whether the release action has already run (or there was none).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for Disposable {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
