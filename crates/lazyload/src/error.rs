//! Error reporting
//!
//! All anomalies are recoverable. They never reach the code that triggered
//! them; they are logged and handed to the optional user callback.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use lazyload_dom::NodeId;

/// User callback receiving reported errors
pub type ErrorCallback = Rc<dyn Fn(&LazyLoadingError)>;

/// Recoverable anomalies
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LazyLoadingError {
    #[error("IntersectionObserver isn't supported")]
    TrackingUnsupported,

    #[error("Element's data is missing (element {element})")]
    MissingData { element: NodeId },

    #[error("Element's data is missing (source {candidate})")]
    MissingSourceData { candidate: NodeId },

    #[error("Invalid loading offset {margin:?}: {reason}")]
    InvalidRootMargin { margin: String, reason: String },
}

/// Best-effort error hook
#[derive(Clone, Default)]
pub struct ErrorReporter {
    callback: Option<ErrorCallback>,
}

impl ErrorReporter {
    pub fn new(callback: Option<ErrorCallback>) -> Self {
        Self { callback }
    }

    /// Log `error` and pass it to the callback, if any.
    ///
    /// A panicking callback is caught here and never unwinds into the caller.
    pub fn emit(&self, error: LazyLoadingError) {
        tracing::warn!("{}", error);

        let Some(callback) = &self.callback else {
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| callback(&error))).is_err() {
            tracing::debug!("Error callback panicked; ignored");
        }
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}

impl std::fmt::Debug for ErrorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorReporter")
            .field("callback", &self.has_callback())
            .finish()
    }
}
