//! Platform features
//!
//! What the hosting environment offers, probed once at startup.

/// Feature flags of the hosting environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformFeatures {
    /// `<img loading="lazy">` defers the fetch on its own
    pub native_lazy_loading: bool,
    /// An intersection observer can be constructed
    pub intersection_observer: bool,
}

impl PlatformFeatures {
    /// Current engines: native lazy loading and intersection observers
    pub const fn modern() -> Self {
        Self {
            native_lazy_loading: true,
            intersection_observer: true,
        }
    }

    /// Observer available, no native lazy loading
    pub const fn observer_only() -> Self {
        Self {
            native_lazy_loading: false,
            intersection_observer: true,
        }
    }

    /// Neither feature
    pub const fn legacy() -> Self {
        Self {
            native_lazy_loading: false,
            intersection_observer: false,
        }
    }
}

impl Default for PlatformFeatures {
    fn default() -> Self {
        Self::modern()
    }
}
