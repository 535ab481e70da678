//! Lazyload
//!
//! Defers loading of off-screen images until they approach the viewport.
//!
//! A shared [`VisibilityTracker`] decides once whether the host defers image
//! fetches natively, needs an intersection observer, or has neither. Each
//! [`DeferredImage`] owns the swap of its placeholder `data-*` attributes to
//! the real `src`/`srcset` and fires a "loaded" event once the host finished
//! loading. [`LazyRegistry`] discovers eligible markup by marker class.
//!
//! # Example
//! ```rust,ignore
//! use std::rc::Rc;
//! use lazyload::{LazyLoadingSettings, LazyRegistry, VisibilityTracker};
//!
//! let settings = Rc::new(LazyLoadingSettings::default());
//! let tracker = VisibilityTracker::shared(document.features(), &settings);
//! let mut registry = LazyRegistry::new(tracker, settings);
//! registry.upgrade(&mut document);
//! ```

mod error;
mod image;
mod registry;
mod settings;
mod tracker;

pub use error::{ErrorCallback, ErrorReporter, LazyLoadingError};
pub use image::DeferredImage;
pub use registry::LazyRegistry;
pub use settings::{ClassNames, DataAttributes, EventNames, LazyLoadingSettings, SettingsError};
pub use tracker::{TrackingMode, VisibilityTracker, Watchable};

pub use lazyload_dom as dom;
