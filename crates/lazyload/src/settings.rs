//! Settings
//!
//! Process-wide configuration, built once at startup and shared by `Rc`
//! with the tracker and every deferred image.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorCallback, ErrorReporter, LazyLoadingError};

/// Suffixes of the `data-*` placeholder attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataAttributes {
    /// Deferred primary source lives in `data-<src>`
    pub src: String,
    /// Deferred source-set lives in `data-<srcset>`
    pub srcset: String,
}

impl Default for DataAttributes {
    fn default() -> Self {
        Self {
            src: "src".to_string(),
            srcset: "srcset".to_string(),
        }
    }
}

/// Internal and external signal names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventNames {
    /// Dispatched by the tracker to start the source swap
    pub loading: String,
    /// Dispatched by an image once its real source finished loading
    pub loaded: String,
}

impl Default for EventNames {
    fn default() -> Self {
        Self {
            loading: "_lazy-loading--loading".to_string(),
            loaded: "_lazy-loading--loaded".to_string(),
        }
    }
}

/// Marker classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassNames {
    /// Identifies markup eligible for deferred loading
    pub lazy: String,
    /// Appended once loading completed
    pub lazy_loaded: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            lazy: "lazy-loading".to_string(),
            lazy_loaded: "lazy-loading--loaded".to_string(),
        }
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Setting {0} must not be empty")]
    Empty(&'static str),
}

/// Deferred loading configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyLoadingSettings {
    /// Vertical distance from the viewport at which loading starts.
    /// Ignored when the host loads lazily on its own.
    pub offset_to_loading: String,
    /// Receives recoverable anomalies; `None` drops them
    #[serde(skip)]
    pub error_callback: Option<ErrorCallback>,
    pub data: DataAttributes,
    pub event: EventNames,
    pub class: ClassNames,
}

impl Default for LazyLoadingSettings {
    fn default() -> Self {
        Self {
            offset_to_loading: "500px".to_string(),
            error_callback: None,
            data: DataAttributes::default(),
            event: EventNames::default(),
            class: ClassNames::default(),
        }
    }
}

impl fmt::Debug for LazyLoadingSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLoadingSettings")
            .field("offset_to_loading", &self.offset_to_loading)
            .field("error_callback", &self.error_callback.as_ref().map(|_| "<fn>"))
            .field("data", &self.data)
            .field("event", &self.event)
            .field("class", &self.class)
            .finish()
    }
}

impl LazyLoadingSettings {
    /// Load from JSON; omitted fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject names that would make the markup contract ambiguous
    pub fn validate(&self) -> Result<(), SettingsError> {
        let required = [
            ("data.src", &self.data.src),
            ("data.srcset", &self.data.srcset),
            ("event.loading", &self.event.loading),
            ("event.loaded", &self.event.loaded),
            ("class.lazy", &self.class.lazy),
            ("class.lazy_loaded", &self.class.lazy_loaded),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(SettingsError::Empty(name));
            }
        }
        Ok(())
    }

    /// Attach the error callback
    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LazyLoadingError) + 'static,
    {
        self.error_callback = Some(Rc::new(callback));
        self
    }

    /// Attribute holding the deferred primary source
    pub fn data_src_attribute(&self) -> String {
        format!("data-{}", self.data.src)
    }

    /// Attribute holding the deferred source-set
    pub fn data_srcset_attribute(&self) -> String {
        format!("data-{}", self.data.srcset)
    }

    /// Observer root margin: the offset above and below, nothing sideways
    pub fn root_margin(&self) -> String {
        format!("{} 0px", self.offset_to_loading)
    }

    /// Same settings with different marker classes
    pub fn with_classes(&self, lazy: &str, lazy_loaded: &str) -> Self {
        Self {
            class: ClassNames {
                lazy: lazy.to_string(),
                lazy_loaded: lazy_loaded.to_string(),
            },
            ..self.clone()
        }
    }

    pub fn reporter(&self) -> ErrorReporter {
        ErrorReporter::new(self.error_callback.clone())
    }
}
