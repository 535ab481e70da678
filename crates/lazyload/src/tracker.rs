//! Visibility tracking
//!
//! One tracker is shared by every deferred image. It decides once how
//! visibility is determined and routes each watch request accordingly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lazyload_dom::{
    DOMRect, Document, Event, IntersectionObserver, IntersectionObserverEntry,
    IntersectionObserverOptions, NodeId, PlatformFeatures, RootMargin,
};

use crate::error::{ErrorReporter, LazyLoadingError};
use crate::settings::LazyLoadingSettings;

/// Any sliver of visibility qualifies
const VISIBILITY_THRESHOLD: f64 = 0.01;

/// How visibility is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    /// The host defers fetches of `loading="lazy"` images itself
    Native,
    /// An intersection observer reports proximity to the viewport
    Observed,
    /// Nothing available; images are swapped immediately
    Unsupported,
}

/// Something the tracker can watch
pub trait Watchable {
    /// Node whose visibility is tracked
    fn element(&self) -> NodeId;

    /// Begin loading now
    fn on_loading(&self, document: &mut Document);
}

/// Process-wide visibility tracker
#[derive(Debug)]
pub struct VisibilityTracker {
    mode: TrackingMode,
    observer: Option<RefCell<IntersectionObserver>>,
    loading_event: String,
    reporter: ErrorReporter,
}

impl VisibilityTracker {
    pub fn new(features: PlatformFeatures, settings: &LazyLoadingSettings) -> Self {
        let reporter = settings.reporter();
        let mut tracker = Self {
            mode: TrackingMode::Unsupported,
            observer: None,
            loading_event: settings.event.loading.clone(),
            reporter,
        };

        if features.native_lazy_loading {
            tracker.mode = TrackingMode::Native;
        } else if features.intersection_observer {
            let options = IntersectionObserverOptions {
                root: None,
                root_margin: tracker.root_margin(settings),
                threshold: vec![VISIBILITY_THRESHOLD],
            };
            tracker.observer = Some(RefCell::new(IntersectionObserver::new(options)));
            tracker.mode = TrackingMode::Observed;
        } else {
            tracker.emit_error(LazyLoadingError::TrackingUnsupported);
        }

        tracing::debug!("Visibility tracking mode: {:?}", tracker.mode);
        tracker
    }

    /// Construct the shared instance handed to every image
    pub fn shared(features: PlatformFeatures, settings: &LazyLoadingSettings) -> Rc<Self> {
        Rc::new(Self::new(features, settings))
    }

    fn root_margin(&self, settings: &LazyLoadingSettings) -> RootMargin {
        let margin = settings.root_margin();
        match RootMargin::parse(&margin) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.emit_error(LazyLoadingError::InvalidRootMargin {
                    margin,
                    reason: err.to_string(),
                });
                RootMargin::ZERO
            }
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.mode
    }

    /// Whether the host handles deferral natively
    pub fn is_native(&self) -> bool {
        self.mode == TrackingMode::Native
    }

    /// Enroll an image.
    ///
    /// Without an observer the image is told to load right away, in this
    /// call stack. Under native support the host still defers the fetch.
    pub fn register(&self, document: &mut Document, image: &dyn Watchable) {
        match &self.observer {
            Some(observer) => {
                observer.borrow_mut().observe(image.element());
                tracing::trace!("Watching {}", image.element());
            }
            None => image.on_loading(document),
        }
    }

    /// Handle one batch of observer reports, in report order.
    ///
    /// Intersecting targets get the loading event and are never watched
    /// again. Others stay watched.
    pub fn on_intersection(&self, document: &mut Document, entries: Vec<IntersectionObserverEntry>) {
        for entry in entries {
            if !entry.is_intersecting {
                continue;
            }

            let target = entry.target;
            document.dispatch_event(Event::new(self.loading_event.as_str(), target));

            if let Some(observer) = &self.observer {
                observer.borrow_mut().unobserve(target);
            }
        }
    }

    /// Host frame hook: check the current layout and deliver the reports.
    /// No-op unless observing.
    pub fn update(
        &self,
        document: &mut Document,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) {
        let Some(observer) = &self.observer else {
            return;
        };

        let entries = {
            let mut observer = observer.borrow_mut();
            let released = observer.retain_targets(|node| document.is_connected(node));
            if released > 0 {
                tracing::debug!("Stopped watching {} detached images", released);
            }
            observer.check_intersections(viewport, element_rects, time);
            observer.take_entries()
        };
        if !entries.is_empty() {
            self.on_intersection(document, entries);
        }
    }

    pub fn is_watching(&self, node: NodeId) -> bool {
        self.observer
            .as_ref()
            .is_some_and(|o| o.borrow().is_observing(node))
    }

    pub fn watched_count(&self) -> usize {
        self.observer
            .as_ref()
            .map_or(0, |o| o.borrow().observed_count())
    }

    /// Root margin actually in use, if observing
    pub fn observer_margin(&self) -> Option<RootMargin> {
        self.observer
            .as_ref()
            .map(|o| o.borrow().options().root_margin)
    }

    /// Best-effort error hook
    pub fn emit_error(&self, error: LazyLoadingError) {
        self.reporter.emit(error);
    }
}
