//! Deferred image
//!
//! Owns one image's placeholder-to-real source transition and its
//! finalization. The instance lives as long as the listeners it installs
//! on its element.

use std::cell::Cell;
use std::rc::Rc;

use lazyload_dom::{Document, Event, NodeId, event_names};

use crate::error::{ErrorReporter, LazyLoadingError};
use crate::settings::LazyLoadingSettings;
use crate::tracker::{VisibilityTracker, Watchable};

/// Attribute value, treating an empty value as absent
fn non_empty(document: &Document, node: NodeId, name: &str) -> Option<String> {
    document
        .get_attribute(node, name)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// One `<img>` whose sources are deferred
#[derive(Debug)]
pub struct DeferredImage {
    element: NodeId,
    is_picture: bool,
    is_loaded: Cell<bool>,
    native_lazy: bool,
    settings: Rc<LazyLoadingSettings>,
    reporter: ErrorReporter,
}

impl DeferredImage {
    /// Wrap `element`, subscribe to its signals and enroll it with the tracker.
    ///
    /// Under native or unsupported tracking the sources are swapped before
    /// this returns.
    pub fn attach(
        document: &mut Document,
        element: NodeId,
        tracker: &VisibilityTracker,
        settings: Rc<LazyLoadingSettings>,
    ) -> Rc<Self> {
        let is_picture = document
            .parent(element)
            .and_then(|parent| document.tag_name(parent))
            == Some("picture");

        let image = Rc::new(Self {
            element,
            is_picture,
            is_loaded: Cell::new(false),
            native_lazy: tracker.is_native(),
            reporter: settings.reporter(),
            settings,
        });

        // `load` also fires for natively deferred images
        let on_load = Rc::clone(&image);
        document.add_event_listener(element, event_names::LOAD, move |doc, _| {
            on_load.on_image_load(doc);
        });
        let on_loading = Rc::clone(&image);
        document.add_event_listener(element, &image.settings.event.loading, move |doc, _| {
            on_loading.swap_sources(doc);
        });

        tracing::trace!("Attached deferred image {} (picture: {})", element, is_picture);
        tracker.register(document, image.as_ref());
        image
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Whether the element sits in a `<picture>`
    pub fn is_picture(&self) -> bool {
        self.is_picture
    }

    /// Set once the swap started; never reset
    pub fn is_loaded(&self) -> bool {
        self.is_loaded.get()
    }

    /// Move deferred sources into the real attributes
    fn swap_sources(&self, document: &mut Document) {
        if self.is_loaded.get() {
            tracing::trace!("Sources of {} already swapped", self.element);
            return;
        }

        let element = self.element;
        let data_src = self.settings.data_src_attribute();
        let data_srcset = self.settings.data_srcset_attribute();

        let src = non_empty(document, element, &data_src);
        let srcset = non_empty(document, element, &data_srcset);

        let Some(src) = src else {
            self.reporter.emit(LazyLoadingError::MissingData { element });
            return;
        };

        document.remove_attribute(element, &data_src);
        if srcset.is_some() {
            document.remove_attribute(element, &data_srcset);
        }

        // Keep the host deferring the fetch even though src is set eagerly
        if self.native_lazy && non_empty(document, element, "loading").is_none() {
            document.set_attribute(element, "loading", "lazy");
        }

        // Must precede the source writes: they may fire `load`
        self.is_loaded.set(true);

        // Candidates first; the host re-selects only when src changes
        if self.is_picture {
            self.swap_candidates(document, &data_srcset);
        }

        document.set_attribute(element, "src", &src);
        if let Some(srcset) = srcset {
            document.set_attribute(element, "srcset", &srcset);
        }

        tracing::debug!("Swapped sources of {}", element);
    }

    fn swap_candidates(&self, document: &mut Document, data_srcset: &str) {
        let Some(picture) = document.parent(self.element) else {
            return;
        };

        for candidate in document.query_selector_all(picture, "source") {
            let Some(srcset) = non_empty(document, candidate, data_srcset) else {
                self.reporter.emit(LazyLoadingError::MissingSourceData { candidate });
                continue;
            };

            document.set_attribute(candidate, "srcset", &srcset);
            document.remove_attribute(candidate, data_srcset);
        }
    }

    /// Native load completion
    fn on_image_load(&self, document: &mut Document) {
        // Completion of the placeholder, not of the deferred source
        if !self.is_loaded.get() {
            return;
        }

        document.add_class(self.element, &self.settings.class.lazy_loaded);
        document.dispatch_event(Event::new(self.settings.event.loaded.as_str(), self.element));
        tracing::trace!("Image {} finished loading", self.element);
    }
}

impl Watchable for DeferredImage {
    fn element(&self) -> NodeId {
        self.element
    }

    fn on_loading(&self, document: &mut Document) {
        self.swap_sources(document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyload_dom::PlatformFeatures;
    use std::cell::RefCell;

    struct Fixture {
        doc: Document,
        tracker: VisibilityTracker,
        settings: Rc<LazyLoadingSettings>,
        errors: Rc<RefCell<Vec<LazyLoadingError>>>,
    }

    fn fixture(features: PlatformFeatures) -> Fixture {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&errors);
        let settings = Rc::new(
            LazyLoadingSettings::default().with_error_callback(move |e| sink.borrow_mut().push(e.clone())),
        );
        Fixture {
            doc: Document::default().with_features(features),
            tracker: VisibilityTracker::new(features, &settings),
            settings,
            errors,
        }
    }

    fn img(doc: &mut Document, parent: NodeId, attrs: &[(&str, &str)]) -> NodeId {
        let node = doc.create_element("img");
        doc.append_child(parent, node);
        for (name, value) in attrs {
            doc.set_attribute(node, name, value);
        }
        node
    }

    #[test]
    fn test_native_swaps_on_attach() {
        let mut f = fixture(PlatformFeatures::modern());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "a.jpg"), ("data-srcset", "a.jpg 1x, a@2x.jpg 2x")]);

        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));
        assert!(image.is_loaded());
        assert!(!image.is_picture());
        assert_eq!(f.doc.get_attribute(node, "src"), Some("a.jpg"));
        assert_eq!(f.doc.get_attribute(node, "srcset"), Some("a.jpg 1x, a@2x.jpg 2x"));
        assert_eq!(f.doc.get_attribute(node, "loading"), Some("lazy"));
        assert!(!f.doc.has_attribute(node, "data-src"));
        assert!(!f.doc.has_attribute(node, "data-srcset"));
    }

    #[test]
    fn test_native_keeps_explicit_loading_mode() {
        let mut f = fixture(PlatformFeatures::modern());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "a.jpg"), ("loading", "eager")]);

        DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));
        assert_eq!(f.doc.get_attribute(node, "loading"), Some("eager"));
    }

    #[test]
    fn test_unsupported_swaps_without_loading_hint() {
        let mut f = fixture(PlatformFeatures::legacy());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "a.jpg")]);

        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));
        assert!(image.is_loaded());
        assert_eq!(f.doc.get_attribute(node, "src"), Some("a.jpg"));
        assert!(!f.doc.has_attribute(node, "loading"));
        assert_eq!(*f.errors.borrow(), vec![LazyLoadingError::TrackingUnsupported]);
    }

    #[test]
    fn test_missing_data_touches_nothing() {
        let mut f = fixture(PlatformFeatures::modern());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-srcset", "a.jpg 2x")]);
        f.doc.observe_mutations(true);

        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));
        assert!(!image.is_loaded());
        assert!(f.doc.take_mutation_records().is_empty());
        assert_eq!(
            *f.errors.borrow(),
            vec![LazyLoadingError::MissingData { element: node }]
        );
    }

    #[test]
    fn test_empty_data_src_counts_as_missing() {
        let mut f = fixture(PlatformFeatures::modern());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "")]);

        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));
        assert!(!image.is_loaded());
        assert!(f.doc.has_attribute(node, "data-src"));
        assert_eq!(f.errors.borrow().len(), 1);
    }

    #[test]
    fn test_load_before_swap_is_ignored() {
        let mut f = fixture(PlatformFeatures::observer_only());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "a.jpg"), ("class", "lazy-loading")]);
        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));

        let finished = Rc::new(Cell::new(0));
        let counter = Rc::clone(&finished);
        f.doc.add_event_listener(node, &f.settings.event.loaded, move |_, _| {
            counter.set(counter.get() + 1);
        });

        f.doc.dispatch_event(Event::new(event_names::LOAD, node));
        assert!(!image.is_loaded());
        assert!(!f.doc.has_class(node, "lazy-loading--loaded"));
        assert_eq!(finished.get(), 0);
    }

    #[test]
    fn test_repeated_loading_signal_swaps_once() {
        let mut f = fixture(PlatformFeatures::observer_only());
        let body = f.doc.body().unwrap();
        let node = img(&mut f.doc, body, &[("data-src", "a.jpg")]);
        let image = DeferredImage::attach(&mut f.doc, node, &f.tracker, Rc::clone(&f.settings));

        f.doc.observe_mutations(true);
        f.doc.dispatch_event(Event::new(f.settings.event.loading.as_str(), node));
        f.doc.dispatch_event(Event::new(f.settings.event.loading.as_str(), node));

        assert!(image.is_loaded());
        let src_writes = f
            .doc
            .take_mutation_records()
            .iter()
            .filter(|r| r.is_set("src"))
            .count();
        assert_eq!(src_writes, 1);
        assert!(f.errors.borrow().is_empty());
    }

    #[test]
    fn test_picture_detection() {
        let mut f = fixture(PlatformFeatures::observer_only());
        let body = f.doc.body().unwrap();
        let picture = f.doc.create_element("picture");
        f.doc.append_child(body, picture);
        let inside = img(&mut f.doc, picture, &[("data-src", "a.jpg")]);
        let outside = img(&mut f.doc, body, &[("data-src", "b.jpg")]);

        assert!(DeferredImage::attach(&mut f.doc, inside, &f.tracker, Rc::clone(&f.settings)).is_picture());
        assert!(!DeferredImage::attach(&mut f.doc, outside, &f.tracker, Rc::clone(&f.settings)).is_picture());
    }
}
