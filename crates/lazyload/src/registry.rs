//! Registration
//!
//! Finds markup carrying a registered marker class and constructs one
//! `DeferredImage` per node.

use std::collections::HashSet;
use std::rc::{Rc, Weak};

use lazyload_dom::{Document, NodeId};

use crate::image::DeferredImage;
use crate::settings::LazyLoadingSettings;
use crate::tracker::VisibilityTracker;

#[derive(Debug)]
struct Registration {
    marker_class: String,
    settings: Rc<LazyLoadingSettings>,
}

/// Marker-class registry and discovery sweep
#[derive(Debug)]
pub struct LazyRegistry {
    tracker: Rc<VisibilityTracker>,
    registrations: Vec<Registration>,
    upgraded: HashSet<NodeId>,
    instances: Vec<Weak<DeferredImage>>,
}

impl LazyRegistry {
    /// Registry with the configured marker class registered
    pub fn new(tracker: Rc<VisibilityTracker>, settings: Rc<LazyLoadingSettings>) -> Self {
        let registration = Registration {
            marker_class: settings.class.lazy.clone(),
            settings,
        };
        Self {
            tracker,
            registrations: vec![registration],
            upgraded: HashSet::new(),
            instances: Vec::new(),
        }
    }

    /// Register another marker class; its images finish with `lazy_loaded`.
    ///
    /// Earlier marker classes stay registered.
    pub fn set_class(&mut self, lazy: &str, lazy_loaded: &str) {
        let settings = Rc::new(self.registrations[0].settings.with_classes(lazy, lazy_loaded));
        if let Some(existing) = self.registrations.iter_mut().find(|r| r.marker_class == lazy) {
            existing.settings = settings;
        } else {
            self.registrations.push(Registration {
                marker_class: lazy.to_string(),
                settings,
            });
        }
        tracing::debug!("Registered marker class {:?}", lazy);
    }

    pub fn registered_classes(&self) -> Vec<&str> {
        self.registrations
            .iter()
            .map(|r| r.marker_class.as_str())
            .collect()
    }

    /// Construct images for matching nodes not seen before, in tree order.
    /// Returns how many were constructed.
    pub fn upgrade(&mut self, document: &mut Document) -> usize {
        let pending: Vec<(NodeId, Rc<LazyLoadingSettings>)> = document
            .tree()
            .descendants(NodeId::ROOT)
            .into_iter()
            .filter(|node| !self.upgraded.contains(node))
            .filter_map(|node| {
                let classes = document.class_list(node);
                self.registrations
                    .iter()
                    .find(|r| classes.contains(&r.marker_class))
                    .map(|r| (node, Rc::clone(&r.settings)))
            })
            .collect();

        let count = pending.len();
        for (node, settings) in pending {
            self.upgraded.insert(node);
            let image = DeferredImage::attach(document, node, &self.tracker, settings);
            self.instances.push(Rc::downgrade(&image));
        }

        if count > 0 {
            tracing::debug!("Upgraded {} deferred images", count);
        }
        count
    }

    pub fn is_upgraded(&self, node: NodeId) -> bool {
        self.upgraded.contains(&node)
    }

    /// Images whose elements still hold their listeners
    pub fn instances(&mut self) -> Vec<Rc<DeferredImage>> {
        self.instances.retain(|weak| weak.strong_count() > 0);
        self.instances.iter().filter_map(Weak::upgrade).collect()
    }

    pub fn tracker(&self) -> &Rc<VisibilityTracker> {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyload_dom::PlatformFeatures;

    fn registry(features: PlatformFeatures) -> LazyRegistry {
        let settings = Rc::new(LazyLoadingSettings::default());
        let tracker = VisibilityTracker::shared(features, &settings);
        LazyRegistry::new(tracker, settings)
    }

    fn lazy_img(doc: &mut Document, class: &str, src: &str) -> NodeId {
        let node = doc.create_element("img");
        doc.append_child(doc.body().unwrap(), node);
        doc.set_attribute(node, "class", class);
        doc.set_attribute(node, "data-src", src);
        node
    }

    #[test]
    fn test_upgrade_once_per_node() {
        let mut registry = registry(PlatformFeatures::observer_only());
        let mut doc = Document::default();
        let a = lazy_img(&mut doc, "lazy-loading", "a.jpg");
        let plain = lazy_img(&mut doc, "hero", "b.jpg");

        assert_eq!(registry.upgrade(&mut doc), 1);
        assert_eq!(registry.upgrade(&mut doc), 0);
        assert!(registry.is_upgraded(a));
        assert!(!registry.is_upgraded(plain));
        assert_eq!(registry.tracker().watched_count(), 1);
    }

    #[test]
    fn test_set_class_keeps_old_marker() {
        let mut registry = registry(PlatformFeatures::modern());
        let mut doc = Document::default();
        let old = lazy_img(&mut doc, "lazy-loading", "a.jpg");
        let new = lazy_img(&mut doc, "lazy", "b.jpg");

        registry.set_class("lazy", "lazy--loaded");
        assert_eq!(registry.registered_classes(), vec!["lazy-loading", "lazy"]);
        assert_eq!(registry.upgrade(&mut doc), 2);
        assert_eq!(doc.get_attribute(old, "src"), Some("a.jpg"));
        assert_eq!(doc.get_attribute(new, "src"), Some("b.jpg"));
    }

    #[test]
    fn test_detached_nodes_are_not_upgraded() {
        let mut registry = registry(PlatformFeatures::observer_only());
        let mut doc = Document::default();
        let node = lazy_img(&mut doc, "lazy-loading", "a.jpg");
        doc.remove_node(node);

        assert_eq!(registry.upgrade(&mut doc), 0);
    }

    #[test]
    fn test_instances_follow_node_lifetime() {
        let mut registry = registry(PlatformFeatures::observer_only());
        let mut doc = Document::default();
        let a = lazy_img(&mut doc, "lazy-loading", "a.jpg");
        lazy_img(&mut doc, "lazy-loading", "b.jpg");
        registry.upgrade(&mut doc);
        assert_eq!(registry.instances().len(), 2);

        doc.remove_node(a);
        let live = registry.instances();
        assert_eq!(live.len(), 1);
        assert_ne!(live[0].element(), a);
    }
}
