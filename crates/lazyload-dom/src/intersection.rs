//! Intersection Observer API
//!
//! Observe element intersection with the (margin-grown) viewport.

use std::collections::HashMap;
use std::str::FromStr;

use crate::{DOMRect, NodeId};

/// One side of a root margin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    Px(f64),
    Percent(f64),
}

impl MarginLength {
    /// Resolve against the root's extent along the same axis
    pub fn resolve(&self, extent: f64) -> f64 {
        match *self {
            MarginLength::Px(v) => v,
            MarginLength::Percent(p) => extent * p / 100.0,
        }
    }
}

impl FromStr for MarginLength {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = |raw: &str| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| RootMarginError::InvalidLength(s.to_string()))
        };

        if let Some(raw) = s.strip_suffix("px") {
            Ok(MarginLength::Px(number(raw)?))
        } else if let Some(raw) = s.strip_suffix('%') {
            Ok(MarginLength::Percent(number(raw)?))
        } else if s == "0" {
            Ok(MarginLength::Px(0.0))
        } else {
            Err(RootMarginError::InvalidLength(s.to_string()))
        }
    }
}

/// Root margin errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RootMarginError {
    #[error("root margin is empty")]
    Empty,

    #[error("root margin takes 1 to 4 lengths, got {0}")]
    TooManyValues(usize),

    #[error("invalid root margin length: {0:?}")]
    InvalidLength(String),
}

/// CSS-margin-like shorthand: `top right bottom left`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl RootMargin {
    pub const ZERO: RootMargin = RootMargin {
        top: MarginLength::Px(0.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Px(0.0),
        left: MarginLength::Px(0.0),
    };

    /// Parse shorthand with one to four lengths
    pub fn parse(s: &str) -> Result<Self, RootMarginError> {
        let values = s
            .split_whitespace()
            .map(MarginLength::from_str)
            .collect::<Result<Vec<_>, _>>()?;

        let (top, right, bottom, left) = match values.as_slice() {
            [] => return Err(RootMarginError::Empty),
            [all] => (*all, *all, *all, *all),
            [v, h] => (*v, *h, *v, *h),
            [t, h, b] => (*t, *h, *b, *h),
            [t, r, b, l] => (*t, *r, *b, *l),
            more => return Err(RootMarginError::TooManyValues(more.len())),
        };
        Ok(Self { top, right, bottom, left })
    }

    /// Root rectangle grown by this margin
    pub fn apply(&self, root: &DOMRect) -> DOMRect {
        root.expand(
            self.top.resolve(root.height),
            self.right.resolve(root.width),
            self.bottom.resolve(root.height),
            self.left.resolve(root.width),
        )
    }
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for RootMargin {
    type Err = RootMarginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Intersection observer options
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionObserverOptions {
    /// Root element (None = viewport)
    pub root: Option<NodeId>,
    /// Root margin
    pub root_margin: RootMargin,
    /// Thresholds to trigger callback, ascending
    pub threshold: Vec<f64>,
}

impl Default for IntersectionObserverOptions {
    fn default() -> Self {
        Self {
            root: None,
            root_margin: RootMargin::ZERO,
            threshold: vec![0.0],
        }
    }
}

/// Intersection observer entry
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionObserverEntry {
    pub target: NodeId,
    pub bounding_client_rect: DOMRect,
    pub intersection_rect: DOMRect,
    pub root_bounds: DOMRect,
    pub intersection_ratio: f64,
    pub is_intersecting: bool,
    pub time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LastReport {
    threshold_index: usize,
    is_intersecting: bool,
}

/// Intersection observer
///
/// Targets are kept in observation order, which is also report order.
#[derive(Debug)]
pub struct IntersectionObserver {
    options: IntersectionObserverOptions,
    observed: Vec<(NodeId, Option<LastReport>)>,
    pending_entries: Vec<IntersectionObserverEntry>,
}

impl IntersectionObserver {
    pub fn new(mut options: IntersectionObserverOptions) -> Self {
        options.threshold.retain(|t| (0.0..=1.0).contains(t));
        if options.threshold.is_empty() {
            options.threshold.push(0.0);
        }
        options.threshold.sort_by(f64::total_cmp);
        Self {
            options,
            observed: Vec::new(),
            pending_entries: Vec::new(),
        }
    }

    pub fn options(&self) -> &IntersectionObserverOptions {
        &self.options
    }

    /// Observe an element. Observing twice is a no-op.
    pub fn observe(&mut self, target: NodeId) {
        if !self.is_observing(target) {
            self.observed.push((target, None));
        }
    }

    /// Stop observing
    pub fn unobserve(&mut self, target: NodeId) {
        self.observed.retain(|(node, _)| *node != target);
        self.pending_entries.retain(|e| e.target != target);
    }

    /// Disconnect all
    pub fn disconnect(&mut self) {
        self.observed.clear();
        self.pending_entries.clear();
    }

    /// Keep only targets for which `keep` holds; returns how many were dropped
    pub fn retain_targets(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let before = self.observed.len();
        self.observed.retain(|(node, _)| keep(*node));
        let observed = &self.observed;
        self.pending_entries
            .retain(|e| observed.iter().any(|(node, _)| *node == e.target));
        before - self.observed.len()
    }

    pub fn is_observing(&self, target: NodeId) -> bool {
        self.observed.iter().any(|(node, _)| *node == target)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    /// Check intersections against the current layout.
    ///
    /// Targets without a layout rectangle are skipped. A target is reported
    /// on its first check and afterwards only when its intersecting state
    /// or threshold bucket changes.
    pub fn check_intersections(
        &mut self,
        viewport: DOMRect,
        element_rects: &HashMap<NodeId, DOMRect>,
        time: f64,
    ) {
        let root_bounds = self.options.root_margin.apply(&viewport);

        for (node, last) in self.observed.iter_mut() {
            let node = *node;
            let Some(rect) = element_rects.get(&node) else {
                continue;
            };

            let intersection = rect.intersection(&root_bounds);
            let is_intersecting = intersection.is_some();
            let ratio = match intersection {
                Some(hit) if rect.area() > 0.0 => hit.area() / rect.area(),
                Some(_) => 1.0,
                None => 0.0,
            };
            let threshold_index = if is_intersecting {
                self.options.threshold.iter().filter(|&&t| ratio >= t).count()
            } else {
                0
            };

            let report = LastReport {
                threshold_index,
                is_intersecting,
            };
            if *last == Some(report) {
                continue;
            }
            *last = Some(report);

            self.pending_entries.push(IntersectionObserverEntry {
                target: node,
                bounding_client_rect: *rect,
                intersection_rect: intersection.unwrap_or_default(),
                root_bounds,
                intersection_ratio: ratio,
                is_intersecting,
                time,
            });
        }
    }

    /// Take pending entries
    pub fn take_entries(&mut self) -> Vec<IntersectionObserverEntry> {
        std::mem::take(&mut self.pending_entries)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending_entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> DOMRect {
        DOMRect::from_xywh(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn test_root_margin_shorthand() {
        let margin = RootMargin::parse("500px 0px").unwrap();
        assert_eq!(margin.top, MarginLength::Px(500.0));
        assert_eq!(margin.right, MarginLength::Px(0.0));
        assert_eq!(margin.bottom, MarginLength::Px(500.0));
        assert_eq!(margin.left, MarginLength::Px(0.0));

        let margin: RootMargin = "10% 5px 0 -20px".parse().unwrap();
        assert_eq!(margin.top, MarginLength::Percent(10.0));
        assert_eq!(margin.left, MarginLength::Px(-20.0));
    }

    #[test]
    fn test_root_margin_errors() {
        assert_eq!(RootMargin::parse("   "), Err(RootMarginError::Empty));
        assert_eq!(
            RootMargin::parse("1px 2px 3px 4px 5px"),
            Err(RootMarginError::TooManyValues(5))
        );
        assert_eq!(
            RootMargin::parse("500em"),
            Err(RootMarginError::InvalidLength("500em".to_string()))
        );
    }

    #[test]
    fn test_percent_margin_resolves_against_root() {
        let margin = RootMargin::parse("50%").unwrap();
        let grown = margin.apply(&viewport());
        assert_eq!(grown, DOMRect::from_xywh(-400.0, -300.0, 1600.0, 1200.0));
    }

    #[test]
    fn test_first_check_reports() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId(1);
        observer.observe(node);

        let mut rects = HashMap::new();
        rects.insert(node, DOMRect::from_xywh(100.0, 100.0, 200.0, 200.0));

        observer.check_intersections(viewport(), &rects, 0.0);
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].intersection_ratio, 1.0);

        // Unchanged state is not reported again
        observer.check_intersections(viewport(), &rects, 1.0);
        assert!(!observer.has_pending());
    }

    #[test]
    fn test_margin_brings_target_in_range() {
        let options = IntersectionObserverOptions {
            root_margin: RootMargin::parse("500px 0px").unwrap(),
            threshold: vec![0.01],
            ..Default::default()
        };
        let mut observer = IntersectionObserver::new(options);
        let near = NodeId(1);
        let far = NodeId(2);
        observer.observe(near);
        observer.observe(far);

        let mut rects = HashMap::new();
        rects.insert(near, DOMRect::from_xywh(0.0, 900.0, 100.0, 100.0));
        rects.insert(far, DOMRect::from_xywh(0.0, 1200.0, 100.0, 100.0));

        observer.check_intersections(viewport(), &rects, 0.0);
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].target, near);
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[1].target, far);
        assert!(!entries[1].is_intersecting);
    }

    #[test]
    fn test_retain_targets_drops_entries_too() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        observer.observe(NodeId(1));
        observer.observe(NodeId(2));

        let mut rects = HashMap::new();
        rects.insert(NodeId(1), DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0));
        rects.insert(NodeId(2), DOMRect::from_xywh(0.0, 20.0, 10.0, 10.0));
        observer.check_intersections(viewport(), &rects, 0.0);

        assert_eq!(observer.retain_targets(|node| node != NodeId(2)), 1);
        assert!(!observer.is_observing(NodeId(2)));
        let entries = observer.take_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, NodeId(1));
    }

    #[test]
    fn test_zero_area_target_on_edge() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId(4);
        observer.observe(node);

        let mut rects = HashMap::new();
        rects.insert(node, DOMRect::from_xywh(10.0, 600.0, 0.0, 0.0));

        observer.check_intersections(viewport(), &rects, 0.0);
        let entries = observer.take_entries();
        assert!(entries[0].is_intersecting);
        assert_eq!(entries[0].intersection_ratio, 1.0);
    }

    #[test]
    fn test_unobserve_drops_pending() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        let node = NodeId(1);
        observer.observe(node);
        observer.observe(node);
        assert_eq!(observer.observed_count(), 1);

        let mut rects = HashMap::new();
        rects.insert(node, DOMRect::from_xywh(0.0, 0.0, 10.0, 10.0));
        observer.check_intersections(viewport(), &rects, 0.0);
        assert!(observer.has_pending());

        observer.unobserve(node);
        assert!(!observer.has_pending());
        assert!(!observer.is_observing(node));
    }

    #[test]
    fn test_missing_layout_is_skipped() {
        let mut observer = IntersectionObserver::new(IntersectionObserverOptions::default());
        observer.observe(NodeId(9));
        observer.check_intersections(viewport(), &HashMap::new(), 0.0);
        assert!(!observer.has_pending());
    }
}
