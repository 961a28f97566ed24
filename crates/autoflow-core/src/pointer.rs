use serde::{Deserialize, Serialize};

use crate::layout::Point;

/// Live pointer samples for the active drag session.
///
/// Every accepted sample overwrites the current position; nothing is
/// coalesced. Samples arriving while no gesture is tracked are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerTracker {
    origin: Option<Point>,
    current: Option<Point>,
    last_resolved: Option<Point>,
}

impl PointerTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            origin: None,
            current: None,
            last_resolved: None,
        }
    }

    /// Start tracking a gesture at `origin`.
    pub fn begin(&mut self, origin: Point) {
        *self = Self {
            origin: Some(origin),
            current: Some(origin),
            last_resolved: Some(origin),
        };
    }

    /// Record a pointer sample. Returns `false` when no gesture is tracked.
    pub fn update(&mut self, position: Point) -> bool {
        if self.current.is_none() {
            return false;
        }
        self.current = Some(position);
        true
    }

    /// Whether the pointer has moved at least `min_distance` since the last
    /// resolution pass.
    #[must_use]
    pub fn needs_resolution(&self, min_distance: f64) -> bool {
        match (self.current, self.last_resolved) {
            (Some(current), Some(last)) => current.distance_to(last) >= min_distance,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Remember that the current position has been resolved.
    pub const fn mark_resolved(&mut self) {
        self.last_resolved = self.current;
    }

    #[must_use]
    pub const fn position(&self) -> Option<Point> {
        self.current
    }

    /// Offset of the current position from the gesture origin, used to place
    /// the floating preview.
    #[must_use]
    pub fn offset(&self) -> Option<(f64, f64)> {
        match (self.origin, self.current) {
            (Some(origin), Some(current)) => Some((current.x - origin.x, current.y - origin.y)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updates_are_ignored_while_inactive() {
        let mut tracker = PointerTracker::new();
        assert!(!tracker.update(Point::new(5.0, 5.0)));
        assert_eq!(tracker.position(), None);
        assert_eq!(tracker.offset(), None);
    }

    #[test]
    fn every_update_replaces_position() {
        let mut tracker = PointerTracker::new();
        tracker.begin(Point::new(0.0, 0.0));
        assert!(tracker.update(Point::new(3.0, 4.0)));
        assert!(tracker.update(Point::new(3.0, 10.0)));
        assert_eq!(tracker.position(), Some(Point::new(3.0, 10.0)));
        assert_eq!(tracker.offset(), Some((3.0, 10.0)));
    }

    #[test]
    fn resolution_threshold_uses_last_resolved_point() {
        let mut tracker = PointerTracker::new();
        tracker.begin(Point::new(0.0, 0.0));
        tracker.update(Point::new(1.0, 0.0));
        assert!(!tracker.needs_resolution(2.0));
        assert!(tracker.needs_resolution(0.0));
        tracker.update(Point::new(2.5, 0.0));
        assert!(tracker.needs_resolution(2.0));
        tracker.mark_resolved();
        assert!(!tracker.needs_resolution(2.0));
    }

    #[test]
    fn begin_restarts_from_new_origin() {
        let mut tracker = PointerTracker::new();
        tracker.begin(Point::new(1.0, 1.0));
        tracker.update(Point::new(9.0, 9.0));
        tracker.begin(Point::new(2.0, 2.0));
        assert_eq!(tracker.position(), Some(Point::new(2.0, 2.0)));
        assert_eq!(tracker.offset(), Some((0.0, 0.0)));
        assert!(!tracker.needs_resolution(0.5));
    }
}
