//! Append-only log of annotation snapshots.
//!
//! Every edit pushes a complete [`ContourSet`]; undo drops the tail. Entries
//! are never modified after being pushed, so the entry below the tail is
//! always exactly the state before the last edit.

use crate::types::{Contour, ContourSet, Point};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    entries: Vec<ContourSet>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The current annotation state, `None` before the first edit
    pub fn current(&self) -> Option<&ContourSet> {
        self.entries.last()
    }

    /// Contours of the current state, empty when nothing was drawn yet
    pub fn current_contours(&self) -> &[Contour] {
        self.current().map(ContourSet::contours).unwrap_or(&[])
    }

    pub fn entries(&self) -> &[ContourSet] {
        &self.entries
    }

    /// Append a snapshot with `point` added to the active contour.
    pub fn add_point(&mut self, point: Point) {
        let next = match self.entries.last() {
            Some(last) => last.with_point(point),
            None => ContourSet::starting_at(point),
        };
        self.entries.push(next);
    }

    /// Close the active contour and move on to a new one.
    ///
    /// Returns `false` without touching the log when there is nothing drawn
    /// or the active contour has fewer than three points.
    pub fn advance_contour(&mut self) -> bool {
        let Some(last) = self.entries.last() else {
            return false;
        };
        if !last.active_contour().is_some_and(Contour::is_valid) {
            return false;
        }
        let next = last.advanced();
        self.entries.push(next);
        true
    }

    /// Append an externally built state, e.g. imported annotations.
    pub fn push(&mut self, state: ContourSet) {
        self.entries.push(state);
    }

    /// Drop the most recent snapshot. Returns `false` on an empty log.
    pub fn undo(&mut self) -> bool {
        self.entries.pop().is_some()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: u32, y: u32) -> Point {
        Point::new(x, y)
    }

    fn triangle(log: &mut HistoryLog) {
        log.add_point(p(0, 0));
        log.add_point(p(3, 0));
        log.add_point(p(3, 3));
    }

    #[test]
    fn test_empty_log() {
        let mut log = HistoryLog::new();
        assert!(log.current_contours().is_empty());
        assert!(!log.undo());
        assert!(!log.advance_contour());
        assert_eq!(log.len(), 0);
    }

    #[test]
    fn test_first_point_creates_contour() {
        let mut log = HistoryLog::new();
        log.add_point(p(4, 2));
        let state = log.current().expect("Should have a state");
        assert_eq!(state.active_index(), 0);
        assert_eq!(state.contours().len(), 1);
        assert_eq!(state.contours()[0].points(), &[p(4, 2)]);
    }

    #[test]
    fn test_every_edit_appends_exactly_one_entry() {
        let mut log = HistoryLog::new();
        for i in 0..5 {
            log.add_point(p(i, i));
            assert_eq!(log.len(), i as usize + 1);
        }
        assert!(log.advance_contour());
        assert_eq!(log.len(), 6);
        assert!(log.undo());
        assert_eq!(log.len(), 5);
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut log = HistoryLog::new();
        triangle(&mut log);
        let before = log.current().cloned();
        log.add_point(p(0, 3));
        assert_ne!(log.current().cloned(), before);
        log.undo();
        assert_eq!(log.current().cloned(), before);
    }

    #[test]
    fn test_earlier_entries_stay_frozen() {
        let mut log = HistoryLog::new();
        triangle(&mut log);
        let frozen: Vec<usize> = log.entries().iter().map(|e| e.contours()[0].len()).collect();
        log.add_point(p(1, 1));
        log.advance_contour();
        log.add_point(p(9, 9));
        let after: Vec<usize> = log.entries()[..3]
            .iter()
            .map(|e| e.contours()[0].len())
            .collect();
        assert_eq!(frozen, after);
        assert_eq!(frozen, vec![1, 2, 3]);
    }

    #[test]
    fn test_advance_requires_three_points() {
        let mut log = HistoryLog::new();
        log.add_point(p(0, 0));
        log.add_point(p(1, 0));
        assert!(!log.advance_contour());
        assert_eq!(log.len(), 2);

        log.add_point(p(1, 1));
        assert!(log.advance_contour());
        // The fresh contour is empty, so a second advance is refused.
        assert!(!log.advance_contour());
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_points_after_advance_start_second_contour() {
        let mut log = HistoryLog::new();
        triangle(&mut log);
        assert!(log.advance_contour());

        let state = log.current().unwrap();
        assert_eq!(log.len(), 4);
        assert_eq!(state.active_index(), 1);
        assert_eq!(state.contours().len(), 2);
        assert!(state.contours()[1].is_empty());

        log.add_point(p(5, 5));
        log.add_point(p(6, 5));
        let contours = log.current_contours();
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 3);
        assert_eq!(contours[1].points(), &[p(5, 5), p(6, 5)]);
    }

    #[test]
    fn test_undo_walks_back_to_first_point() {
        let mut log = HistoryLog::new();
        triangle(&mut log);
        log.advance_contour();
        for _ in 0..3 {
            assert!(log.undo());
        }
        assert_eq!(log.len(), 1);
        assert_eq!(log.current_contours().len(), 1);
        assert_eq!(log.current_contours()[0].points(), &[p(0, 0)]);

        assert!(log.undo());
        assert!(!log.undo());
        assert!(log.current_contours().is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut log = HistoryLog::new();
        triangle(&mut log);
        log.reset();
        assert!(log.is_empty());
        assert!(log.current().is_none());
    }
}
