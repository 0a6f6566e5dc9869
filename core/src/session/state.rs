use crate::ballistics::{
    axis_label, format_adjustment, format_distance, Axis, DistanceOptions, DISTANCE_EPSILON,
};
use crate::catalog::Caliber;
use crate::prelude::{Point, PointId};
use crate::session::events::SessionEvent;
use crate::session::history::{render_row, HistoryEntry};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 64;
const NO_CALIBRATION: &str = "—";

/// Starting parameters for a [`Session`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub distances: DistanceOptions,
    /// Initial distance; the first option when unset.
    pub distance_m: Option<f64>,
    pub caliber: Caliber,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            distances: DistanceOptions::default(),
            distance_m: None,
            caliber: Caliber::default(),
        }
    }
}

/// Which impacts a target overlay should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisibilityFilter {
    #[default]
    All,
    LatestOnly,
    /// Everything up to and including the selected impact.
    UntilSelection,
}

/// Shot bookkeeping for one training session.
///
/// Points are append-only until [`Session::reset`]. Once the first point
/// lands the distance and caliber are locked so every correction in the
/// session is computed against the same setup.
#[derive(Debug)]
pub struct Session {
    points: Vec<Point>,
    selected_point_id: Option<PointId>,
    distance_m: f64,
    distances: DistanceOptions,
    caliber: Caliber,
    next_point_id: PointId,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(settings: SessionSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let distance_m = settings
            .distance_m
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or_else(|| settings.distances.initial());
        Self {
            points: Vec::new(),
            selected_point_id: None,
            distance_m,
            distances: settings.distances,
            caliber: settings.caliber,
            next_point_id: 1,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<SessionEvent> {
        self.events.clone()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn selected_point_id(&self) -> Option<PointId> {
        self.selected_point_id
    }

    pub fn selected_point(&self) -> Option<&Point> {
        self.selected_point_id.and_then(|id| self.point(id))
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    pub fn distances(&self) -> &DistanceOptions {
        &self.distances
    }

    pub fn caliber(&self) -> Caliber {
        self.caliber
    }

    /// True while the session holds any impact.
    pub fn controls_locked(&self) -> bool {
        !self.points.is_empty()
    }

    /// Radius assigned to points created from now on.
    pub fn current_radius_mm(&self) -> f64 {
        self.caliber.radius_mm()
    }

    /// Appends `point` and selects it. A point whose id is already present is
    /// dropped.
    pub fn add_point(&mut self, point: Point) {
        if self.point(point.id).is_some() {
            warn!("ignoring duplicate point id {}", point.id);
            return;
        }
        let was_locked = self.controls_locked();
        let id = point.id;
        self.next_point_id = self.next_point_id.max(id.saturating_add(1));
        self.points.push(point);
        self.selected_point_id = Some(id);

        self.emit(SessionEvent::PointAdded(id));
        self.emit(SessionEvent::SelectionChanged(Some(id)));
        if !was_locked {
            info!("session started, distance {} / {}", self.distance_label(), self.caliber);
            self.emit(SessionEvent::LockChanged(true));
        }
    }

    /// Creates a locally numbered impact at the given offset and adds it.
    pub fn record_shot(&mut self, x_mm: f64, y_mm: f64) -> Point {
        let point = Point::new(self.next_point_id, x_mm, y_mm, self.current_radius_mm());
        self.add_point(point.clone());
        point
    }

    /// Swaps the whole point list, selecting the newest entry.
    pub fn replace_points(&mut self, points: Vec<Point>) {
        let was_locked = self.controls_locked();
        let mut unique: Vec<Point> = Vec::with_capacity(points.len());
        for point in points {
            if unique.iter().any(|p| p.id == point.id) {
                warn!("ignoring duplicate point id {}", point.id);
                continue;
            }
            unique.push(point);
        }
        self.next_point_id = unique
            .iter()
            .map(|p| p.id.saturating_add(1))
            .max()
            .unwrap_or(1);
        self.points = unique;
        self.selected_point_id = self.points.last().map(|p| p.id);

        self.emit(SessionEvent::PointsReplaced(self.points.len()));
        self.emit(SessionEvent::SelectionChanged(self.selected_point_id));
        if was_locked != self.controls_locked() {
            self.emit(SessionEvent::LockChanged(self.controls_locked()));
        }
    }

    /// Highlights the point with `id`; returns whether it exists.
    pub fn select_point(&mut self, id: PointId) -> bool {
        if self.point(id).is_none() {
            debug!("select ignored, no point {id}");
            return false;
        }
        if self.selected_point_id != Some(id) {
            self.selected_point_id = Some(id);
            self.emit(SessionEvent::SelectionChanged(Some(id)));
        }
        true
    }

    /// Changes the firing distance. Rejected while locked, for non-positive
    /// or non-finite values, and for values within [`DISTANCE_EPSILON`] of
    /// the current one.
    pub fn set_distance(&mut self, distance_m: f64) -> bool {
        if self.controls_locked() {
            debug!("distance change rejected, session is locked");
            return false;
        }
        if !distance_m.is_finite() || distance_m <= 0.0 {
            debug!("distance change rejected, invalid value {distance_m}");
            return false;
        }
        if (self.distance_m - distance_m).abs() < DISTANCE_EPSILON {
            return false;
        }
        self.distance_m = distance_m;
        self.emit(SessionEvent::DistanceChanged(distance_m));
        true
    }

    /// Changes the distance by one of the option labels, e.g. `"100 m"`.
    pub fn select_distance_label(&mut self, label: &str) -> bool {
        if label.is_empty() || self.controls_locked() {
            return false;
        }
        match self.distances.value_for_label(label) {
            Some(value) => self.set_distance(value),
            None => false,
        }
    }

    /// Changes the caliber by catalog name. Affects only points created later.
    pub fn set_caliber(&mut self, name: &str) -> bool {
        match name.parse::<Caliber>() {
            Ok(caliber) => self.set_caliber_id(caliber),
            Err(err) => {
                debug!("caliber change rejected: {err}");
                false
            }
        }
    }

    pub fn set_caliber_id(&mut self, caliber: Caliber) -> bool {
        if self.controls_locked() {
            debug!("caliber change rejected, session is locked");
            return false;
        }
        self.caliber = caliber;
        self.emit(SessionEvent::CaliberChanged(caliber));
        true
    }

    /// Ends the session: drops every point, clears the selection, unlocks the
    /// controls and restarts local numbering at 1.
    pub fn reset(&mut self) {
        let count = self.points.len();
        let was_locked = self.controls_locked();
        self.points.clear();
        self.selected_point_id = None;
        self.next_point_id = 1;
        info!("session finished after {count} shots");
        self.emit(SessionEvent::Reset);
        if was_locked {
            self.emit(SessionEvent::LockChanged(false));
        }
    }

    /// Newest-first history rows at the current distance.
    pub fn history_entries(&self) -> Vec<HistoryEntry> {
        self.points
            .iter()
            .rev()
            .map(|point| HistoryEntry {
                point_id: point.id,
                text: render_row(point, self.distance_m),
                selected: self.selected_point_id == Some(point.id),
            })
            .collect()
    }

    pub fn distance_label(&self) -> String {
        format_distance(self.distance_m)
    }

    /// Correction for the selected impact, `"—"` when nothing is selected.
    pub fn calibration_text(&self) -> String {
        match self.selected_point() {
            Some(point) => format_adjustment(point, self.distance_m),
            None => NO_CALIBRATION.to_string(),
        }
    }

    pub fn calibration_distance_text(&self) -> String {
        self.distance_label()
    }

    pub fn axis_label(&self, axis: Axis) -> String {
        axis_label(self.selected_point(), axis, self.distance_m)
    }

    pub fn caliber_display_text(&self) -> &'static str {
        self.caliber.name()
    }

    pub fn visible_points(&self, filter: VisibilityFilter) -> &[Point] {
        match filter {
            VisibilityFilter::All => &self.points,
            VisibilityFilter::LatestOnly => {
                let start = self.points.len().saturating_sub(1);
                &self.points[start..]
            }
            VisibilityFilter::UntilSelection => {
                let end = self
                    .selected_point_id
                    .and_then(|id| self.points.iter().position(|p| p.id == id))
                    .map(|idx| idx + 1)
                    .unwrap_or(self.points.len());
                &self.points[..end]
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_at(distance_m: f64) -> Session {
        Session::new(SessionSettings {
            distance_m: Some(distance_m),
            ..Default::default()
        })
    }

    #[test]
    fn new_session_is_empty_and_unlocked() {
        let session = Session::default();
        assert!(session.points().is_empty());
        assert!(!session.controls_locked());
        assert_eq!(session.selected_point_id(), None);
        assert_eq!(session.distance_m(), 25.0);
        assert_eq!(session.calibration_text(), "—");
        assert_eq!(session.calibration_distance_text(), "25 m");
        assert_eq!(session.caliber_display_text(), ".22 LR");
    }

    #[test]
    fn history_is_newest_first_and_flags_selection() {
        let mut session = session_at(100.0);
        session.record_shot(10.0, 10.0);
        session.record_shot(-5.0, 3.0);
        session.record_shot(26.64, 0.0);

        let ids: Vec<_> = session.history_entries().iter().map(|e| e.point_id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        let entries = session.history_entries();
        assert!(entries[0].selected);
        assert!(!entries[1].selected);

        assert!(session.select_point(1));
        let entries = session.history_entries();
        assert!(entries[2].selected);
        assert!(!entries[0].selected);
    }

    #[test]
    fn selecting_unknown_point_is_a_noop() {
        let mut session = Session::default();
        session.record_shot(1.0, 1.0);
        assert!(!session.select_point(99));
        assert_eq!(session.selected_point_id(), Some(1));
    }

    #[test]
    fn first_point_locks_distance_and_caliber_until_reset() {
        let mut session = Session::default();
        assert!(session.set_distance(100.0));
        assert!(session.set_caliber(".308 Win"));

        session.record_shot(0.0, 0.0);
        assert!(session.controls_locked());
        assert!(!session.set_distance(200.0));
        assert!(!session.set_caliber("9x39"));
        assert!(!session.select_distance_label("300 m"));
        assert_eq!(session.distance_m(), 100.0);
        assert_eq!(session.caliber(), Caliber::Win308);

        session.reset();
        assert!(!session.controls_locked());
        assert!(session.set_distance(200.0));
        assert!(session.set_caliber("9x39"));
    }

    #[test]
    fn distance_rejects_non_positive_and_near_equal_values() {
        let mut session = session_at(100.0);
        assert!(!session.set_distance(0.0));
        assert!(!session.set_distance(-25.0));
        assert!(!session.set_distance(f64::NAN));
        assert!(!session.set_distance(f64::INFINITY));
        assert_eq!(session.distance_label(), "100 m");
        assert!(!session.set_distance(100.0005));
        assert!(session.set_distance(100.002));
        assert!(session.select_distance_label("300 m"));
        assert_eq!(session.distance_m(), 300.0);
        assert!(!session.select_distance_label("150 m"));
    }

    #[test]
    fn infinite_initial_distance_falls_back_to_first_option() {
        let session = session_at(f64::INFINITY);
        assert_eq!(session.distance_m(), 25.0);
    }

    #[test]
    fn unknown_caliber_is_rejected() {
        let mut session = Session::default();
        assert!(!session.set_caliber(".45 ACP"));
        assert!(!session.set_caliber(" .308 Win "));
        assert_eq!(session.caliber(), Caliber::Lr22);
    }

    #[test]
    fn caliber_change_affects_only_new_points() {
        let mut session = Session::default();
        assert!(session.set_caliber(".50 BMG"));
        let first = session.record_shot(0.0, 0.0);
        assert_eq!(first.radius_mm, 6.49);
        session.reset();
        assert!(session.set_caliber(".22 LR"));
        let second = session.record_shot(0.0, 0.0);
        assert_eq!(second.radius_mm, 4.0);
    }

    #[test]
    fn reset_restarts_local_numbering() {
        let mut session = Session::default();
        session.record_shot(1.0, 1.0);
        session.record_shot(2.0, 2.0);
        session.reset();
        assert_eq!(session.selected_point_id(), None);
        assert_eq!(session.record_shot(3.0, 3.0).id, 1);
    }

    #[test]
    fn duplicate_ids_are_dropped() {
        let mut session = Session::default();
        session.add_point(Point::new(5, 1.0, 1.0, 4.0));
        session.add_point(Point::new(5, 9.0, 9.0, 4.0));
        assert_eq!(session.points().len(), 1);
        assert_eq!(session.points()[0].x_mm, 1.0);
        assert_eq!(session.record_shot(0.0, 0.0).id, 6);
    }

    #[test]
    fn calibration_follows_selected_point() {
        let mut session = session_at(100.0);
        session.record_shot(-14.6, 26.64);
        session.record_shot(29.1, -7.0);
        assert_eq!(session.calibration_text(), "Down 0.25   Right 1.25");
        assert_eq!(session.axis_label(Axis::Horizontal), "X: R 1.25");
        session.select_point(1);
        assert_eq!(session.calibration_text(), "Up 1   Left 0.75");
        assert_eq!(session.axis_label(Axis::Vertical), "Y: U 1");
    }

    #[test]
    fn visibility_filters_slice_the_point_list() {
        let mut session = Session::default();
        assert!(session.visible_points(VisibilityFilter::LatestOnly).is_empty());
        for i in 0..4 {
            session.record_shot(i as f64, 0.0);
        }
        session.select_point(2);
        assert_eq!(session.visible_points(VisibilityFilter::All).len(), 4);
        assert_eq!(session.visible_points(VisibilityFilter::LatestOnly)[0].id, 4);
        let until: Vec<_> = session
            .visible_points(VisibilityFilter::UntilSelection)
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(until, vec![1, 2]);
    }

    #[test]
    fn events_announce_lock_transitions() {
        let mut session = Session::default();
        let mut rx = session.subscribe();
        session.record_shot(0.0, 0.0);
        session.reset();

        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        assert_eq!(
            seen,
            vec![
                SessionEvent::PointAdded(1),
                SessionEvent::SelectionChanged(Some(1)),
                SessionEvent::LockChanged(true),
                SessionEvent::Reset,
                SessionEvent::LockChanged(false),
            ]
        );
    }

    #[test]
    fn replacing_points_selects_newest_and_locks() {
        let mut session = Session::default();
        session.replace_points(vec![
            Point::new(4, 1.0, 1.0, 4.0),
            Point::new(9, 2.0, 2.0, 4.0),
        ]);
        assert!(session.controls_locked());
        assert_eq!(session.selected_point_id(), Some(9));
        session.replace_points(Vec::new());
        assert!(!session.controls_locked());
        assert_eq!(session.selected_point_id(), None);
    }
}
