use crate::prelude::{Point, PointId};
use crate::session::Session;
use crate::sync::wire::RemotePoint;

/// Permission to issue one diff request, starting after `since`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    pub since: Option<PointId>,
    /// Session generation the request was issued in.
    pub generation: u64,
}

/// Incremental-sync bookkeeping: the highest remote id absorbed so far and a
/// single-slot latch that keeps at most one poll outstanding.
///
/// Every [`SyncCursor::reset`] starts a new generation, so answers to
/// requests issued before a clear can be told apart.
#[derive(Debug, Clone, Default)]
pub struct SyncCursor {
    last_remote_id: Option<PointId>,
    in_flight: bool,
    generation: u64,
}

impl SyncCursor {
    pub fn last_remote_id(&self) -> Option<PointId> {
        self.last_remote_id
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a ticket was issued after the latest reset.
    pub fn is_current(&self, ticket: &PollTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Claims the latch. `None` while a poll is still outstanding; the caller
    /// drops that tick rather than queueing it.
    pub fn begin_poll(&mut self) -> Option<PollTicket> {
        if self.in_flight {
            return None;
        }
        self.in_flight = true;
        Some(PollTicket {
            since: self.last_remote_id,
            generation: self.generation,
        })
    }

    pub fn finish_poll(&mut self) {
        self.in_flight = false;
    }

    /// Replaces the session contents with a full board listing.
    pub fn rebase(&mut self, session: &mut Session, records: Vec<RemotePoint>) {
        let radius = session.current_radius_mm();
        self.last_remote_id = records.iter().map(|r| r.id).max();
        let points = records
            .into_iter()
            .map(|r| Point::new(r.id, r.x_mm, r.y_mm, radius))
            .collect();
        session.replace_points(points);
    }

    /// Appends records newer than the cursor, in board order, skipping ids
    /// the session already holds. Returns how many points were added.
    pub fn absorb(&mut self, session: &mut Session, records: Vec<RemotePoint>) -> usize {
        let floor = self.last_remote_id;
        let mut highest = floor;
        let mut added = 0;
        for record in records {
            if floor.is_some_and(|last| record.id <= last) {
                continue;
            }
            if session.point(record.id).is_some() {
                continue;
            }
            let radius = session.current_radius_mm();
            session.add_point(Point::new(record.id, record.x_mm, record.y_mm, radius));
            highest = Some(highest.map_or(record.id, |h| h.max(record.id)));
            added += 1;
        }
        self.last_remote_id = highest;
        added
    }

    /// Forgets the cursor and opens a new generation. An outstanding poll
    /// keeps its latch until it completes.
    pub fn reset(&mut self) {
        self.last_remote_id = None;
        self.generation = self.generation.wrapping_add(1);
    }
}
