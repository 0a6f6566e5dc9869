use zerocore::sync::RemotePoint;
use zerocore::PointId;

/// Server-side list of impacts.
///
/// Ids keep increasing across clears so a client that missed a clear never
/// mistakes new shots for ones it has already seen.
#[derive(Debug, Clone, Default)]
pub struct ShotBoard {
    shots: Vec<RemotePoint>,
    last_id: PointId,
}

impl ShotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x_mm: f64, y_mm: f64) -> RemotePoint {
        self.last_id += 1;
        let shot = RemotePoint::new(self.last_id, x_mm, y_mm);
        self.shots.push(shot);
        shot
    }

    pub fn all(&self) -> Vec<RemotePoint> {
        self.shots.clone()
    }

    /// Shots with an id above `last_id`; a missing or negative id means all.
    pub fn since(&self, last_id: Option<i64>) -> Vec<RemotePoint> {
        let floor = last_id.and_then(|id| PointId::try_from(id).ok()).unwrap_or(0);
        self.shots
            .iter()
            .filter(|shot| shot.id > floor)
            .copied()
            .collect()
    }

    /// Drops every shot, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.shots.len();
        self.shots.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.shots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn since_filters_by_id() {
        let mut board = ShotBoard::new();
        for i in 0..5 {
            board.push(i as f64, 0.0);
        }
        let ids: Vec<_> = board.since(Some(3)).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert_eq!(board.since(None).len(), 5);
        assert_eq!(board.since(Some(-1)).len(), 5);
    }

    #[test]
    fn ids_survive_a_clear() {
        let mut board = ShotBoard::new();
        board.push(0.0, 0.0);
        board.push(0.0, 0.0);
        assert_eq!(board.clear(), 2);
        assert_eq!(board.len(), 0);
        assert_eq!(board.push(1.0, 1.0).id, 3);
    }
}
