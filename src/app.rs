use std::time::Duration;

/// Fixed simulation step for object animation.
pub const TICK: Duration = Duration::from_millis(100);

const SPIN_DEGREES_PER_TICK: f32 = 3.0;
const FULL_TURN_DEGREES: f32 = 360.0;

/// Converts wall-clock time into whole fixed-length ticks. The remainder
/// below one tick carries over to the next call, so animation speed stays
/// independent of the frame rate.
#[derive(Debug, Default)]
pub struct Ticker {
    accumulated: Duration,
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let ticks = (self.accumulated.as_nanos() / TICK.as_nanos()) as u32;
        self.accumulated -= TICK * ticks;
        ticks
    }
}

/// Rotation of the animated object about the Z axis: a fixed number of
/// degrees per tick, wrapping at a full turn. Pausing holds the current
/// angle; resuming continues from it.
#[derive(Debug)]
pub struct Spin {
    angle_degrees: f32,
    animating: bool,
}

impl Spin {
    pub fn new() -> Self {
        Self {
            angle_degrees: 0.0,
            animating: true,
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn toggle(&mut self) {
        self.animating = !self.animating;
    }

    pub fn advance(&mut self, ticks: u32) {
        if !self.animating || ticks == 0 {
            return;
        }
        self.angle_degrees =
            (self.angle_degrees + SPIN_DEGREES_PER_TICK * ticks as f32) % FULL_TURN_DEGREES;
    }

    pub fn angle_degrees(&self) -> f32 {
        self.angle_degrees
    }

    pub fn angle_radians(&self) -> f32 {
        self.angle_degrees.to_radians()
    }
}

impl Default for Spin {
    fn default() -> Self {
        Self::new()
    }
}

/// Pointer position bookkeeping for drags. Each report yields the delta
/// from the previous one; the first report after startup has no reference
/// point and yields none, so a click issued before any motion cannot
/// produce a spurious jump.
#[derive(Debug, Default)]
pub struct CursorTracker {
    last: Option<(f32, f32)>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, x: f32, y: f32) -> Option<(f32, f32)> {
        let delta = self.last.map(|(px, py)| (x - px, y - py));
        self.last = Some((x, y));
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_tick_time_accumulates_without_emitting() {
        let mut ticker = Ticker::new();
        assert_eq!(ticker.advance(Duration::from_millis(60)), 0);
        assert_eq!(ticker.advance(Duration::from_millis(60)), 1);
        // 20 ms remainder carried over.
        assert_eq!(ticker.advance(Duration::from_millis(80)), 1);
    }

    #[test]
    fn long_stall_emits_multiple_ticks() {
        let mut ticker = Ticker::new();
        assert_eq!(ticker.advance(Duration::from_millis(350)), 3);
        assert_eq!(ticker.advance(Duration::from_millis(50)), 1);
    }

    #[test]
    fn spin_wraps_at_a_full_turn() {
        let mut spin = Spin::new();
        spin.advance(119);
        assert_eq!(spin.angle_degrees(), 357.0);
        spin.advance(1);
        assert_eq!(spin.angle_degrees(), 0.0);
    }

    #[test]
    fn first_cursor_report_yields_no_delta() {
        let mut tracker = CursorTracker::new();
        assert_eq!(tracker.update(640.0, 360.0), None);
        assert_eq!(tracker.update(650.0, 356.0), Some((10.0, -4.0)));
    }

    #[test]
    fn cursor_deltas_are_relative_to_the_previous_report() {
        let mut tracker = CursorTracker::new();
        tracker.update(100.0, 100.0);
        tracker.update(103.0, 98.0);
        assert_eq!(tracker.update(103.0, 98.0), Some((0.0, 0.0)));
        assert_eq!(tracker.update(100.0, 100.0), Some((-3.0, 2.0)));
    }

    #[test]
    fn paused_spin_holds_its_angle() {
        let mut spin = Spin::new();
        spin.advance(10);
        let angle = spin.angle_degrees();
        spin.toggle();
        spin.advance(50);
        assert_eq!(spin.angle_degrees(), angle);
        spin.toggle();
        spin.advance(1);
        assert_eq!(spin.angle_degrees(), angle + 3.0);
    }
}
