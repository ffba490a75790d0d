/// Virtual song clock. Only ever touched under the playback lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub virtual_time: f64,
    pub speed: f64,
    pub paused: bool,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            virtual_time: 0.0,
            speed: 1.0,
            paused: true,
        }
    }
}

impl TransportState {
    /// Moves virtual time forward by `dt` wall seconds scaled by the speed.
    /// Time stops moving once it reaches `length`; the wrap back to the start
    /// happens after the scheduler has seen the overshoot.
    pub fn advance(&mut self, dt: f64, length: f64) -> bool {
        if self.paused || self.virtual_time >= length {
            return false;
        }
        self.virtual_time += dt * self.speed;
        true
    }

    /// Folds time past the end back into the song. Returns true on wrap.
    pub fn wrap(&mut self, length: f64) -> bool {
        if length <= 0.0 || self.virtual_time < length {
            return false;
        }
        self.virtual_time = self.virtual_time.rem_euclid(length);
        true
    }

    /// Rejects speeds that would stall or reverse the clock.
    pub fn set_speed(&mut self, speed: f64) -> bool {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
            true
        } else {
            false
        }
    }

    pub fn rewind(&mut self) {
        self.virtual_time = 0.0;
        self.paused = true;
    }
}
