use std::time::Instant;

pub struct TimeSource {
    start: Instant,
}

impl TimeSource {
    pub fn new() -> TimeSource {
        TimeSource {
            start: Instant::now(),
        }
    }

    pub fn elapsed_us(&self) -> u128 { self.start.elapsed().as_micros() }
}
