/// Windowed mean over the most recent attention samples.
///
/// Storage is allocated once at construction; `add` and `clear` never
/// allocate afterwards.
#[derive(Debug, Clone)]
pub struct RollingAverage {
    samples: Box<[u8]>,
    index: usize,
    count: usize,
    sum: f64,
}

impl RollingAverage {
    /// Create an empty window. A capacity of 0 is bumped to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity.max(1)].into_boxed_slice(),
            index: 0,
            count: 0,
            sum: 0.0,
        }
    }

    /// Push a sample, evicting the oldest one once the window is full
    pub fn add(&mut self, value: u8) {
        let cap = self.samples.len();
        if self.count < cap {
            self.count += 1;
        } else {
            self.sum -= f64::from(self.samples[self.index]);
        }
        self.samples[self.index] = value;
        self.sum += f64::from(value);
        self.index = (self.index + 1) % cap;
    }

    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Average rounded to the nearest whole attention value
    pub fn rounded(&self) -> u8 {
        self.average().round().clamp(0.0, f64::from(u8::MAX)) as u8
    }

    pub fn clear(&mut self) {
        self.samples.fill(0);
        self.index = 0;
        self.count = 0;
        self.sum = 0.0;
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }
}

impl Default for RollingAverage {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_AVERAGING_LENGTH)
    }
}
