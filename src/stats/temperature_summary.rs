//! Summary of the temperature series collected during a run

/// Temperature figures shown alongside the throughput result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureSummary {
    pub samples: usize,
    pub first: f32,
    pub last: f32,
    pub min: f32,
    pub max: f32,
}

impl TemperatureSummary {
    /// Summarise a sample series, `None` when nothing was sampled
    pub fn from_samples(samples: &[f32]) -> Option<Self> {
        let (&first, &last) = (samples.first()?, samples.last()?);
        let min = samples.iter().copied().fold(f32::INFINITY, f32::min);
        let max = samples.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        Some(Self {
            samples: samples.len(),
            first,
            last,
            min,
            max,
        })
    }

    /// Change between the first and last reading
    pub fn rise(&self) -> f32 {
        self.last - self.first
    }
}
