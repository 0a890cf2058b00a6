use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Samples one period at `phase` in [0, 1).
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * (phase - (phase + 0.5).floor()),
            Waveform::Triangle => (2.0 / PI) * (2.0 * PI * phase).sin().asin(),
        }
    }
}

/// Phase-accumulating oscillator.
///
/// The frequency may change on every sample (vibrato, glides) without phase
/// jumps, which a sample-index based phase could not guarantee.
#[derive(Debug, Clone)]
pub struct Oscillator {
    pub waveform: Waveform,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform) -> Self {
        Self { waveform, phase: 0.0 }
    }

    pub fn next_sample(&mut self, frequency: f32, sample_rate: f32) -> f32 {
        let value = self.waveform.sample(self.phase);
        self.phase = (self.phase + frequency / sample_rate).rem_euclid(1.0);
        value
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveforms_stay_in_unit_range() {
        for waveform in [Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle].iter() {
            for i in 0..100 {
                let v = waveform.sample(i as f32 / 100.0);
                assert!(v.abs() <= 1.0 + 1e-6, "{:?} gave {}", waveform, v);
            }
        }
    }

    #[test]
    fn oscillator_completes_cycles_at_its_frequency() {
        let mut osc = Oscillator::new(Waveform::Square);
        // 250 Hz at 1 kHz: 4 samples per period, 2 high then 2 low.
        let samples: Vec<f32> = (0..8).map(|_| osc.next_sample(250.0, 1000.0)).collect();
        assert_eq!(samples, vec![1.0, 1.0, -1.0, -1.0, 1.0, 1.0, -1.0, -1.0]);
    }
}
