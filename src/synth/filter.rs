use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterType {
    LowPass,
    BandPass,
}

/// Second-order IIR filter (Direct Form II Transposed) with audio-cookbook
/// coefficients, so cutoff and Q behave like a Web Audio biquad.
#[derive(Clone, Debug)]
pub struct Biquad {
    filter_type: FilterType,
    q: f32,
    cutoff: f32,
    sample_rate: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(filter_type: FilterType, cutoff: f32, q: f32, sample_rate: f32) -> Self {
        let mut filter = Self {
            filter_type,
            q: q.max(1e-4),
            cutoff,
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            z1: 0.0,
            z2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    /// Moves the cutoff (or band centre). Coefficients are only recomputed on change.
    pub fn set_cutoff(&mut self, cutoff: f32) {
        if (cutoff - self.cutoff).abs() > 1e-3 {
            self.cutoff = cutoff;
            self.update_coefficients();
        }
    }

    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    fn update_coefficients(&mut self) {
        // Keep the cutoff strictly inside (0, nyquist).
        let nyquist = self.sample_rate * 0.5;
        let cutoff = self.cutoff.clamp(10.0, nyquist * 0.99);
        let w0 = 2.0 * PI * cutoff / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * self.q);

        let (b0, b1, b2) = match self.filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;

        self.b0 = b0 / a0;
        self.b1 = b1 / a0;
        self.b2 = b2 / a0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.z1;
        self.z1 = self.b1 * input - self.a1 * output + self.z2;
        self.z2 = self.b2 * input - self.a2 * output;
        output
    }
}
