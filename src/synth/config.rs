#[derive(Clone, Debug)]
pub struct SynthConfig {
    pub sample_rate: f32,
    /// Output level applied after all voices are mixed.
    pub master_volume: f32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0, // Standard audio sample rate
            master_volume: 0.3,
        }
    }
}
