use crate::models::audio_models::ProcessingStage;

/// Pure-math rendition of the capture processing chain.
///
/// Capture providers that have no native gain/compressor nodes run each
/// delivered block through this before handing it to the session. Sink stages
/// are pass-through.
#[derive(Debug, Clone)]
pub struct StageChain {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Gain(f32),
    Compressor(Compressor),
}

/// Feed-forward compressor with a soft knee and a one-pole gain smoother.
#[derive(Debug, Clone)]
struct Compressor {
    threshold_db: f32,
    ratio: f32,
    knee_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Current gain reduction in dB (≤ 0).
    envelope_db: f32,
}

impl Compressor {
    fn new(threshold_db: f32, ratio: f32, attack_secs: f32, release_secs: f32, knee_db: f32, sample_rate: f32) -> Self {
        Self {
            threshold_db,
            ratio: ratio.max(1.0),
            knee_db: knee_db.max(0.0),
            attack_coeff: smoothing_coeff(attack_secs, sample_rate),
            release_coeff: smoothing_coeff(release_secs, sample_rate),
            envelope_db: 0.0,
        }
    }

    /// Static gain curve: reduction in dB for an input level in dB.
    fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.threshold_db;
        let slope = 1.0 / self.ratio - 1.0;
        if 2.0 * over < -self.knee_db {
            0.0
        } else if self.knee_db > 0.0 && 2.0 * over.abs() <= self.knee_db {
            let x = over + self.knee_db / 2.0;
            slope * x * x / (2.0 * self.knee_db)
        } else {
            slope * over
        }
    }

    fn process(&mut self, sample: f32) -> f32 {
        let level_db = 20.0 * sample.abs().max(1e-9).log10();
        let target = self.gain_reduction_db(level_db);
        let coeff = if target < self.envelope_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope_db = coeff * self.envelope_db + (1.0 - coeff) * target;
        sample * 10f32.powf(self.envelope_db / 20.0)
    }
}

fn smoothing_coeff(time_secs: f32, sample_rate: f32) -> f32 {
    if time_secs <= 0.0 || sample_rate <= 0.0 {
        return 0.0;
    }
    (-1.0 / (time_secs * sample_rate)).exp()
}

impl StageChain {
    pub fn new(stages: &[ProcessingStage], sample_rate: u32) -> Self {
        let nodes = stages
            .iter()
            .filter_map(|stage| match stage {
                ProcessingStage::Gain { gain } => Some(Node::Gain(*gain)),
                ProcessingStage::Compressor {
                    threshold_db,
                    ratio,
                    attack_secs,
                    release_secs,
                    knee_db,
                } => Some(Node::Compressor(Compressor::new(
                    *threshold_db,
                    *ratio,
                    *attack_secs,
                    *release_secs,
                    *knee_db,
                    sample_rate as f32,
                ))),
                ProcessingStage::Sink { .. } => None,
            })
            .collect();
        Self { nodes }
    }

    /// Run `samples` through every stage in connection order, in place.
    pub fn process(&mut self, samples: &mut [f32]) {
        for node in &mut self.nodes {
            match node {
                Node::Gain(gain) => samples.iter_mut().for_each(|s| *s *= *gain),
                Node::Compressor(comp) => samples.iter_mut().for_each(|s| *s = comp.process(*s)),
            }
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.nodes.is_empty()
    }
}
