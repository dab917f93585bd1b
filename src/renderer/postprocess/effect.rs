//! The custom effect pass's host-side state: an accumulated time value kept
//! in sync with the pass's `time` uniform.

use super::chain::{PassChain, PassId};
use super::pass::Backend;
use super::programs::TIME;
use super::uniforms::{UniformError, UniformValue};

/// Period the uniform wraps at: 1000 turns, a whole number of cycles for
/// every time frequency the effect shader uses.
pub const TIME_PERIOD: f64 = std::f64::consts::TAU * 1000.0;

/// Handle to the time-driven effect pass inside a [`PassChain`].
#[derive(Debug, Clone, PartialEq)]
pub struct EffectPass {
    id: PassId,
    time: f64,
}

impl EffectPass {
    /// Track the pass at `id`, starting from time zero.
    #[must_use]
    pub fn new(id: PassId) -> Self {
        Self { id, time: 0.0 }
    }

    /// Chain id of the effect pass.
    #[must_use]
    pub fn id(&self) -> PassId {
        self.id
    }

    /// Accumulated time (full precision).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Add `delta` to the stored time and write it into the pass's `time`
    /// uniform as an `f32`, wrapped to [`TIME_PERIOD`] in `f64` first so the
    /// shader keeps phase precision. Returns the value written.
    ///
    /// # Errors
    ///
    /// [`UniformError::Unknown`] if the pass is missing from the chain or
    /// does not declare `time`.
    pub fn advance_time<B: Backend>(
        &mut self,
        chain: &mut PassChain<B>,
        delta: f64,
    ) -> Result<f32, UniformError> {
        let descriptor = chain
            .descriptor_mut(self.id)
            .ok_or_else(|| UniformError::Unknown(TIME.to_owned()))?;
        let next = self.time + delta;
        let value = next.rem_euclid(TIME_PERIOD) as f32;
        descriptor.uniforms.set(TIME, UniformValue::Float(value))?;
        self.time = next;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::super::pass::PassKind;
    use super::super::programs::effect_pass;
    use super::super::testing::RecordingBackend;
    use super::*;
    use crate::options::EffectOptions;

    #[test]
    fn advance_time_writes_uniform() {
        let backend = RecordingBackend::default();
        let mut chain = PassChain::new(&backend, 8, 8);
        let id = chain
            .add_pass(&backend, PassKind::Shader, effect_pass(&EffectOptions::default()))
            .unwrap();
        let mut effect = EffectPass::new(id);

        assert_eq!(effect.advance_time(&mut chain, 0.5).unwrap(), 0.5);
        assert_eq!(effect.advance_time(&mut chain, 0.25).unwrap(), 0.75);
        assert_eq!(effect.time(), 0.75);
        assert_eq!(chain.descriptor(id).unwrap().uniforms.float(TIME), Some(0.75));
    }

    #[test]
    fn long_running_time_wraps_uniform_only() {
        let backend = RecordingBackend::default();
        let mut chain = PassChain::new(&backend, 8, 8);
        let id = chain
            .add_pass(&backend, PassKind::Shader, effect_pass(&EffectOptions::default()))
            .unwrap();
        let mut effect = EffectPass::new(id);

        let hour_of_compounding = 1.0e9;
        let written = effect.advance_time(&mut chain, hour_of_compounding).unwrap();
        assert_eq!(effect.time(), hour_of_compounding);
        assert!((0.0..TIME_PERIOD as f32).contains(&written));
        let expected = hour_of_compounding.rem_euclid(TIME_PERIOD);
        assert!((f64::from(written) - expected).abs() < 1e-3);
    }

    #[test]
    fn missing_time_uniform_leaves_state_untouched() {
        let backend = RecordingBackend::default();
        let mut chain = PassChain::new(&backend, 8, 8);
        let id = chain
            .add_pass(
                &backend,
                PassKind::Scene,
                super::super::programs::scene_pass(),
            )
            .unwrap();
        let mut effect = EffectPass::new(id);
        assert!(effect.advance_time(&mut chain, 1.0).is_err());
        assert_eq!(effect.time(), 0.0);
    }
}
