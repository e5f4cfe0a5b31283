#![forbid(unsafe_code)]

//! Top-level configuration.
//!
//! Every tunable lives in one of the per-component structs. Defaults are the
//! values the experience was tuned with; none of them is load-bearing for
//! correctness. Construct with struct-update syntax or the `with_*`
//! builders:
//!
//! ```
//! use bloom_core::BloomConfig;
//! use bloom_core::arbiter::ArbiterConfig;
//!
//! let config = BloomConfig::default().with_arbiter(ArbiterConfig {
//!     key_rotate_step: 10.0,
//!     ..Default::default()
//! });
//! assert!(config.validate().is_ok());
//! ```

use crate::arbiter::ArbiterConfig;
use crate::classifier::ClassifierConfig;
use crate::debounce::DebounceConfig;
use crate::error::ConfigError;
use crate::event::KeyBindings;
use crate::focus::FocusConfig;
use crate::phase::PhaseConfig;
use crate::wave::WaveConfig;

/// Configuration for a [`GestureController`](crate::GestureController).
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BloomConfig {
    pub classifier: ClassifierConfig,
    pub debounce: DebounceConfig,
    pub wave: WaveConfig,
    pub arbiter: ArbiterConfig,
    pub phase: PhaseConfig,
    pub focus: FocusConfig,
    pub keys: KeyBindings,
}

impl BloomConfig {
    /// Replace the classifier thresholds.
    #[must_use]
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, debounce: DebounceConfig) -> Self {
        self.debounce = debounce;
        self
    }

    /// Replace the wave window.
    #[must_use]
    pub fn with_wave(mut self, wave: WaveConfig) -> Self {
        self.wave = wave;
        self
    }

    /// Replace the arbiter tuning.
    #[must_use]
    pub fn with_arbiter(mut self, arbiter: ArbiterConfig) -> Self {
        self.arbiter = arbiter;
        self
    }

    /// Replace the transition timing.
    #[must_use]
    pub fn with_phase(mut self, phase: PhaseConfig) -> Self {
        self.phase = phase;
        self
    }

    /// Replace the focus scoring.
    #[must_use]
    pub fn with_focus(mut self, focus: FocusConfig) -> Self {
        self.focus = focus;
        self
    }

    /// Replace the key bindings.
    #[must_use]
    pub fn with_keys(mut self, keys: KeyBindings) -> Self {
        self.keys = keys;
        self
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.validate()?;
        self.debounce.validate()?;
        self.wave.validate()?;
        self.arbiter.validate()?;
        self.phase.validate()?;
        self.focus.validate()?;
        self.keys.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(BloomConfig::default().validate(), Ok(()));
    }

    #[test]
    fn first_bad_section_is_reported() {
        let config = BloomConfig::default()
            .with_debounce(DebounceConfig {
                capacity: 2,
                wave_votes: 3,
            })
            .with_arbiter(ArbiterConfig {
                decay_factor: 0.0,
                ..Default::default()
            });
        assert_eq!(
            config.validate(),
            Err(ConfigError::VotesExceedCapacity {
                votes: 3,
                capacity: 2
            })
        );
    }

    #[test]
    fn builders_replace_sections() {
        let config = BloomConfig::default().with_wave(WaveConfig { capacity: 30 });
        assert_eq!(config.wave.capacity, 30);
        assert_eq!(config.debounce, DebounceConfig::default());
    }
}
