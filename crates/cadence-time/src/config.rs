//! Clock configuration

use cadence_core::{ClockError, ClockResult};

/// Default allowable interpolation error: two frames at 60Hz.
pub const DEFAULT_ALLOWABLE_ERROR_MS: f64 = 1000.0 / 60.0 * 2.0;

/// Default fraction of the source error corrected per frame.
pub const DEFAULT_DRIFT_CORRECTION: f64 = 1.0 / 8.0;

/// Coupling configuration
#[derive(Clone, Debug, PartialEq)]
pub struct DecouplingConfig {
    /// Allow time to diverge from the source (false = pure passthrough)
    pub allow_decoupling: bool,
}

impl Default for DecouplingConfig {
    fn default() -> Self {
        DecouplingConfig {
            allow_decoupling: true,
        }
    }
}

impl DecouplingConfig {
    /// Every operation forwards to the source verbatim.
    pub fn passthrough() -> Self {
        DecouplingConfig {
            allow_decoupling: false,
        }
    }
}

/// Interpolation configuration
#[derive(Clone, Debug, PartialEq)]
pub struct InterpolationConfig {
    /// Maximum divergence from the source before falling back to exact tracking
    pub allowable_error_ms: f64,
    /// Fraction of the remaining source error corrected each frame
    pub drift_correction: f64,
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        InterpolationConfig {
            allowable_error_ms: DEFAULT_ALLOWABLE_ERROR_MS,
            drift_correction: DEFAULT_DRIFT_CORRECTION,
        }
    }
}

impl InterpolationConfig {
    /// One frame at 60Hz of allowance, for sources with fine granularity.
    pub fn tight() -> Self {
        InterpolationConfig {
            allowable_error_ms: 1000.0 / 60.0,
            drift_correction: DEFAULT_DRIFT_CORRECTION,
        }
    }

    /// Wide allowance for very coarse sources (e.g. large audio buffers).
    pub fn lenient() -> Self {
        InterpolationConfig {
            allowable_error_ms: 100.0,
            drift_correction: 1.0 / 16.0,
        }
    }

    pub fn with_allowable_error(mut self, allowable_error_ms: f64) -> ClockResult<Self> {
        validate_allowable_error(allowable_error_ms)?;
        self.allowable_error_ms = allowable_error_ms;
        Ok(self)
    }

    pub fn validate(&self) -> ClockResult<()> {
        validate_allowable_error(self.allowable_error_ms)?;
        if !(0.0..=1.0).contains(&self.drift_correction) {
            return Err(ClockError::InvalidDriftCorrection(self.drift_correction));
        }
        Ok(())
    }
}

pub(crate) fn validate_allowable_error(allowable_error_ms: f64) -> ClockResult<()> {
    if !allowable_error_ms.is_finite() || allowable_error_ms < 0.0 {
        return Err(ClockError::InvalidAllowableError(allowable_error_ms));
    }
    Ok(())
}

/// Frame-based wrapper configuration
#[derive(Clone, Debug, PartialEq)]
pub struct FramedConfig {
    /// Process the source's own frame first when it is frame based
    pub process_source: bool,
    /// Clock time between frames-per-second recalculations (ms)
    pub fps_window_ms: f64,
    /// Number of recent frames used for jitter statistics
    pub jitter_window: usize,
}

impl Default for FramedConfig {
    fn default() -> Self {
        FramedConfig {
            process_source: true,
            fps_window_ms: 1000.0,
            jitter_window: 128,
        }
    }
}

impl FramedConfig {
    pub fn validate(&self) -> ClockResult<()> {
        if !self.fps_window_ms.is_finite() || self.fps_window_ms <= 0.0 {
            return Err(ClockError::InvalidFrameWindow(format!(
                "fps window {}ms",
                self.fps_window_ms
            )));
        }
        if self.jitter_window == 0 {
            return Err(ClockError::InvalidFrameWindow("empty jitter window".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(InterpolationConfig::default().validate().is_ok());
        assert!(InterpolationConfig::tight().validate().is_ok());
        assert!(InterpolationConfig::lenient().validate().is_ok());
        assert!(FramedConfig::default().validate().is_ok());
        assert!(DecouplingConfig::default().allow_decoupling);
        assert!(!DecouplingConfig::passthrough().allow_decoupling);
    }

    #[test]
    fn test_negative_allowable_error_rejected() {
        let result = InterpolationConfig::default().with_allowable_error(-1.0);
        assert_eq!(result, Err(ClockError::InvalidAllowableError(-1.0)));

        assert!(InterpolationConfig::default()
            .with_allowable_error(f64::NAN)
            .is_err());
        assert!(InterpolationConfig::default()
            .with_allowable_error(0.0)
            .is_ok());
    }

    #[test]
    fn test_drift_correction_bounds() {
        let config = InterpolationConfig {
            drift_correction: 1.5,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ClockError::InvalidDriftCorrection(1.5)));
    }

    #[test]
    fn test_framed_config_bounds() {
        let config = FramedConfig {
            jitter_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = FramedConfig {
            fps_window_ms: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
