//! Time codes for attribute evaluation

/// Time at which an attribute is evaluated.
///
/// `Default` selects the authored default value and ignores time samples;
/// `Numeric` evaluates time samples (linear between samples, held outside).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TimeCode {
    #[default]
    Default,
    Numeric(f64),
}

impl TimeCode {
    pub fn is_default(self) -> bool {
        matches!(self, TimeCode::Default)
    }

    /// Numeric time, `None` for the default sentinel.
    pub fn value(self) -> Option<f64> {
        match self {
            TimeCode::Default => None,
            TimeCode::Numeric(t) => Some(t),
        }
    }
}

impl From<f64> for TimeCode {
    fn from(time: f64) -> Self {
        TimeCode::Numeric(time)
    }
}
