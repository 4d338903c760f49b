/// Outcome of a lookup that is allowed to fall back instead of failing.
///
/// `Degraded` carries the value that was used anyway and why, so callers can
/// log or display the degradation while the flow continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    Resolved(T),
    Degraded { value: T, reason: String },
}

impl<T> Resolution<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Resolution::Degraded {
            value,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn value(&self) -> &T {
        match self {
            Resolution::Resolved(value) | Resolution::Degraded { value, .. } => value,
        }
    }

    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Resolution::Resolved(value) | Resolution::Degraded { value, .. } => value,
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Degraded { .. })
    }

    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(_) => None,
            Resolution::Degraded { reason, .. } => Some(reason),
        }
    }
}

impl<T: Copy> Resolution<T> {
    #[must_use]
    pub fn get(&self) -> T {
        *self.value()
    }
}
