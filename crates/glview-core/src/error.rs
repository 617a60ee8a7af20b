use thiserror::Error;

pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Failure reported by a graphics backend.
///
/// Codes are stable; 101 matches the "config not support" failure of EGL-style backends.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("config not support")]
    ConfigUnsupported,

    #[error("surface error: {0}")]
    Surface(String),

    #[error("backend error: {0}")]
    Other(String),
}

impl BackendError {
    #[inline]
    pub fn code(&self) -> i32 {
        match self {
            BackendError::ConfigUnsupported => 101,
            BackendError::Surface(_) => 102,
            BackendError::Other(_) => 199,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// `on_attach` while a render thread is still owned by the view.
    #[error("render thread already exists, attach called twice without detach")]
    AlreadyAttached,

    /// A resize reached the render thread before any context was created.
    #[error("surface resized to {width}x{height} but no context was created")]
    ResizeWithoutContext { width: u32, height: u32 },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("config error: {0}")]
    Config(String),

    #[error("failed to spawn render thread: {0}")]
    ThreadSpawn(String),
}

impl LifecycleError {
    /// Host contract violations. Nothing in the controller tries to recover from these.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LifecycleError::AlreadyAttached | LifecycleError::ResizeWithoutContext { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_unsupported_keeps_legacy_code_and_message() {
        let e = BackendError::ConfigUnsupported;
        assert_eq!(e.code(), 101);
        assert_eq!(e.to_string(), "config not support");
    }

    #[test]
    fn only_precondition_violations_are_fatal() {
        assert!(LifecycleError::AlreadyAttached.is_fatal());
        assert!(LifecycleError::ResizeWithoutContext { width: 1, height: 1 }.is_fatal());
        assert!(!LifecycleError::from(BackendError::ConfigUnsupported).is_fatal());
        assert!(!LifecycleError::Config("x".into()).is_fatal());
    }
}
