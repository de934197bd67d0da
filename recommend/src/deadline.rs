use crate::error::RecommendError;
use std::time::{Duration, Instant};

/// Point in time after which an in-flight computation is abandoned.
///
/// Checked cooperatively between candidate evaluations. The store is never
/// written during a query, so abandoning leaves nothing half-applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { expires_at: None }
    }

    pub fn after(timeout: Duration) -> Self {
        Self::at(Instant::now() + timeout)
    }

    pub fn at(instant: Instant) -> Self {
        Self {
            expires_at: Some(instant),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Instant::now() >= at)
            .unwrap_or(false)
    }

    pub fn check(&self) -> Result<(), RecommendError> {
        if self.is_expired() {
            Err(RecommendError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_never_expires() {
        assert!(Deadline::none().check().is_ok());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let deadline = Deadline::at(Instant::now());
        assert!(deadline.is_expired());
        assert_eq!(deadline.check(), Err(RecommendError::DeadlineExceeded));
    }

    #[test]
    fn test_future_deadline_is_open() {
        assert!(Deadline::after(Duration::from_secs(60)).check().is_ok());
    }
}
