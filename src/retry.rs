//! Bounded fixed-delay retry for storage I/O

use std::io;
use std::thread;
use std::time::Duration;

use log::error;

/// Retry policy wrapping fallible storage calls: a fixed number of attempts
/// with a fixed delay in between
///
/// Retries absorb transient OS-level file errors. Logical races between
/// registry operations are handled by the per-user lock, not here.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub attempts: u32,
    /// Delay between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 5,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempt budget is exhausted,
    /// sleeping between attempts; the last error is surfaced
    pub fn run<T, F>(&self, mut op: F) -> io::Result<T>
    where
        F: FnMut() -> io::Result<T>,
    {
        let mut last = None;
        for attempt in 1..=self.attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) => {
                    error!(
                        "file access error: {e}, attempt {attempt}/{}",
                        self.attempts
                    );
                    last = Some(e);
                    if attempt < self.attempts {
                        thread::sleep(self.delay);
                    }
                }
            }
        }
        Err(last.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no attempts made")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn quick_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn t_first_attempt_succeeds() {
        let mut calls = 0;
        let result = quick_policy().run(|| {
            calls += 1;
            Ok(42)
        });
        assert_eq!(42, result.unwrap());
        assert_eq!(1, calls);
    }

    #[test]
    fn t_recovers_within_budget() {
        let mut calls = 0;
        let result = quick_policy().run(|| {
            calls += 1;
            if calls < 3 {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"))
            } else {
                Ok("done")
            }
        });
        assert_eq!("done", result.unwrap());
        assert_eq!(3, calls);
    }

    #[test]
    fn t_surfaces_last_error_on_exhaustion() {
        let mut calls = 0;
        let result: io::Result<()> = quick_policy().run(|| {
            calls += 1;
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"))
        });
        assert_eq!(3, calls);
        assert_eq!(
            io::ErrorKind::PermissionDenied,
            result.unwrap_err().kind()
        );
    }
}
