use std::time::Duration;

/// Attempt budget plus the delay between attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Same delay between every attempt
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fresh delay schedule for one submission
    pub fn backoff(&self) -> Backoff {
        Backoff { delay: self.delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(1))
    }
}

/// Delay schedule for the attempts of one submission
pub struct Backoff {
    delay: Duration,
}

impl Backoff {
    pub fn next_delay(&self) -> Duration {
        self.delay
    }
}
