//! Poll and retry policies.

use std::time::Duration;

/// How retry delays grow with consecutive failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffCurve {
    /// Same delay for every retry.
    Fixed(Duration),
    /// `base * attempt`.
    Linear { base: Duration },
    /// `base * 2^(attempt-1)`, bounded by `cap`.
    Exponential { base: Duration, cap: Duration },
}

impl BackoffCurve {
    /// Delay before the given retry attempt (attempts start at 1).
    pub fn delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            BackoffCurve::Fixed(delay) => *delay,
            BackoffCurve::Linear { base } => base.saturating_mul(attempt),
            BackoffCurve::Exponential { base, cap } => {
                let shift = (attempt - 1).min(20);
                let millis = (base.as_millis() as u64).saturating_mul(1u64 << shift);
                Duration::from_millis(millis).min(*cap)
            }
        }
    }

    /// Parse a configuration string: `"fixed:5s"`, `"linear:250ms"`,
    /// `"exponential:500ms"` or `"exponential:500ms:30s"` (base:cap).
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.split(':');
        let shape = parts.next()?.trim().to_ascii_lowercase();
        let base = parse_duration(parts.next().unwrap_or("500ms"))?;
        match shape.as_str() {
            "fixed" => Some(BackoffCurve::Fixed(base)),
            "linear" => Some(BackoffCurve::Linear { base }),
            "exponential" => {
                let cap = match parts.next() {
                    Some(cap) => parse_duration(cap)?,
                    None => Duration::from_secs(30),
                };
                Some(BackoffCurve::Exponential { base, cap })
            }
            _ => None,
        }
    }
}

impl Default for BackoffCurve {
    fn default() -> Self {
        BackoffCurve::Exponential {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(30),
        }
    }
}

/// Refresh policy for one dashboard section.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Steady polling interval after a successful fetch.
    pub interval: Duration,
    /// Retries after the initial failed fetch before terminal failure.
    pub max_retries: u32,
    pub backoff: BackoffCurve,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            max_retries: 3,
            backoff: BackoffCurve::default(),
        }
    }
}

/// Parse durations like `"500ms"`, `"5s"`, `"2m"`, or bare milliseconds.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        return value.trim().parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(value) = raw.strip_suffix('s') {
        return value.trim().parse::<u64>().ok().map(Duration::from_secs);
    }
    if let Some(value) = raw.strip_suffix('m') {
        return value
            .trim()
            .parse::<u64>()
            .ok()
            .map(|minutes| Duration::from_secs(minutes * 60));
    }
    raw.parse::<u64>().ok().map(Duration::from_millis)
}
