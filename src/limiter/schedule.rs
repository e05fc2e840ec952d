use super::config::LimiterConfig;

/// Outcome of one admission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    /// Milliseconds the caller must wait, `0` when admitted.
    pub wait_ms: u64,
    /// Value to persist as the key's next allowed instant.
    pub next_allowed_time: i64,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        self.wait_ms == 0
    }
}

/// Next-allowed-time admission with a grace window.
///
/// A call is admitted when it arrives on time, late, or early by no more
/// than `grace_ms`. Otherwise it must wait the part of the gap that exceeds
/// the grace window. Every call, admitted or not, advances the schedule by
/// `interval_ms` from `max(now, next_allowed_time)`, so the stored value
/// never decreases.
pub fn admit(config: &LimiterConfig, now: i64, next_allowed_time: i64) -> Admission {
    let wait = if now >= next_allowed_time {
        0
    } else {
        let until_allowed = next_allowed_time - now;
        if until_allowed <= config.grace_ms {
            0
        } else {
            until_allowed - config.grace_ms
        }
    };

    let baseline = now.max(next_allowed_time);

    Admission {
        wait_ms: u64::try_from(wait).unwrap_or_default(),
        next_allowed_time: baseline.saturating_add(config.interval_ms),
    }
}
