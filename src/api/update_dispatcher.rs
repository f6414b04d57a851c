//! Pushes widget updates into render handles that may not exist yet.
//!
//! The dispatcher owns no timer. The host advances a virtual clock with
//! [`UpdateDispatcher::advance_by`] and every retry that falls due inside
//! the step runs in due order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::update_strategy::apply_update;
use crate::core::SharedWidget;
use crate::error::{WidgetError, WidgetResult};

const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(2000);

/// Growth of the wait between two attempts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RetryGrowth {
    Exponential { factor: f64 },
    Linear,
}

/// Retry schedule of one update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(with = "millis")]
    pub base_delay: Duration,
    pub growth: RetryGrowth,
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl RetryPolicy {
    /// Ten attempts, 100ms growing by half each time.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            growth: RetryGrowth::Exponential { factor: 1.5 },
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Three attempts, 100ms apart and growing linearly.
    #[must_use]
    pub const fn quick() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            growth: RetryGrowth::Linear,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Wait before the attempt following failed attempt number `attempt`.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_nanos() as f64;
        let raw = match self.growth {
            RetryGrowth::Exponential { factor } => {
                base * factor.powi(attempt.saturating_sub(1).min(i32::MAX as u32) as i32)
            }
            RetryGrowth::Linear => base * f64::from(attempt.max(1)),
        };
        let capped = raw.min(self.max_delay.as_nanos() as f64);
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_nanos(capped.round() as u64)
        } else {
            self.max_delay
        }
    }

    pub fn validate(&self) -> WidgetResult<()> {
        if self.max_attempts == 0 {
            return Err(WidgetError::Config(
                "retry max_attempts must be >= 1".to_owned(),
            ));
        }
        if let RetryGrowth::Exponential { factor } = self.growth {
            if !factor.is_finite() || factor < 1.0 {
                return Err(WidgetError::Config(
                    "exponential retry factor must be finite and >= 1".to_owned(),
                ));
            }
        }
        if self.base_delay > self.max_delay {
            return Err(WidgetError::Config(
                "retry base_delay must not exceed max_delay".to_owned(),
            ));
        }
        Ok(())
    }

    /// Nearest policy that passes [`Self::validate`].
    ///
    /// Zero attempts become one, a shrinking factor becomes 1 and the base
    /// delay is capped at the max delay.
    #[must_use]
    pub fn clamped(self) -> Self {
        let growth = match self.growth {
            RetryGrowth::Exponential { factor } if !factor.is_finite() || factor < 1.0 => {
                RetryGrowth::Exponential { factor: 1.0 }
            }
            growth => growth,
        };
        Self {
            max_attempts: self.max_attempts.max(1),
            base_delay: self.base_delay.min(self.max_delay),
            growth,
            max_delay: self.max_delay,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpdateId(u64);

impl UpdateId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Succeeded { attempts: u32 },
    /// Every attempt failed; the update is dropped.
    Exhausted {
        attempts: u32,
        last_error: Option<String>,
    },
    /// An attempt failed and another one is scheduled.
    Pending { attempts: u32, next_due: Duration },
}

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub id: UpdateId,
    pub widget_id: String,
    pub outcome: DispatchOutcome,
}

impl DispatchReport {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self.outcome, DispatchOutcome::Pending { .. })
    }
}

struct PendingUpdate {
    id: UpdateId,
    widget: SharedWidget,
    policy: RetryPolicy,
    attempts: u32,
    due: Duration,
}

/// Queue of in-flight updates driven by a host clock.
#[derive(Default)]
pub struct UpdateDispatcher {
    now: Duration,
    next_id: u64,
    pending: Vec<PendingUpdate>,
}

impl UpdateDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the dispatcher was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.now
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|update| update.due).min()
    }

    /// Writes `data` into the widget, then tries to push it right away.
    ///
    /// Updates against the same widget are not coalesced; the last chain to
    /// succeed wins. An invalid `policy` is logged and [clamped](RetryPolicy::clamped).
    pub fn schedule_update(
        &mut self,
        widget: &SharedWidget,
        data: Value,
        policy: RetryPolicy,
    ) -> DispatchReport {
        let policy = match policy.validate() {
            Ok(()) => policy,
            Err(err) => {
                warn!(widget_id = %widget.borrow().id(), error = %err, "retry policy clamped");
                policy.clamped()
            }
        };
        apply_update(&mut widget.borrow_mut(), data);

        let id = UpdateId(self.next_id);
        self.next_id += 1;
        let update = PendingUpdate {
            id,
            widget: widget.clone(),
            policy,
            attempts: 0,
            due: self.now,
        };
        self.run_attempt(update)
    }

    /// Moves the clock forward and runs every attempt that falls due.
    pub fn advance_by(&mut self, elapsed: Duration) -> Vec<DispatchReport> {
        let target = self.now.saturating_add(elapsed);
        let mut reports = Vec::new();
        while let Some(index) = self.next_due_index(target) {
            let update = self.pending.swap_remove(index);
            self.now = self.now.max(update.due);
            reports.push(self.run_attempt(update));
        }
        self.now = target;
        reports
    }

    fn next_due_index(&self, target: Duration) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .filter(|(_, update)| update.due <= target)
            .min_by_key(|(_, update)| (update.due, update.id))
            .map(|(index, _)| index)
    }

    fn run_attempt(&mut self, mut update: PendingUpdate) -> DispatchReport {
        update.attempts += 1;
        let id = update.id;
        let widget_id = update.widget.borrow().id().to_owned();
        let outcome = match push_options(&update.widget) {
            Ok(()) => {
                debug!(widget_id = %widget_id, attempt = update.attempts, "update pushed");
                DispatchOutcome::Succeeded {
                    attempts: update.attempts,
                }
            }
            Err(err) => {
                if let WidgetError::RenderPush(_) = err {
                    warn!(widget_id = %widget_id, attempt = update.attempts, error = %err, "update push failed");
                } else {
                    debug!(widget_id = %widget_id, attempt = update.attempts, "render handle not ready");
                }
                if update.attempts < update.policy.max_attempts {
                    let next_due = self.now + update.policy.delay_after(update.attempts);
                    let attempts = update.attempts;
                    update.due = next_due;
                    self.pending.push(update);
                    DispatchOutcome::Pending { attempts, next_due }
                } else {
                    debug!(widget_id = %widget_id, attempts = update.attempts, "update dropped after retries");
                    DispatchOutcome::Exhausted {
                        attempts: update.attempts,
                        last_error: Some(err.to_string()),
                    }
                }
            }
        };
        DispatchReport {
            id,
            widget_id,
            outcome,
        }
    }
}

fn push_options(widget: &SharedWidget) -> WidgetResult<()> {
    let (handle, options) = {
        let widget = widget.borrow();
        let handle = widget
            .render_handle()
            .ok_or_else(|| WidgetError::HandleUnavailable {
                widget_id: widget.id().to_owned(),
            })?;
        (handle, widget.config.options.clone())
    };
    handle.borrow_mut().set_option(&options, true)
}
