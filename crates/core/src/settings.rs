//! Per-project rate limit settings and the override-priority merge.

use serde::{Deserialize, Serialize};

/// Event quota for a project: at most `events_limit` events per
/// `events_period` seconds. A zero limit means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSettings {
    #[serde(rename = "eventsLimit", alias = "N", default)]
    pub events_limit: u64,
    #[serde(rename = "eventsPeriod", alias = "T", default)]
    pub events_period: u64,
}

impl RateLimitSettings {
    pub const UNLIMITED: Self = Self {
        events_limit: 0,
        events_period: 0,
    };

    pub const fn new(events_limit: u64, events_period: u64) -> Self {
        Self {
            events_limit,
            events_period,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.events_limit == 0
    }

    /// Overwrite each field of `self` with the matching field of `layer` when
    /// that field is non-zero.
    fn override_with(mut self, layer: &RateLimitSettings) -> Self {
        if layer.events_limit > 0 {
            self.events_limit = layer.events_limit;
        }
        if layer.events_period > 0 {
            self.events_period = layer.events_period;
        }
        self
    }
}

/// Compute effective limits from three optional layers.
///
/// Starts from the plan (reachable only through a workspace), then applies
/// non-zero workspace fields, then non-zero project fields. Zero means
/// "not set" at every layer.
pub fn effective_limits(
    plan: Option<&RateLimitSettings>,
    workspace: Option<&RateLimitSettings>,
    project: Option<&RateLimitSettings>,
) -> RateLimitSettings {
    let mut limits = plan.copied().unwrap_or_default();
    if let Some(workspace) = workspace {
        limits = limits.override_with(workspace);
    }
    if let Some(project) = project {
        limits = limits.override_with(project);
    }
    limits
}
