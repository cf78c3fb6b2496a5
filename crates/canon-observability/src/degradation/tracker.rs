//! Record every degradation event: component, failure mode, fallback used,
//! timestamp, recovery status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failure mode that pushed a component into degraded operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationKind {
    SourceUnavailable,
    PersistenceFailure,
    EnrichmentFailure,
}

/// Recovery status of a degradation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    /// Still degraded.
    Active,
    /// Back to normal operation.
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradationEvent {
    pub component: String,
    pub kind: DegradationKind,
    pub failure: String,
    pub fallback_used: String,
    pub timestamp: DateTime<Utc>,
    pub recovery_status: RecoveryStatus,
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Tracks degradation events for diagnosis.
///
/// Repeated failures of a component that is already degraded do not add new
/// events; the open event is kept until the component recovers.
#[derive(Debug, Clone, Default)]
pub struct DegradationTracker {
    events: Vec<DegradationEvent>,
    max_events: Option<usize>,
}

impl DegradationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `max_events` events, dropping the oldest recovered ones
    /// first.
    pub fn with_capacity_limit(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events: Some(max_events.max(1)),
        }
    }

    /// Record a degradation. Returns `false` when the component already had
    /// an active event of the same kind.
    pub fn record(
        &mut self,
        component: &str,
        kind: DegradationKind,
        failure: &str,
        fallback_used: &str,
    ) -> bool {
        if self.is_degraded_by(component, kind) {
            return false;
        }
        crate::tracing_setup::events::degradation_triggered(component, failure, fallback_used);
        self.events.push(DegradationEvent {
            component: component.to_string(),
            kind,
            failure: failure.to_string(),
            fallback_used: fallback_used.to_string(),
            timestamp: Utc::now(),
            recovery_status: RecoveryStatus::Active,
            recovered_at: None,
        });
        self.enforce_limit();
        true
    }

    /// Close every active event for `component`. Returns how many closed.
    pub fn mark_recovered(&mut self, component: &str) -> usize {
        let now = Utc::now();
        let mut closed = 0;
        for event in self
            .events
            .iter_mut()
            .filter(|e| e.component == component && e.recovery_status == RecoveryStatus::Active)
        {
            event.recovery_status = RecoveryStatus::Recovered;
            event.recovered_at = Some(now);
            closed += 1;
        }
        if closed > 0 {
            tracing::info!(component, "component recovered");
        }
        closed
    }

    pub fn events(&self) -> &[DegradationEvent] {
        &self.events
    }

    pub fn active(&self) -> Vec<&DegradationEvent> {
        self.events
            .iter()
            .filter(|e| e.recovery_status == RecoveryStatus::Active)
            .collect()
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.component == component && e.recovery_status == RecoveryStatus::Active)
    }

    fn is_degraded_by(&self, component: &str, kind: DegradationKind) -> bool {
        self.events.iter().any(|e| {
            e.component == component
                && e.kind == kind
                && e.recovery_status == RecoveryStatus::Active
        })
    }

    /// How long `component` has been continuously degraded.
    pub fn degraded_duration(&self, component: &str) -> Option<chrono::Duration> {
        let earliest = self
            .events
            .iter()
            .filter(|e| e.component == component && e.recovery_status == RecoveryStatus::Active)
            .map(|e| e.timestamp)
            .min()?;
        Some(Utc::now() - earliest)
    }

    fn enforce_limit(&mut self) {
        let Some(max) = self.max_events else {
            return;
        };
        while self.events.len() > max {
            let victim = self
                .events
                .iter()
                .position(|e| e.recovery_status == RecoveryStatus::Recovered)
                .unwrap_or(0);
            self.events.remove(victim);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_failures_keep_one_open_event() {
        let mut tracker = DegradationTracker::new();
        assert!(tracker.record("secondary", DegradationKind::SourceUnavailable, "down", "empty"));
        assert!(!tracker.record("secondary", DegradationKind::SourceUnavailable, "down", "empty"));
        assert_eq!(tracker.active().len(), 1);
        assert!(tracker.is_degraded("secondary"));
        assert!(tracker.degraded_duration("secondary").is_some());
    }

    #[test]
    fn recovery_closes_and_allows_new_event() {
        let mut tracker = DegradationTracker::new();
        tracker.record("store", DegradationKind::PersistenceFailure, "disk full", "memory");
        assert_eq!(tracker.mark_recovered("store"), 1);
        assert!(!tracker.is_degraded("store"));
        assert!(tracker.events()[0].recovered_at.is_some());
        assert!(tracker.record("store", DegradationKind::PersistenceFailure, "again", "memory"));
        assert_eq!(tracker.events().len(), 2);
    }

    #[test]
    fn capacity_limit_drops_recovered_first() {
        let mut tracker = DegradationTracker::with_capacity_limit(2);
        tracker.record("a", DegradationKind::SourceUnavailable, "x", "y");
        tracker.mark_recovered("a");
        tracker.record("b", DegradationKind::SourceUnavailable, "x", "y");
        tracker.record("c", DegradationKind::SourceUnavailable, "x", "y");
        let components: Vec<_> = tracker.events().iter().map(|e| e.component.as_str()).collect();
        assert_eq!(components, vec!["b", "c"]);
    }
}
