use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use crate::errors::HandlerError;
use crate::handle::SubscriptionHandle;

/// One recorded subscriber failure within a publish.
#[derive(Debug)]
pub struct Failure {
    /// Handle of the subscriber whose callback failed.
    pub handle: SubscriptionHandle,
    /// The error the callback reported.
    pub error: HandlerError,
    /// When the failure was observed.
    pub when: DateTime<Utc>,
}

/// Aggregated result of a single publish call.
///
/// Publishing to a topic with no subscribers is not an error; it yields an
/// outcome with `invoked() == 0` so the caller can inspect the silence.
/// Failing subscribers still count as invoked and appear in [`failures`]
/// in invocation order; the caller decides whether to log, retry, or
/// escalate.
///
/// [`failures`]: PublishOutcome::failures
#[derive(Debug, Default)]
pub struct PublishOutcome {
    invoked: usize,
    failures: Vec<Failure>,
}

impl PublishOutcome {
    /// Count one successful subscriber invocation.
    ///
    /// Exposed for [`DispatchStrategy`](crate::DispatchStrategy)
    /// implementations assembling their own outcome.
    pub fn record_invoked(&mut self) {
        self.invoked += 1;
    }

    /// Count one failed subscriber invocation and keep its error.
    pub fn record_failure(&mut self, handle: SubscriptionHandle, error: HandlerError) {
        self.invoked += 1;
        self.failures.push(Failure {
            handle,
            error,
            when: Utc::now(),
        });
    }

    /// Number of subscribers this publish invoked, failures included.
    pub fn invoked(&self) -> usize {
        self.invoked
    }

    /// Number of subscribers that completed without error.
    pub fn delivered(&self) -> usize {
        self.invoked - self.failures.len()
    }

    /// Failures in invocation order.
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// True when every invoked subscriber completed without error.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// True when at least one subscriber was registered for the topic.
    pub fn had_subscribers(&self) -> bool {
        self.invoked > 0
    }

    /// Structured JSON view for logging pipelines.
    ///
    /// ```
    /// use crier::PublishOutcome;
    ///
    /// let outcome = PublishOutcome::default();
    /// let json = outcome.to_json_value();
    /// assert_eq!(json["invoked"], 0);
    /// assert_eq!(json["failures"].as_array().unwrap().len(), 0);
    /// ```
    pub fn to_json_value(&self) -> Value {
        let failures: Vec<Value> = self
            .failures
            .iter()
            .map(|failure| {
                json!({
                    "handle": failure.handle.sequence(),
                    "error": failure.error.to_string(),
                    "when": failure.when.to_rfc3339(),
                })
            })
            .collect();

        json!({
            "invoked": self.invoked,
            "delivered": self.delivered(),
            "failures": failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::any::TypeId;

    use super::*;

    fn handle(seq: u64) -> SubscriptionHandle {
        SubscriptionHandle {
            topic: TypeId::of::<()>(),
            seq,
        }
    }

    #[test]
    fn json_projection_lists_failures_in_order() {
        let mut outcome = PublishOutcome::default();
        outcome.record_invoked();
        outcome.record_failure(handle(7), HandlerError::msg("boom"));
        outcome.record_failure(handle(9), HandlerError::msg("bust"));

        let json = outcome.to_json_value();
        assert_eq!(json["invoked"], 3);
        assert_eq!(json["delivered"], 1);
        assert_eq!(json["failures"][0]["handle"], 7);
        assert_eq!(json["failures"][0]["error"], "boom");
        assert_eq!(json["failures"][1]["handle"], 9);
    }

    #[test]
    fn counts_track_invocations() {
        let mut outcome = PublishOutcome::default();
        assert!(outcome.is_clean());
        assert!(!outcome.had_subscribers());

        outcome.record_invoked();
        outcome.record_failure(handle(1), HandlerError::msg("x"));

        assert_eq!(outcome.invoked(), 2);
        assert_eq!(outcome.delivered(), 1);
        assert!(!outcome.is_clean());
        assert!(outcome.had_subscribers());
    }
}
