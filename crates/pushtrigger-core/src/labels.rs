//! Per-push job metadata.

use crate::postsubmit::Labels;

/// Label carrying the delivery identifier of the push that triggered a job.
pub const EVENT_GUID_LABEL: &str = "event-GUID";

/// Copy a job's labels and stamp the triggering event's identifier.
///
/// The job definition's map is left untouched; an existing
/// [`EVENT_GUID_LABEL`] entry is overwritten in the copy.
pub fn assemble_labels(job_labels: &Labels, event_guid: &str) -> Labels {
    let mut labels = job_labels.clone();
    labels.insert(EVENT_GUID_LABEL.to_string(), event_guid.to_string());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_guid_is_added() {
        let mut job_labels = Labels::new();
        job_labels.insert("team".to_string(), "infra".to_string());

        let labels = assemble_labels(&job_labels, "delivery-1");
        assert_eq!(labels.len(), 2);
        assert_eq!(labels["team"], "infra");
        assert_eq!(labels[EVENT_GUID_LABEL], "delivery-1");
    }

    #[test]
    fn test_injected_guid_wins_and_original_is_untouched() {
        let mut job_labels = Labels::new();
        job_labels.insert(EVENT_GUID_LABEL.to_string(), "stale".to_string());

        let labels = assemble_labels(&job_labels, "delivery-2");
        assert_eq!(labels[EVENT_GUID_LABEL], "delivery-2");
        assert_eq!(job_labels[EVENT_GUID_LABEL], "stale");
        assert_eq!(job_labels.len(), 1);
    }
}
