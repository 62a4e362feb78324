pub mod sns;

use std::future::Future;

use tracing::{info, warn};

use crate::errors::Result;

pub use sns::SnsNotifier;

pub const EXTRACTION_FAILED_SUBJECT: &str = "MySQL sync error";
pub const NO_NEW_ROWS_SUBJECT: &str = "New row extraction Lambda function error";
pub const NO_NEW_ROWS_MESSAGE: &str = "No new rows were found";
pub const LOAD_FAILED_SUBJECT: &str = "Redshift upload Lambda function error";

/// Fire-and-forget message sink used for failure and empty-delta reports.
pub trait Notifier: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        subject: &str,
        message: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub message: String,
}

impl Notification {
    pub fn extraction_failed(error: &dyn std::fmt::Display) -> Self {
        Self {
            subject: EXTRACTION_FAILED_SUBJECT.to_string(),
            message: error.to_string(),
        }
    }

    pub fn no_new_rows() -> Self {
        Self {
            subject: NO_NEW_ROWS_SUBJECT.to_string(),
            message: NO_NEW_ROWS_MESSAGE.to_string(),
        }
    }

    pub fn load_failed(error: &dyn std::fmt::Display) -> Self {
        Self {
            subject: LOAD_FAILED_SUBJECT.to_string(),
            message: error.to_string(),
        }
    }
}

/// Publishes `notification`, logging instead of returning a sink failure so
/// that the caller's own outcome is what propagates.
pub async fn publish_best_effort<N: Notifier>(notifier: &N, topic: &str, notification: &Notification) {
    match notifier
        .publish(topic, &notification.subject, &notification.message)
        .await
    {
        Ok(()) => info!("Published notification '{}' to {}", notification.subject, topic),
        Err(e) => warn!(
            "Failed to publish notification '{}' to {}: {}",
            notification.subject, topic, e
        ),
    }
}
