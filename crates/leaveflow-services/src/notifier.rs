//! Leave request notifications
//!
//! `SlackNotifier` posts to a channel through the Slack Web API; `LogNotifier`
//! stands in when no bot token is configured. Delivery always happens on a
//! detached task through [`dispatch`].

use async_trait::async_trait;
use leaveflow_core::{
    config::NotificationConfig, models::LeaveNotification, traits::Notifier, AppError, AppResult,
};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Slack Web API response envelope
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts leave notifications to a Slack channel
pub struct SlackNotifier {
    http_client: Client,
    endpoint: String,
    bot_token: String,
    channel_id: String,
}

impl SlackNotifier {
    pub fn new(bot_token: &str, channel_id: &str, timeout_secs: u64) -> AppResult<Self> {
        let http_client = ClientBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: SLACK_POST_MESSAGE_URL.to_string(),
            bot_token: bot_token.to_string(),
            channel_id: channel_id.to_string(),
        })
    }

    /// Point the notifier at a different API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Block Kit payload for a new leave request
    pub fn message(&self, notification: &LeaveNotification) -> Value {
        let plural = if notification.days > 1 { "s" } else { "" };

        json!({
            "channel": self.channel_id,
            "text": format!("New leave request from {}", notification.employee_name),
            "blocks": [
                {
                    "type": "header",
                    "text": {
                        "type": "plain_text",
                        "text": "🏖️ New Leave Request",
                        "emoji": true
                    }
                },
                {
                    "type": "section",
                    "fields": [
                        {
                            "type": "mrkdwn",
                            "text": format!("*Employee:*\n{}", notification.employee_name)
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!(
                                "*Dates:*\n{} to {}",
                                notification.start_date, notification.end_date
                            )
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!("*Duration:*\n{} day{}", notification.days, plural)
                        },
                        {
                            "type": "mrkdwn",
                            "text": format!(
                                "*Remaining Balance:*\n{} days",
                                notification.remaining_balance
                            )
                        }
                    ]
                },
                {
                    "type": "section",
                    "text": {
                        "type": "mrkdwn",
                        "text": format!("*Reason:*\n{}", notification.reason)
                    }
                }
            ]
        })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    #[instrument(skip(self, notification), fields(employee = %notification.employee_name))]
    async fn leave_requested(&self, notification: &LeaveNotification) -> AppResult<()> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.bot_token)
            .json(&self.message(notification))
            .send()
            .await
            .map_err(|e| AppError::Notification(format!("Slack request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Notification(format!(
                "Slack returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: SlackResponse = response
            .json()
            .await
            .map_err(|e| AppError::Notification(format!("Invalid Slack response: {}", e)))?;

        if !body.ok {
            return Err(AppError::Notification(format!(
                "Slack rejected message: {}",
                body.error.unwrap_or_else(|| "unknown_error".to_string())
            )));
        }

        debug!("Slack notification delivered");
        Ok(())
    }
}

/// Logs the notification it would have sent
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn leave_requested(&self, notification: &LeaveNotification) -> AppResult<()> {
        info!(
            employee = %notification.employee_name,
            start_date = %notification.start_date,
            end_date = %notification.end_date,
            days = notification.days,
            remaining_balance = notification.remaining_balance,
            reason = %notification.reason,
            "Slack not configured, would send leave notification"
        );
        Ok(())
    }
}

/// Pick the notifier for the configured credentials
pub fn notifier_from_config(config: &NotificationConfig) -> AppResult<Arc<dyn Notifier>> {
    match config.slack_credentials() {
        Some((token, channel)) => {
            info!(channel = %channel, "Slack notifications enabled");
            Ok(Arc::new(SlackNotifier::new(
                token,
                channel,
                config.timeout_secs,
            )?))
        }
        None => {
            warn!("Slack bot token or channel not set, notifications will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Deliver a notification on a detached task
///
/// The caller never waits for delivery; failures are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: LeaveNotification) {
    tokio::spawn(async move {
        if let Err(e) = notifier.leave_requested(&notification).await {
            warn!(
                error = %e,
                employee = %notification.employee_name,
                "Failed to send leave notification"
            );
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use parking_lot::Mutex;

    fn notification(days: i32) -> LeaveNotification {
        LeaveNotification {
            employee_name: "John Employee".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            reason: "Family trip".to_string(),
            days,
            remaining_balance: 15,
        }
    }

    #[test]
    fn test_slack_message_blocks() {
        let notifier = SlackNotifier::new("xoxb-test", "C123", 5).unwrap();
        let message = notifier.message(&notification(5));

        assert_eq!(message["channel"], "C123");
        assert_eq!(message["blocks"][0]["text"]["text"], "🏖️ New Leave Request");

        let fields = &message["blocks"][1]["fields"];
        assert_eq!(fields[0]["text"], "*Employee:*\nJohn Employee");
        assert_eq!(fields[1]["text"], "*Dates:*\n2024-01-01 to 2024-01-05");
        assert_eq!(fields[2]["text"], "*Duration:*\n5 days");
        assert_eq!(fields[3]["text"], "*Remaining Balance:*\n15 days");
        assert_eq!(message["blocks"][2]["text"]["text"], "*Reason:*\nFamily trip");
    }

    #[test]
    fn test_single_day_is_not_pluralized() {
        let notifier = SlackNotifier::new("xoxb-test", "C123", 5).unwrap();
        let message = notifier.message(&notification(1));
        assert_eq!(message["blocks"][1]["fields"][2]["text"], "*Duration:*\n1 day");
    }

    #[test]
    fn test_notifier_from_config_falls_back_to_log() {
        assert!(notifier_from_config(&NotificationConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_slack_is_an_error() {
        let notifier = SlackNotifier::new("xoxb-test", "C123", 1)
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/api/chat.postMessage");

        let result = notifier.leave_requested(&notification(2)).await;
        assert!(matches!(result, Err(AppError::Notification(_))));
    }

    struct FailingNotifier {
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn leave_requested(&self, _: &LeaveNotification) -> AppResult<()> {
            *self.calls.lock() += 1;
            Err(AppError::Notification("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let notifier = Arc::new(FailingNotifier {
            calls: Mutex::new(0),
        });

        dispatch(notifier.clone(), notification(3));

        for _ in 0..50 {
            if *notifier.calls.lock() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*notifier.calls.lock(), 1);
    }
}
