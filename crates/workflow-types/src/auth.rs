//! Authentication, retry and trigger configuration
//!
//! These describe how an execution engine should call out, retry and start
//! runs. The editor only carries them through.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    ApiKey,
    BearerToken,
    BasicAuth,
    Oauth2,
}

/// Credentials used when calling an external service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(rename = "type", default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub credentials: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_valid: Option<bool>,
}

impl AuthConfig {
    /// Whether the credentials carry an expiry at or before `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Linear,
    #[default]
    Exponential,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryConditionType {
    StatusCode,
    ErrorType,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryCondition {
    #[serde(rename = "type")]
    pub condition_type: RetryConditionType,
    #[serde(default)]
    pub value: Value,
}

/// Retry policy for outbound calls
///
/// Delays are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub backoff_strategy: BackoffStrategy,
    pub base_delay: u64,
    pub max_delay: u64,
    pub retry_conditions: Vec<RetryCondition>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_attempts: 3,
            backoff_strategy: BackoffStrategy::default(),
            base_delay: 1000,
            max_delay: 30000,
            retry_conditions: Vec::new(),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based)
    ///
    /// Returns None when retries are disabled or `attempt` is outside
    /// `1..=max_attempts`. The result never exceeds `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled || attempt == 0 || attempt > self.max_attempts {
            return None;
        }

        let delay = match self.backoff_strategy {
            BackoffStrategy::Fixed => self.base_delay,
            BackoffStrategy::Linear => self.base_delay.saturating_mul(u64::from(attempt)),
            BackoffStrategy::Exponential => {
                let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
                self.base_delay.saturating_mul(factor)
            }
        };

        Some(Duration::from_millis(delay.min(self.max_delay)))
    }
}

/// Registration of an inbound webhook endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    pub id: String,
    pub workflow_id: String,
    pub service: String,
    pub endpoint: String,
    pub secret: String,
    #[serde(default)]
    pub events: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Webhook,
    Schedule,
    Manual,
    Event,
}

/// What starts a run of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    /// Opaque trigger-specific settings
    #[serde(default)]
    pub config: Map<String, Value>,
    pub is_active: bool,
}
