use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};

use crate::{
    config::EmailConfig,
    services::email_service::{EmailMessage, Mailer},
};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: config.retry_base_delay,
            max_delay: MAX_RETRY_DELAY,
        }
    }

    /// Wait before retry number `attempt` (1-based): doubles each time, capped.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

/// Handle for queueing emails. Request handlers hand messages over and move
/// on; a single worker task owns delivery.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<EmailMessage>,
}

impl Notifier {
    pub fn spawn(
        mailer: Arc<dyn Mailer>,
        policy: RetryPolicy,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(rx, mailer, policy));
        (Self { tx }, handle)
    }

    /// Never waits and never fails the caller.
    pub fn dispatch(&self, message: EmailMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(TrySendError::Full(message)) => {
                tracing::warn!(
                    "Email queue full, dropping {} to {}",
                    message.kind.as_str(),
                    message.to
                );
            }
            Err(TrySendError::Closed(message)) => {
                tracing::error!(
                    "Email worker stopped, dropping {} to {}",
                    message.kind.as_str(),
                    message.to
                );
            }
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<EmailMessage>,
    mailer: Arc<dyn Mailer>,
    policy: RetryPolicy,
) {
    tracing::info!("Email worker started");

    while let Some(message) = rx.recv().await {
        deliver(mailer.as_ref(), &policy, &message).await;
    }

    tracing::info!("Email worker drained, shutting down");
}

async fn deliver(mailer: &dyn Mailer, policy: &RetryPolicy, message: &EmailMessage) -> bool {
    for attempt in 1..=policy.max_attempts {
        match mailer.send(message).await {
            Ok(()) => {
                tracing::info!("Sent {} to {}", message.kind.as_str(), message.to);
                return true;
            }
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "Attempt {}/{} for {} to {} failed: {}. Retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    message.kind.as_str(),
                    message.to,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(
                    "Giving up on {} to {} after {} attempts: {}",
                    message.kind.as_str(),
                    message.to,
                    policy.max_attempts,
                    e
                );
            }
        }
    }
    false
}
