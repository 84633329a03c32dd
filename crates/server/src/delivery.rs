//! Delivery adapter boundary
//!
//! The engine never talks to a chat transport directly; it sends and edits
//! messages through this trait. Implementations must distinguish the benign
//! "content unchanged" edit failure from every other failure, because the
//! refresher keeps its binding on the former and tears down on the latter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use staffwatch_protocol::MessageRef;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Edit was a byte-for-byte no-op. Benign.
    #[error("message content unchanged")]
    Unmodified,

    /// Message deleted, chat unreachable, permission revoked, and so on.
    /// Fatal to the binding that targeted it.
    #[error("delivery target unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait Delivery: Send + Sync {
    /// Create a new message, returning a stable handle for later edits.
    async fn send(&self, channel: i64, text: &str) -> Result<MessageRef, DeliveryError>;

    /// Update a previously sent message in place.
    async fn edit(&self, target: MessageRef, text: &str) -> Result<(), DeliveryError>;
}

/// Stdout-backed delivery for running the engine without a chat transport.
/// Message handles are simulated; edits against identical content report
/// `Unmodified` like a real transport would.
#[derive(Default)]
pub struct ConsoleDelivery {
    next_message: AtomicI64,
    contents: Mutex<HashMap<MessageRef, String>>,
}

impl ConsoleDelivery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Delivery for ConsoleDelivery {
    async fn send(&self, channel: i64, text: &str) -> Result<MessageRef, DeliveryError> {
        let target = MessageRef {
            channel,
            message: self.next_message.fetch_add(1, Ordering::Relaxed),
        };
        println!("--- [{}:{}] ---\n{}\n", target.channel, target.message, text);
        self.contents
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(target, text.to_string());
        Ok(target)
    }

    async fn edit(&self, target: MessageRef, text: &str) -> Result<(), DeliveryError> {
        let mut contents = self.contents.lock().unwrap_or_else(|e| e.into_inner());
        match contents.get(&target) {
            None => Err(DeliveryError::Unreachable(format!(
                "no such message {}:{}",
                target.channel, target.message
            ))),
            Some(previous) if previous == text => Err(DeliveryError::Unmodified),
            Some(_) => {
                println!(
                    "--- [{}:{}] (edited) ---\n{}\n",
                    target.channel, target.message, text
                );
                contents.insert(target, text.to_string());
                Ok(())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_edit_of_identical_content_is_unmodified() {
        let delivery = ConsoleDelivery::new();
        let target = delivery.send(1, "hello").await.unwrap();
        let err = delivery.edit(target, "hello").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Unmodified));
    }

    #[tokio::test]
    async fn console_edit_of_unknown_message_is_unreachable() {
        let delivery = ConsoleDelivery::new();
        let err = delivery
            .edit(
                MessageRef {
                    channel: 1,
                    message: 99,
                },
                "text",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Unreachable(_)));
    }

    #[tokio::test]
    async fn console_handles_are_unique_per_send() {
        let delivery = ConsoleDelivery::new();
        let a = delivery.send(1, "a").await.unwrap();
        let b = delivery.send(1, "b").await.unwrap();
        assert_ne!(a, b);
    }
}
