use crate::domain::ports::ClipboardArc;
use crate::error::Result;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyTarget {
    UpiId,
    BankAccount,
    Reference,
    UpiUrl,
}

/// Copies payment details and remembers which one was copied for a short
/// acknowledgement window. Expiry is checked lazily; no timer is spawned.
pub struct CopyFeedback {
    clipboard: ClipboardArc,
    ack: Duration,
    copied: Option<(CopyTarget, Instant)>,
}

impl CopyFeedback {
    pub fn new(clipboard: ClipboardArc, ack: Duration) -> Self {
        Self {
            clipboard,
            ack,
            copied: None,
        }
    }

    pub fn copy(&mut self, target: CopyTarget, text: &str) -> Result<()> {
        self.clipboard.write_text(text)?;
        self.copied = Some((target, Instant::now() + self.ack));
        Ok(())
    }

    /// Whether `target` should currently show its "copied" state.
    pub fn is_copied(&self, target: CopyTarget) -> bool {
        matches!(self.copied, Some((t, until)) if t == target && Instant::now() < until)
    }

    pub fn reset(&mut self) {
        self.copied = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryClipboard;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_acknowledgement_expires() {
        let clipboard = InMemoryClipboard::new();
        let mut feedback = CopyFeedback::new(Arc::new(clipboard.clone()), Duration::from_secs(2));

        feedback.copy(CopyTarget::UpiId, "donate@okbank").unwrap();
        assert_eq!(clipboard.contents().as_deref(), Some("donate@okbank"));
        assert!(feedback.is_copied(CopyTarget::UpiId));
        assert!(!feedback.is_copied(CopyTarget::Reference));

        tokio::time::advance(Duration::from_millis(1_999)).await;
        assert!(feedback.is_copied(CopyTarget::UpiId));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(!feedback.is_copied(CopyTarget::UpiId));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_copy_replaces_previous() {
        let mut feedback =
            CopyFeedback::new(Arc::new(InMemoryClipboard::new()), Duration::from_secs(2));
        feedback.copy(CopyTarget::BankAccount, "50100234567890").unwrap();
        feedback.copy(CopyTarget::Reference, "DON-1").unwrap();
        assert!(!feedback.is_copied(CopyTarget::BankAccount));
        assert!(feedback.is_copied(CopyTarget::Reference));
        feedback.reset();
        assert!(!feedback.is_copied(CopyTarget::Reference));
    }
}
