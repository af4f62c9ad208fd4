use crate::domain::money::Money;
use crate::domain::upi::{QrCountdown, QrPaymentSession, QrTick, UpiPayee};
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info};

const TICK: Duration = Duration::from_secs(1);

/// What the QR view renders at a given moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSnapshot {
    pub time_left: u32,
    pub refresh_key: u64,
    /// Ticks observed since activation.
    pub ticks: u64,
    pub session: QrPaymentSession,
}

/// Owned one-second timer. Dropping it stops the countdown.
struct QrTimer {
    handle: JoinHandle<()>,
}

impl Drop for QrTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Time-boxed UPI session: counts down once per second and regenerates the
/// deep link whenever the window runs out.
///
/// Must be activated inside a tokio runtime.
pub struct QrSessionManager {
    snapshot: watch::Receiver<QrSnapshot>,
    timer: Option<QrTimer>,
}

impl QrSessionManager {
    pub fn activate(payee: UpiPayee, campaign_title: String, amount: Money, ttl_secs: u32) -> Self {
        let mut countdown = QrCountdown::new(ttl_secs);
        let session =
            QrPaymentSession::issue(&payee, &campaign_title, amount, Utc::now(), ttl_secs);
        info!(reference = %session.reference_id, ttl_secs, "qr session activated");

        let initial = QrSnapshot {
            time_left: countdown.time_left(),
            refresh_key: countdown.refresh_key(),
            ticks: 0,
            session,
        };
        let (tx, rx) = watch::channel(initial.clone());

        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + TICK, TICK);
            let mut current = initial;
            loop {
                interval.tick().await;
                current.ticks += 1;
                match countdown.tick() {
                    QrTick::Ticked { time_left } => current.time_left = time_left,
                    QrTick::Refreshed { refresh_key } => {
                        current.session = current.session.refreshed(
                            &payee,
                            &campaign_title,
                            amount,
                            Utc::now(),
                            ttl_secs,
                        );
                        current.time_left = countdown.time_left();
                        current.refresh_key = refresh_key;
                        info!(
                            refresh_key,
                            reference = %current.session.reference_id,
                            "qr session refreshed"
                        );
                    }
                }
                if tx.send(current.clone()).is_err() {
                    break;
                }
            }
        });

        Self {
            snapshot: rx,
            timer: Some(QrTimer { handle }),
        }
    }

    pub fn snapshot(&self) -> QrSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QrSnapshot> {
        self.snapshot.clone()
    }

    pub fn deep_link(&self) -> String {
        self.snapshot.borrow().session.deep_link.clone()
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }

    /// Stops the countdown. No tick is delivered after this returns.
    pub fn deactivate(&mut self) {
        if self.timer.take().is_some() {
            debug!("qr session timer stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn activate() -> QrSessionManager {
        QrSessionManager::activate(
            UpiPayee {
                upi_id: "donate@okbank".into(),
                name: "HelpingHands".into(),
                currency: "INR".into(),
            },
            "Clean Water".into(),
            Money::new(dec!(510)),
            300,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_counts_down_each_second() {
        let manager = activate();
        assert_eq!(manager.snapshot().time_left, 300);

        tokio::time::sleep(Duration::from_millis(10_500)).await;
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.ticks, 10);
        assert_eq!(snapshot.time_left, 290);
        assert_eq!(snapshot.refresh_key, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_once_after_301_seconds() {
        let manager = activate();
        let first_link = manager.deep_link();
        let first_expiry = manager.snapshot().session.expires_at;

        tokio::time::sleep(Duration::from_millis(301_500)).await;
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.refresh_key, 1);
        assert_eq!(snapshot.time_left, 299);
        assert_eq!(snapshot.session.refresh_count, 1);
        assert_ne!(snapshot.session.deep_link, first_link);
        assert!(snapshot.session.expires_at > first_expiry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_deactivate() {
        let mut manager = activate();
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        manager.deactivate();
        let frozen = manager.snapshot();
        assert!(!manager.is_active());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(manager.snapshot(), frozen);
        assert_eq!(frozen.ticks, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_manager_stops_timer() {
        let manager = activate();
        let rx = manager.subscribe();
        drop(manager);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!rx.has_changed().unwrap_or(false));
    }
}
