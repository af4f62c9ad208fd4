use super::money::Money;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Merchant the UPI app pays to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpiPayee {
    pub upi_id: String,
    pub name: String,
    /// ISO code sent as `cu`.
    pub currency: String,
}

/// Transaction reference embedded in the deep link: `<title>-<epochMillis>-<refreshKey>`.
pub fn reference_id(campaign_title: &str, epoch_millis: i64, refresh_key: u64) -> String {
    format!("{campaign_title}-{epoch_millis}-{refresh_key}")
}

/// Builds the `upi://pay` deep link. The layout is fixed; UPI apps parse it verbatim.
pub fn deep_link(
    payee: &UpiPayee,
    campaign_title: &str,
    reference: &str,
    amount: Money,
) -> String {
    format!(
        "upi://pay?pa={}&pn={}&tr={}&tn=Donation for {}&am={}&cu={}",
        payee.upi_id, payee.name, reference, campaign_title, amount, payee.currency
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrPaymentSession {
    pub merchant_upi_id: String,
    pub reference_id: String,
    pub deep_link: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_count: u64,
}

impl QrPaymentSession {
    pub fn issue(
        payee: &UpiPayee,
        campaign_title: &str,
        amount: Money,
        now: DateTime<Utc>,
        ttl_secs: u32,
    ) -> Self {
        let reference = reference_id(campaign_title, now.timestamp_millis(), 0);
        Self {
            merchant_upi_id: payee.upi_id.clone(),
            deep_link: deep_link(payee, campaign_title, &reference, amount),
            reference_id: reference,
            expires_at: now + Duration::seconds(i64::from(ttl_secs)),
            refresh_count: 0,
        }
    }

    /// Replaces the reference after expiry. The new window starts where the old
    /// one ended, so `expires_at` strictly increases.
    pub fn refreshed(
        &self,
        payee: &UpiPayee,
        campaign_title: &str,
        amount: Money,
        now: DateTime<Utc>,
        ttl_secs: u32,
    ) -> Self {
        let refresh_count = self.refresh_count + 1;
        let reference = reference_id(campaign_title, now.timestamp_millis(), refresh_count);
        Self {
            merchant_upi_id: payee.upi_id.clone(),
            deep_link: deep_link(payee, campaign_title, &reference, amount),
            reference_id: reference,
            expires_at: self.expires_at + Duration::seconds(i64::from(ttl_secs)),
            refresh_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrTick {
    Ticked { time_left: u32 },
    Refreshed { refresh_key: u64 },
}

/// Countdown driving the QR session, advanced once per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrCountdown {
    ttl: u32,
    time_left: u32,
    refresh_key: u64,
}

impl QrCountdown {
    pub fn new(ttl: u32) -> Self {
        let ttl = ttl.max(1);
        Self {
            ttl,
            time_left: ttl,
            refresh_key: 0,
        }
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    /// Reaching zero refreshes immediately, so `time_left` is never observed at 0.
    pub fn tick(&mut self) -> QrTick {
        if self.time_left > 1 {
            self.time_left -= 1;
            QrTick::Ticked {
                time_left: self.time_left,
            }
        } else {
            self.refresh_key += 1;
            self.time_left = self.ttl;
            QrTick::Refreshed {
                refresh_key: self.refresh_key,
            }
        }
    }
}

/// Illustrative QR-like matrix derived from the deep link.
///
/// This is not a standards-compliant QR encoding; it only gives the donor a
/// stable visual that changes whenever the link changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPattern {
    size: usize,
    cells: Vec<bool>,
}

impl QrPattern {
    pub const DEFAULT_SIZE: usize = 25;

    pub fn from_link(link: &str, size: usize) -> Self {
        let size = size.max(21);
        let seed = fnv1a(link.as_bytes());
        let mut cells = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                let cell = match finder_cell(row, col, size) {
                    Some(dark) => dark,
                    None => {
                        let position = (row as u64) << 32 | col as u64;
                        let mixed = seed ^ position.wrapping_mul(0x9E37_79B9_7F4A_7C15);
                        fnv1a(&mixed.to_le_bytes()) & 1 == 1
                    }
                };
                cells.push(cell);
            }
        }
        Self { size, cells }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_dark(&self, row: usize, col: usize) -> bool {
        self.cells[row * self.size + col]
    }

    /// Two characters per module so the output is roughly square in a terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::with_capacity(self.size * (self.size * 2 + 1));
        for row in 0..self.size {
            for col in 0..self.size {
                out.push_str(if self.is_dark(row, col) { "██" } else { "  " });
            }
            out.push('\n');
        }
        out
    }
}

/// Position markers in three corners, 7x7 with a separator ring.
fn finder_cell(row: usize, col: usize, size: usize) -> Option<bool> {
    let origins = [(0, 0), (0, size - 7), (size - 7, 0)];
    for (r0, c0) in origins {
        let in_zone = row + 1 >= r0 && row <= r0 + 7 && col + 1 >= c0 && col <= c0 + 7;
        if !in_zone {
            continue;
        }
        if row < r0 || col < c0 || row >= r0 + 7 || col >= c0 + 7 {
            return Some(false);
        }
        let (r, c) = (row - r0, col - c0);
        let ring = r == 0 || r == 6 || c == 0 || c == 6;
        let core = (2..=4).contains(&r) && (2..=4).contains(&c);
        return Some(ring || core);
    }
    None
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payee() -> UpiPayee {
        UpiPayee {
            upi_id: "donate@okbank".into(),
            name: "HelpingHands".into(),
            currency: "INR".into(),
        }
    }

    #[test]
    fn test_deep_link_layout() {
        let reference = reference_id("Clean Water", 1_700_000_000_000, 2);
        let link = deep_link(&payee(), "Clean Water", &reference, Money::new(dec!(1020.00)));
        assert_eq!(
            link,
            "upi://pay?pa=donate@okbank&pn=HelpingHands&tr=Clean Water-1700000000000-2&tn=Donation for Clean Water&am=1020&cu=INR"
        );
    }

    #[test]
    fn test_deep_link_uses_payee_currency() {
        let payee = UpiPayee {
            currency: "USD".into(),
            ..payee()
        };
        let link = deep_link(&payee, "Clean Water", "ref-1", Money::new(dec!(10)));
        assert!(link.ends_with("&am=10&cu=USD"));
    }

    #[test]
    fn test_countdown_refreshes_after_full_window() {
        let mut countdown = QrCountdown::new(300);
        for _ in 0..299 {
            assert!(matches!(countdown.tick(), QrTick::Ticked { .. }));
        }
        assert_eq!(countdown.time_left(), 1);
        assert_eq!(countdown.tick(), QrTick::Refreshed { refresh_key: 1 });
        assert_eq!(countdown.time_left(), 300);
        assert_eq!(countdown.refresh_key(), 1);
    }

    #[test]
    fn test_countdown_after_301_ticks() {
        let mut countdown = QrCountdown::new(300);
        for _ in 0..301 {
            countdown.tick();
        }
        assert_eq!(countdown.refresh_key(), 1);
        assert_eq!(countdown.time_left(), 299);
    }

    #[test]
    fn test_refresh_changes_link_and_extends_expiry() {
        let now = Utc::now();
        let amount = Money::new(dec!(500));
        let first = QrPaymentSession::issue(&payee(), "Clean Water", amount, now, 300);
        let second = first.refreshed(&payee(), "Clean Water", amount, now, 300);
        let third = second.refreshed(&payee(), "Clean Water", amount, now, 300);

        assert_ne!(first.deep_link, second.deep_link);
        assert_ne!(second.deep_link, third.deep_link);
        assert!(second.expires_at > first.expires_at);
        assert!(third.expires_at > second.expires_at);
        assert_eq!(third.refresh_count, 2);
        assert!(third.reference_id.ends_with("-2"));
    }

    #[test]
    fn test_pattern_is_deterministic() {
        let a = QrPattern::from_link("upi://pay?pa=x", QrPattern::DEFAULT_SIZE);
        let b = QrPattern::from_link("upi://pay?pa=x", QrPattern::DEFAULT_SIZE);
        let c = QrPattern::from_link("upi://pay?pa=y", QrPattern::DEFAULT_SIZE);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.is_dark(0, 0));
        assert!(!a.is_dark(7, 7));
        assert_eq!(a.render_text().lines().count(), QrPattern::DEFAULT_SIZE);
    }
}
