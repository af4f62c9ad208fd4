use super::method::PaymentMethod;
use super::money::Money;
use super::session::PaymentSession;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Completed,
    Pending,
    Failed,
}

/// How the payment behind a record was confirmed.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationKind {
    /// The gateway callback was verified by the backend.
    #[default]
    GatewayVerified,
    /// The donor asserted the payment; nothing was verified.
    SelfReported,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DonationRecord {
    pub id: Uuid,
    pub amount: Money,
    pub campaign_id: String,
    pub campaign_title: String,
    pub donor_name: String,
    pub anonymous: bool,
    pub timestamp: DateTime<Utc>,
    pub method: PaymentMethod,
    pub status: DonationStatus,
    pub transaction_id: String,
    #[serde(default)]
    pub confirmation: ConfirmationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_hash: Option<String>,
}

impl DonationRecord {
    /// Builds a completed record for the session's donation amount.
    pub fn completed(
        session: &PaymentSession,
        method: PaymentMethod,
        transaction_id: String,
        confirmation: ConfirmationKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount: Money::from(session.amount),
            campaign_id: session.campaign.id.clone(),
            campaign_title: session.campaign.title.clone(),
            donor_name: session.donor.display_name().to_string(),
            anonymous: session.donor.anonymous,
            timestamp: Utc::now(),
            method,
            status: DonationStatus::Completed,
            transaction_id,
            confirmation,
            blockchain_hash: None,
        }
    }
}

/// Synthesizes a local transaction id: `TXN` + epoch millis + 5 random characters.
pub fn synthesize_transaction_id(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(|c| char::from(c).to_ascii_uppercase())
        .collect();
    format!("TXN{}{}", now.timestamp_millis(), suffix)
}
