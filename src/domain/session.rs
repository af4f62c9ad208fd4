use super::fees::FeeBreakdown;
use super::method::PaymentMethod;
use super::money::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ANONYMOUS_DONOR: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Donor {
    pub name: String,
    pub email: String,
    pub anonymous: bool,
}

impl Donor {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            anonymous: false,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Self::default()
        }
    }

    /// Name written to the donation ledger.
    pub fn display_name(&self) -> &str {
        if self.anonymous || self.name.trim().is_empty() {
            ANONYMOUS_DONOR
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub title: String,
}

impl Campaign {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Donations not tied to a campaign go to the general fund.
    pub fn general_fund() -> Self {
        Self::new("general", "General Fund")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    MethodSelection,
    QrActive,
    BankDetails,
    CardForm,
    GatewayCheckout,
    Processing,
    Completed,
    Failed,
    Closed,
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MethodSelection => "method_selection",
            Self::QrActive => "qr_active",
            Self::BankDetails => "bank_details",
            Self::CardForm => "card_form",
            Self::GatewayCheckout => "gateway_checkout",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }

    pub fn is_sub_flow(&self) -> bool {
        matches!(
            self,
            Self::QrActive | Self::BankDetails | Self::CardForm | Self::GatewayCheckout
        )
    }

    /// Transitions only move forward, except returning to method selection
    /// (explicit back, gateway dismiss, or after a failure) and switching
    /// between sub-flows.
    pub fn can_transition_to(&self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (MethodSelection, s) => s.is_sub_flow(),
            (s, MethodSelection) if s.is_sub_flow() => true,
            (s, n) if s.is_sub_flow() && n.is_sub_flow() => true,
            (s, Processing) if s.is_sub_flow() => true,
            (Processing, Completed | Failed) => true,
            (Failed, MethodSelection) => true,
            _ => false,
        }
    }
}

/// One donor's attempt to contribute, from opening the payment surface until
/// it is closed or consumed into a donation record.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub id: Uuid,
    pub amount: Amount,
    pub campaign: Campaign,
    pub donor: Donor,
    pub selected_method: Option<PaymentMethod>,
    pub state: CheckoutState,
    pub quote: Option<FeeBreakdown>,
    pub created_at: DateTime<Utc>,
}

impl PaymentSession {
    pub fn new(amount: Amount, campaign: Campaign, donor: Donor) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            campaign,
            donor,
            selected_method: None,
            state: CheckoutState::MethodSelection,
            quote: None,
            created_at: Utc::now(),
        }
    }

    pub fn transition(
        &mut self,
        action: &'static str,
        next: CheckoutState,
    ) -> Result<(), crate::error::PaymentError> {
        if !self.state.can_transition_to(next) {
            return Err(crate::error::PaymentError::InvalidTransition {
                action,
                state: self.state.name(),
            });
        }
        tracing::debug!(
            session = %self.id,
            from = self.state.name(),
            to = next.name(),
            "state transition"
        );
        self.state = next;
        Ok(())
    }

    /// Moves to `Closed` when that is still a legal move. Returns whether it did.
    pub fn close(&mut self) -> bool {
        if !self.state.can_transition_to(CheckoutState::Closed) {
            return false;
        }
        tracing::debug!(session = %self.id, from = self.state.name(), "closing session");
        self.state = CheckoutState::Closed;
        true
    }
}
