use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Upi,
    NetBanking,
    Card,
    Wallet,
}

/// The sub-flow a method activates once selected.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SubFlowKind {
    QrSession,
    BankDetails,
    CardForm,
    GatewayCheckout,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [Self::Upi, Self::NetBanking, Self::Card, Self::Wallet];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Upi => "upi",
            Self::NetBanking => "netbanking",
            Self::Card => "card",
            Self::Wallet => "wallet",
        }
    }

    pub fn sub_flow(&self) -> SubFlowKind {
        match self {
            Self::Upi => SubFlowKind::QrSession,
            Self::NetBanking => SubFlowKind::BankDetails,
            Self::Card => SubFlowKind::CardForm,
            Self::Wallet => SubFlowKind::GatewayCheckout,
        }
    }

    pub fn info(&self) -> &'static MethodInfo {
        // REGISTRY is ordered like ALL
        &REGISTRY[*self as usize]
    }
}

impl FromStr for PaymentMethod {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "upi" => Ok(Self::Upi),
            "netbanking" | "net_banking" | "bank" => Ok(Self::NetBanking),
            "card" => Ok(Self::Card),
            "wallet" => Ok(Self::Wallet),
            other => Err(PaymentError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A catalog entry shown on the method selection screen.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MethodInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub instant: bool,
    pub popular: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_fee_label: Option<&'static str>,
}

static REGISTRY: [MethodInfo; 4] = [
    MethodInfo {
        id: "upi",
        name: "UPI",
        instant: true,
        popular: true,
        processing_fee_label: Some("No processing fee"),
    },
    MethodInfo {
        id: "netbanking",
        name: "Net Banking",
        instant: false,
        popular: false,
        processing_fee_label: Some("1.9% processing fee"),
    },
    MethodInfo {
        id: "card",
        name: "Credit/Debit Card",
        instant: true,
        popular: true,
        processing_fee_label: Some("2.4% processing fee"),
    },
    MethodInfo {
        id: "wallet",
        name: "Wallets",
        instant: true,
        popular: false,
        processing_fee_label: None,
    },
];

/// Static catalog of supported payment methods.
pub struct PaymentMethodRegistry;

impl PaymentMethodRegistry {
    pub fn entries() -> &'static [MethodInfo] {
        &REGISTRY
    }

    pub fn lookup(id: &str) -> Result<PaymentMethod, PaymentError> {
        id.parse()
    }
}
