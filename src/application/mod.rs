//! Application layer containing the checkout orchestration.
//!
//! This module defines the `PaymentOrchestrator`, which drives one donation
//! session through method selection, payment and confirmation, and the
//! components it composes: the QR session timer, the gateway order client,
//! the self-reported confirmation flow and the donation ledger.

pub mod clipboard;
pub mod confirmation;
pub mod gateway_client;
pub mod ledger;
pub mod orchestrator;
pub mod qr_session;
