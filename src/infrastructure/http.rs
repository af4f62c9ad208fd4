use crate::domain::fees::FeeBreakdown;
use crate::domain::gateway::{
    FeeQuoteRequest, OrderRequest, OrderResponse, VerificationRequest, VerificationResult,
};
use crate::domain::ports::{FeeQuoteService, PaymentBackend};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

pub const FEE_PREVIEW_PATH: &str = "/api/payments/fee-preview";
pub const CREATE_ORDER_PATH: &str = "/api/payments/create-order";
pub const VERIFY_PATH: &str = "/api/payments/verify";

/// Client for the donation backend's payment endpoints.
///
/// Signature checking happens on the backend; this client only relays the
/// gateway's response and reads back `{success}`.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPaymentBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let parsed = reqwest::Url::parse(base_url)
            .map_err(|e| PaymentError::Config(format!("invalid api url `{base_url}`: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PaymentError::Config(format!(
                "unsupported api url scheme `{}`",
                parsed.scheme()
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!(%url, "POST");
        let response = self.client.post(&url).json(body).send().await?;
        let response = response.error_for_status()?;
        Ok(response.json::<R>().await?)
    }
}

#[async_trait]
impl FeeQuoteService for HttpPaymentBackend {
    #[instrument(name = "fee_preview", skip(self))]
    async fn quote(&self, request: FeeQuoteRequest) -> Result<FeeBreakdown> {
        self.post_json(FEE_PREVIEW_PATH, &request)
            .await
            .map_err(|e| PaymentError::FeeQuote(e.to_string()))
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    #[instrument(
        name = "create_order",
        skip(self, request),
        fields(campaign = %request.campaign_id)
    )]
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderResponse> {
        self.post_json(CREATE_ORDER_PATH, request)
            .await
            .map_err(|e| PaymentError::OrderCreation(e.to_string()))
    }

    #[instrument(
        name = "verify_payment",
        skip(self, request),
        fields(order_id = %request.order_id)
    )]
    async fn verify_payment(&self, request: &VerificationRequest) -> Result<VerificationResult> {
        self.post_json(VERIFY_PATH, request).await
    }
}
