mod common;

use common::Harness;
use donapay::application::orchestrator::CheckoutOutcome;
use donapay::config::CheckoutConfig;
use donapay::domain::donation::ConfirmationKind;
use donapay::domain::method::PaymentMethod;
use donapay::domain::ports::NotificationLevel;
use donapay::domain::session::CheckoutState;
use donapay::error::PaymentError;
use rust_decimal_macros::dec;

#[tokio::test(start_paused = true)]
async fn test_wallet_payment_verified_and_recorded() {
    let h = Harness::new();
    let mut checkout = h.open(dec!(1000));

    checkout.select_method(PaymentMethod::Wallet).await.unwrap();
    assert_eq!(checkout.state(), CheckoutState::MethodSelection);

    let token = checkout.pay().await.unwrap();
    assert_eq!(checkout.state(), CheckoutState::GatewayCheckout);

    let opened = h.widget.opened();
    assert_eq!(opened.len(), 1);
    let options = &opened[0];
    // 1000 + 20 platform + 19 processing + 7.02 GST, in paise.
    assert_eq!(options.amount, 104_602);
    assert_eq!(options.currency, "INR");
    assert_eq!(options.prefill.name, "Asha");
    assert_eq!(options.theme.color, "#10B981");
    assert!(options.method.upi && options.method.card && options.method.wallet);

    let response = h.widget.pay(&options.order_id);
    let outcome = checkout.on_gateway_response(token, response.clone()).await.unwrap();
    let CheckoutOutcome::Completed(record) = outcome else {
        panic!("expected completion");
    };
    assert_eq!(record.transaction_id, response.payment_id);
    assert_eq!(record.confirmation, ConfirmationKind::GatewayVerified);
    assert_eq!(checkout.state(), CheckoutState::Completed);
    assert_eq!(h.backend.verify_calls(), 1);
    assert_eq!(h.records().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_order_failure_keeps_widget_closed() {
    let h = Harness::new();
    h.backend.fail_orders(true);
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    let result = checkout.pay().await;
    assert!(matches!(result, Err(PaymentError::OrderCreation(_))));
    assert!(h.widget.opened().is_empty());
    assert_eq!(checkout.state(), CheckoutState::MethodSelection);
    assert!(checkout.last_error().is_some());

    let note = h.notifier.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(h.records().await, 0);

    // The donor can try again once the backend is back.
    h.backend.fail_orders(false);
    assert!(checkout.pay().await.is_ok());
    assert_eq!(h.widget.opened().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_verification_records_nothing() {
    let h = Harness::new();
    h.backend.reject_verification(true);
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    let token = checkout.pay().await.unwrap();
    let order_id = checkout.checkout_options().unwrap().order_id.clone();
    let result = checkout
        .on_gateway_response(token, h.widget.pay(&order_id))
        .await;

    assert!(matches!(
        result,
        Err(PaymentError::PaymentVerification { .. })
    ));
    assert_eq!(checkout.state(), CheckoutState::MethodSelection);
    let note = h.notifier.last().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.title, "Payment verification failed");
    assert_eq!(h.records().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_forged_signature_is_not_verified() {
    let h = Harness::new();
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    let token = checkout.pay().await.unwrap();
    let order_id = checkout.checkout_options().unwrap().order_id.clone();
    let mut response = h.widget.pay(&order_id);
    response.signature = "forged".into();

    let result = checkout.on_gateway_response(token, response).await;
    assert!(matches!(result, Err(PaymentError::PaymentVerification { .. })));
    assert_eq!(h.records().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_returns_to_selection() {
    let h = Harness::new();
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    let token = checkout.pay().await.unwrap();
    let outcome = checkout.on_gateway_dismiss(token).unwrap();
    assert_eq!(outcome, CheckoutOutcome::Dismissed);
    assert_eq!(checkout.state(), CheckoutState::MethodSelection);
    assert_eq!(h.notifier.last().unwrap().level, NotificationLevel::Info);
    assert_eq!(h.records().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_events_from_replaced_attempt_are_ignored() {
    let h = Harness::new();
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    let first = checkout.pay().await.unwrap();
    let first_order = checkout.checkout_options().unwrap().order_id.clone();
    checkout.on_gateway_dismiss(first).unwrap();

    let second = checkout.pay().await.unwrap();
    assert_ne!(first, second);
    let second_order = checkout.checkout_options().unwrap().order_id.clone();

    let late = checkout
        .on_gateway_response(first, h.widget.pay(&first_order))
        .await
        .unwrap();
    assert_eq!(late, CheckoutOutcome::Stale);
    assert_eq!(checkout.on_gateway_dismiss(first).unwrap(), CheckoutOutcome::Stale);
    assert_eq!(checkout.state(), CheckoutState::GatewayCheckout);
    assert_eq!(h.backend.verify_calls(), 0);

    let outcome = checkout
        .on_gateway_response(second, h.widget.pay(&second_order))
        .await
        .unwrap();
    assert!(matches!(outcome, CheckoutOutcome::Completed(_)));
    assert_eq!(h.records().await, 1);

    // Nothing after completion can add a second record.
    let again = checkout
        .on_gateway_response(second, h.widget.pay(&second_order))
        .await
        .unwrap();
    assert_eq!(again, CheckoutOutcome::Stale);
    assert_eq!(h.records().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_script_load_failure_is_retried() {
    let h = Harness::new();
    h.widget.fail_script_loads(true);
    let mut checkout = h.open(dec!(1000));
    checkout.select_method(PaymentMethod::Wallet).await.unwrap();

    assert!(matches!(checkout.pay().await, Err(PaymentError::ScriptLoad)));
    assert_eq!(checkout.state(), CheckoutState::MethodSelection);
    assert_eq!(h.notifier.last().unwrap().title, "Payment unavailable");

    h.widget.fail_script_loads(false);
    checkout.pay().await.unwrap();
    let url = CheckoutConfig::default().checkout_script_url;
    assert_eq!(h.widget.script_urls(), vec![url.clone(), url]);
}

#[tokio::test(start_paused = true)]
async fn test_pay_requires_wallet_selection() {
    let h = Harness::new();
    let mut checkout = h.open(dec!(1000));

    assert!(matches!(
        checkout.pay().await,
        Err(PaymentError::InvalidTransition { action: "pay", .. })
    ));

    checkout.select_method(PaymentMethod::Upi).await.unwrap();
    assert!(matches!(
        checkout.pay().await,
        Err(PaymentError::InvalidTransition { action: "pay", .. })
    ));
    assert!(h.widget.opened().is_empty());
}
