use clap::{Args, Parser, Subcommand, ValueEnum};
use donapay::application::confirmation::ConfirmOutcome;
use donapay::application::gateway_client::{CheckoutSettings, GatewayOrderClient};
use donapay::application::ledger::DonationLedgerRecorder;
use donapay::application::orchestrator::{CheckoutOutcome, CheckoutServices, PaymentOrchestrator};
use donapay::config::CheckoutConfig;
use donapay::domain::card::CardDetails;
use donapay::domain::fees::FeeCalculator;
use donapay::domain::method::{MethodInfo, PaymentMethod, PaymentMethodRegistry};
use donapay::domain::ports::{FeeQuoteServiceArc, LedgerStoreArc, PaymentBackendArc};
use donapay::domain::session::{Campaign, Donor};
use donapay::domain::upi::{QrPaymentSession, QrPattern};
use donapay::infrastructure::console::ConsoleNotifier;
use donapay::infrastructure::http::HttpPaymentBackend;
use donapay::infrastructure::in_memory::{InMemoryClipboard, InMemoryLedgerStore};
use donapay::infrastructure::json_file::JsonFileLedgerStore;
use donapay::infrastructure::local_quotes::LocalFeeQuotes;
use donapay::infrastructure::sandbox::{SandboxBackend, SandboxWidget};
use donapay::interfaces::csv::ledger_writer::LedgerWriter;
use miette::{IntoDiagnostic, Result, miette};
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Donation checkout: fees, UPI sessions and confirmation",
    long_about = None
)]
struct Cli {
    /// JSON config file; unset fields use defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true, env = "DONAPAY_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported payment methods and preset amounts
    Methods,
    /// Show the fee breakdown for an amount and method
    Quote {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, value_parser = parse_method)]
        method: PaymentMethod,
    },
    /// Print the UPI deep link for a donation
    UpiLink {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "General Fund")]
        campaign_title: String,
        /// Also draw the illustrative QR pattern
        #[arg(long)]
        qr: bool,
    },
    /// Run a donation through checkout and print the recorded donation
    Donate(DonateArgs),
    /// Print the donation history as CSV
    History {
        #[arg(long)]
        ledger: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GatewayAction {
    /// Complete the payment in the checkout widget
    Pay,
    /// Close the widget without paying
    Dismiss,
}

#[derive(Args)]
struct DonateArgs {
    /// Defaults to the first preset amount
    #[arg(long)]
    amount: Option<Decimal>,
    #[arg(long, value_parser = parse_method)]
    method: PaymentMethod,
    #[arg(long, default_value = "general")]
    campaign_id: String,
    #[arg(long, default_value = "General Fund")]
    campaign_title: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long)]
    anonymous: bool,
    /// Persist the donation to this JSON ledger file
    #[arg(long)]
    ledger: Option<PathBuf>,
    /// What the donor does in the gateway widget (wallet only)
    #[arg(long, value_enum, default_value = "pay")]
    gateway_action: GatewayAction,
    #[arg(long, default_value = "")]
    card_holder: String,
    #[arg(long, default_value = "")]
    card_number: String,
    /// MM/YY
    #[arg(long, default_value = "")]
    card_expiry: String,
    #[arg(long, default_value = "")]
    card_cvv: String,
}

/// What the `methods` command prints.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Catalog<'a> {
    currency: &'a str,
    preset_amounts: &'a [Decimal],
    methods: &'static [MethodInfo],
}

fn parse_method(s: &str) -> std::result::Result<PaymentMethod, String> {
    PaymentMethodRegistry::lookup(s).map_err(|e| e.to_string())
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CheckoutConfig> {
    let config = match path {
        Some(path) => CheckoutConfig::from_file(path).into_diagnostic()?,
        None => CheckoutConfig::default(),
    };
    let config = config.with_env();
    config.validate().into_diagnostic()?;
    Ok(config)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{text}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Methods => print_json(&Catalog {
            currency: &config.currency,
            preset_amounts: &config.preset_amounts,
            methods: PaymentMethodRegistry::entries(),
        }),
        Command::Quote { amount, method } => {
            let breakdown = FeeCalculator::new(config.fees.clone())
                .compute(amount, method)
                .into_diagnostic()?;
            print_json(&breakdown)
        }
        Command::UpiLink {
            amount,
            campaign_title,
            qr,
        } => {
            let breakdown = FeeCalculator::new(config.fees.clone())
                .compute(amount, PaymentMethod::Upi)
                .into_diagnostic()?;
            let session = QrPaymentSession::issue(
                &config.payee(),
                &campaign_title,
                breakdown.total_payable,
                chrono::Utc::now(),
                config.qr_ttl_secs,
            );
            println!("{}", session.deep_link);
            if qr {
                print!(
                    "{}",
                    QrPattern::from_link(&session.deep_link, QrPattern::DEFAULT_SIZE).render_text()
                );
            }
            Ok(())
        }
        Command::Donate(args) => donate(config, args).await,
        Command::History { ledger } => {
            let store = JsonFileLedgerStore::open(ledger);
            info!(path = %store.path().display(), "reading donation history");
            let recorder = DonationLedgerRecorder::new(Arc::new(store));
            let records = recorder.history().await.into_diagnostic()?;
            let summary = recorder.summary().await.into_diagnostic()?;
            info!(
                completed = summary.completed_count,
                total = %summary.completed_total,
                "donation history loaded"
            );
            let stdout = io::stdout();
            let mut writer = LedgerWriter::new(stdout.lock());
            writer.write_records(&records).into_diagnostic()?;
            Ok(())
        }
    }
}

async fn donate(config: CheckoutConfig, args: DonateArgs) -> Result<()> {
    let ledger_store: LedgerStoreArc = match &args.ledger {
        Some(path) => Arc::new(JsonFileLedgerStore::open(path)) as LedgerStoreArc,
        None => Arc::new(InMemoryLedgerStore::new()),
    };
    let ledger = Arc::new(DonationLedgerRecorder::new(ledger_store));

    let quotes: FeeQuoteServiceArc;
    let backend: PaymentBackendArc;
    match &config.api_base_url {
        Some(url) => {
            let http = HttpPaymentBackend::new(url, config.http_timeout()).into_diagnostic()?;
            let http = Arc::new(http);
            quotes = http.clone();
            backend = http;
        }
        None => {
            let calculator = FeeCalculator::new(config.fees.clone());
            quotes = Arc::new(LocalFeeQuotes::new(calculator.clone()));
            backend = Arc::new(SandboxBackend::new(calculator, config.currency.clone()));
        }
    }
    let widget = Arc::new(SandboxWidget::default());
    let gateway = Arc::new(GatewayOrderClient::new(
        backend,
        widget.clone(),
        ledger.clone(),
        CheckoutSettings::from_config(&config),
    ));
    let services = CheckoutServices {
        quotes,
        gateway,
        ledger,
        notifier: Arc::new(ConsoleNotifier),
        clipboard: Arc::new(InMemoryClipboard::new()),
    };

    let donor = if args.anonymous {
        Donor {
            email: args.email.clone(),
            ..Donor::anonymous()
        }
    } else {
        Donor::new(args.name.clone(), args.email.clone())
    };
    let campaign = Campaign::new(args.campaign_id.clone(), args.campaign_title.clone());

    let amount = args
        .amount
        .or_else(|| config.preset_amounts.first().copied())
        .ok_or_else(|| miette!("--amount is required when no preset amounts are configured"))?;

    let mut checkout =
        PaymentOrchestrator::open(config, services, amount, campaign, donor).into_diagnostic()?;
    checkout.select_method(args.method).await.into_diagnostic()?;

    let record = match args.method {
        PaymentMethod::Wallet => {
            let token = checkout.pay().await.into_diagnostic()?;
            match args.gateway_action {
                GatewayAction::Dismiss => {
                    checkout.on_gateway_dismiss(token).into_diagnostic()?;
                    return Err(miette!("payment cancelled by donor"));
                }
                GatewayAction::Pay => {
                    let options = checkout
                        .checkout_options()
                        .cloned()
                        .ok_or_else(|| miette!("checkout widget did not open"))?;
                    let response = widget.pay(&options.order_id);
                    match checkout
                        .on_gateway_response(token, response)
                        .await
                        .into_diagnostic()?
                    {
                        CheckoutOutcome::Completed(record) => record,
                        other => return Err(miette!("checkout ended without payment: {other:?}")),
                    }
                }
            }
        }
        _ => {
            if args.method == PaymentMethod::Card {
                checkout
                    .update_card(CardDetails {
                        holder_name: args.card_holder.clone(),
                        number: args.card_number.clone(),
                        expiry: args.card_expiry.clone(),
                        cvv: args.card_cvv.clone(),
                    })
                    .into_diagnostic()?;
            }
            if let Some(snapshot) = checkout.qr_snapshot() {
                eprintln!("Scan to pay: {}", snapshot.session.deep_link);
            }
            if let Some(bank) = checkout.bank_transfer() {
                eprintln!(
                    "Transfer to {} / {} / IFSC {} (reference {})",
                    bank.details.account_name,
                    bank.details.account_number,
                    bank.details.ifsc,
                    bank.reference
                );
            }
            if let Some(label) = checkout.confirm_label() {
                eprintln!("{label}");
            }
            match checkout.confirm_payment().await.into_diagnostic()? {
                ConfirmOutcome::Recorded(record) => record,
                ConfirmOutcome::AlreadyProcessing => {
                    return Err(miette!("a confirmation is already in progress"));
                }
            }
        }
    };

    checkout.await_auto_close().await;
    print_json(&record)
}
