use anyhow::{Context, Result, bail};
use clap::Parser;
use log::debug;
use std::path::PathBuf;
use stripe_retry::config::{PolicyOverrides, resolve_policy};
use stripe_retry::http::{ReqwestExecutor, Request, RetryPolicy, RetryingTransport};
use tokio_util::sync::CancellationToken;

/// stripe-retry - send API requests with server-aware retries
///
/// Retries 409 conflicts and 5xx responses with exponential backoff, unless the
/// server says otherwise through the Stripe-Should-Retry header.
///
/// Examples:
///   stripe-retry --max-retries 2 send https://api.stripe.com/v1/charges
#[derive(Parser, Debug)]
#[command(author, version = env!("STRIPE_RETRY_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Retry policy file (JSON: max_retries, min_delay_ms, max_delay_ms)
    #[arg(long = "policy", value_name = "FILE", global = true)]
    pub policy: Option<PathBuf>,

    /// Maximum number of retries (also via STRIPE_MAX_RETRIES)
    #[arg(long = "max-retries", env = "STRIPE_MAX_RETRIES", value_name = "N", global = true)]
    pub max_retries: Option<u32>,

    /// Minimum delay between attempts in milliseconds
    #[arg(long = "min-delay-ms", value_name = "MS", global = true)]
    pub min_delay_ms: Option<u64>,

    /// Maximum delay between attempts in milliseconds
    #[arg(long = "max-delay-ms", value_name = "MS", global = true)]
    pub max_delay_ms: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Send a request and print the final response
    Send(SendArgs),
}

#[derive(clap::Args, Debug)]
pub struct SendArgs {
    /// Request URL
    #[arg(value_name = "URL")]
    pub url: String,

    /// HTTP method
    #[arg(long, short = 'X', default_value = "GET")]
    pub method: String,

    /// Extra header in "Name: value" form (repeatable)
    #[arg(long = "header", short = 'H', value_name = "HEADER")]
    pub headers: Vec<String>,

    /// Request body
    #[arg(long = "data", short = 'd', value_name = "BODY")]
    pub data: Option<String>,

    /// Idempotency-Key sent with every attempt
    #[arg(long = "idempotency-key", value_name = "KEY")]
    pub idempotency_key: Option<String>,
}

impl SendArgs {
    fn to_request(&self) -> Result<Request> {
        let method: reqwest::Method = self
            .method
            .to_uppercase()
            .parse()
            .with_context(|| format!("Invalid HTTP method '{}'", self.method))?;

        let mut request = Request::new(method, &self.url);
        for header in &self.headers {
            let Some((name, value)) = header.split_once(':') else {
                bail!("Invalid header '{}'. Expected 'Name: value'.", header);
            };
            request = request.with_header(name.trim(), value.trim());
        }
        if let Some(key) = &self.idempotency_key {
            request = request.with_idempotency_key(key);
        }
        if let Some(data) = &self.data {
            request = request.with_body(data);
        }
        Ok(request)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let policy = resolve_policy(
        cli.policy.as_deref(),
        PolicyOverrides {
            max_retries: cli.max_retries,
            min_delay_ms: cli.min_delay_ms,
            max_delay_ms: cli.max_delay_ms,
        },
    )?;
    debug!("Using {:?}", policy);

    match cli.command {
        Commands::Send(args) => send(&args, policy).await?,
    }
    Ok(())
}

async fn send(args: &SendArgs, policy: RetryPolicy) -> Result<()> {
    let request = args.to_request()?;
    let transport = RetryingTransport::new(ReqwestExecutor::default(), policy);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let response = transport
        .send_with_cancellation(&request, &cancel)
        .await
        .with_context(|| format!("{} {} failed", request.method, request.url))?;

    println!("HTTP {}", response.status());
    if let Some(request_id) = response.request_id() {
        println!("Request-Id: {}", request_id);
    }
    if let Some(key) = response.idempotency_key() {
        println!("Idempotency-Key: {}", key);
    }
    println!();
    println!("{}", response.body());
    Ok(())
}
