mod prompt;
mod types;

use anyhow::Context;
use clap::Parser;
use handshake::{AccountConfig, Handshake, LoginDetails, MfaPreference, ReqwestTransport};
use prompt::TerminalPrompter;
use serde_json;
use std::{
    io::{self, Write},
    num::NonZeroU32,
    process::ExitCode,
    time::Duration,
};
use tokio;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sign in through a Duo Access Gateway and print the SAML assertion it issues.
#[derive(Parser)]
#[command(about)]
struct Cli {
    /// Base URL of the gateway, e.g. https://sso.example.com
    #[arg(long, env = "DAG_URL")]
    url: Url,

    #[arg(short, long, env = "DAG_USERNAME")]
    username: String,

    /// Prompted for when absent.
    #[arg(long, env = "DAG_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// `auto` answers the Duo challenge here, `deferred` expects the assertion right after the password.
    #[arg(long, env = "DAG_MFA", default_value_t = MfaPreference::Auto)]
    mfa: MfaPreference,

    #[arg(long, env = "DAG_SP_ENTITY_ID", default_value = handshake::DEFAULT_SP_ENTITY_ID)]
    sp_entity_id: String,

    /// Accept invalid TLS certificates.
    #[arg(long)]
    skip_verify: bool,

    #[arg(long, env = "DAG_POLL_INTERVAL_SECS", default_value_t = 3)]
    poll_interval_secs: u64,

    /// Give up on a pending push or call after this many status checks. Waits forever by default.
    #[arg(long, env = "DAG_MAX_POLLS")]
    max_polls: Option<NonZeroU32>,

    /// Print the assertion wrapped in a JSON object.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let program = Cli::parse();

    match authenticate(program).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn authenticate(args: Cli) -> anyhow::Result<()> {
    let config = AccountConfig::default()
        .with_mfa(args.mfa)
        .with_sp_entity_id(args.sp_entity_id)
        .with_skip_verify(args.skip_verify)
        .with_poll_interval(Duration::from_secs(args.poll_interval_secs))
        .with_max_polls(args.max_polls);

    let password = match args.password {
        Some(password) => password,
        None => prompt::password().context("cannot read password")?,
    };
    let login = LoginDetails::new(args.url, args.username, password);

    let transport = ReqwestTransport::from_config(&config)?;
    let handshake = Handshake::new(transport, TerminalPrompter, config);

    let assertion = handshake
        .authenticate(&login)
        .await
        .with_context(|| format!("cannot sign in to {}", login.url))?;

    write_assertion(&mut io::stdout().lock(), assertion.into_inner(), args.json)
}

/// One line for raw output; pretty JSON otherwise. Both end with a newline.
fn write_assertion(out: &mut impl Write, assertion: String, json: bool) -> anyhow::Result<()> {
    if json {
        let output = types::AssertionOutput::from(assertion);
        writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    } else {
        writeln!(out, "{}", assertion)?;
    }
    Ok(())
}
