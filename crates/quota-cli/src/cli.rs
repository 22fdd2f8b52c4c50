//! Argument parsing, credential resolution, and dispatch for `quota-demo`.

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};
use quota_edge::{
    ConnectOptions, Credentials, DEFAULT_MGMT_SERVER, DEFAULT_SSO_URL, EdgeClient, QuotaTimeUnit,
    parse_key_expiry,
};
use quota_telemetry::{
    GlobalContextGuard, LogFormat, LoggingConfig, build_sha, init_logging, level_for_verbosity,
};
use reqwest::Url;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult, runtime_client};
use crate::commands::{provision, reset};
use crate::demo::{DEFAULT_SOURCE, DemoConfig, Discriminators};

const MISSING_ENV: &str = "You must provide an environment to which to deploy the proxy.";

#[derive(Parser, Debug)]
#[command(
    name = "quota-demo",
    version,
    about = "Provision or reset the Apigee Edge quota demo"
)]
pub(crate) struct Cli {
    /// Organization to provision into.
    #[arg(short = 'o', long, env = "EDGE_ORG")]
    org: Option<String>,
    /// Environment to which to deploy the proxy.
    #[arg(short = 'e', long, env = "ENV")]
    env: Option<String>,
    /// Quota time unit attached to the product.
    #[arg(short = 'U', long = "timeunit", value_enum, default_value_t = TimeUnitArg::Minute)]
    time_unit: TimeUnitArg,
    /// Delete every asset previously created by this tool.
    #[arg(short = 'R', long)]
    reset: bool,
    /// Management user name.
    #[arg(short = 'u', long, env = "EDGE_USERNAME")]
    username: Option<String>,
    /// Management password; prompted for when omitted on a terminal.
    #[arg(short = 'p', long, env = "EDGE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// Pre-acquired bearer token for the management API.
    #[arg(long, env = "EDGE_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Use HTTP Basic authentication instead of an OAuth token.
    #[arg(short = 'T', long = "notoken")]
    no_token: bool,
    /// Management server base URL.
    #[arg(
        short = 'M',
        long = "mgmtserver",
        env = "EDGE_MGMT_SERVER",
        value_parser = parse_url,
        default_value = DEFAULT_MGMT_SERVER
    )]
    mgmt_server: Url,
    /// Login server used for the OAuth password grant.
    #[arg(long = "sso-url", value_parser = parse_url, default_value = DEFAULT_SSO_URL)]
    sso_url: Url,
    /// Increase log verbosity (repeatable).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
    /// Log output format.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormatArg::Compact)]
    log_format: LogFormatArg,
    /// HTTP timeout in seconds; unset means no timeout.
    #[arg(long)]
    timeout: Option<u64>,
    /// Directory containing the `apiproxy/` bundle.
    #[arg(long, default_value = DEFAULT_SOURCE)]
    source: PathBuf,
    /// Runtime host override; defaults to `https://{org}-{env}.apigee.net`.
    #[arg(long, value_parser = parse_url)]
    apiserver: Option<Url>,
    /// Suffix appended to product, developer, and app names.
    #[arg(long)]
    namespace: Option<String>,
    /// Lifetime of the app's keys, e.g. `210d` or `12h`; keys never expire when omitted.
    #[arg(long = "key-expiry", value_parser = parse_expiry)]
    key_expiry: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TimeUnitArg {
    Minute,
    Hour,
    Day,
}

impl From<TimeUnitArg> for QuotaTimeUnit {
    fn from(value: TimeUnitArg) -> Self {
        match value {
            TimeUnitArg::Minute => Self::Minute,
            TimeUnitArg::Hour => Self::Hour,
            TimeUnitArg::Day => Self::Day,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Compact,
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// Parses CLI arguments, runs the provision or reset path, and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: level_for_verbosity(cli.verbose),
        format: cli.log_format.into(),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err}");
    }

    let env = match require_environment(cli.env.as_deref()) {
        Ok(env) => env,
        Err(err) => {
            eprintln!("{}", err.display_message());
            eprintln!("{}", Cli::command().render_help());
            return err.exit_code();
        }
    };

    match execute(cli, &env).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli, env: &str) -> CliResult<()> {
    let org = require_org(cli.org.as_deref())?;
    let credentials = resolve_credentials(
        cli.token,
        cli.username,
        cli.password,
        cli.no_token,
        prompt_password,
    )?;
    let config = build_config(
        &org,
        env,
        cli.time_unit,
        cli.namespace.as_deref(),
        cli.source,
        cli.apiserver,
    )?
    .with_key_expiry(cli.key_expiry);
    let mode = if cli.reset { "reset" } else { "provision" };
    let _guard = GlobalContextGuard::new(mode, &org, env);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        build_sha = build_sha(),
        "start"
    );

    let trace_id = Uuid::new_v4().to_string();
    let timeout = cli.timeout.map(Duration::from_secs);
    let client = EdgeClient::connect(ConnectOptions {
        mgmt_server: cli.mgmt_server,
        sso_url: cli.sso_url,
        org,
        credentials,
        timeout,
        request_id: Some(trace_id.clone()),
    })
    .await
    .context("while connecting")
    .map_err(CliError::failure)?;

    let ctx = AppContext {
        api: Arc::new(client),
        http: runtime_client(timeout, &trace_id)?,
        config,
    };

    if cli.reset {
        reset(&ctx)
            .await
            .context("while resetting")
            .map_err(CliError::failure)?;
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    provision(&ctx, &mut out)
        .await
        .context("while provisioning")
        .map_err(CliError::failure)?;
    out.flush()
        .map_err(|err| CliError::failure(anyhow!("failed to flush stdout: {err}")))
}

fn parse_url(input: &str) -> Result<Url, String> {
    Url::parse(input).map_err(|err| format!("invalid URL '{input}': {err}"))
}

fn parse_expiry(input: &str) -> Result<u64, String> {
    parse_key_expiry(input).map_err(|err| format!("invalid key expiry '{input}': {err}"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn require_environment(env: Option<&str>) -> CliResult<String> {
    non_empty(env)
        .map(str::to_string)
        .ok_or_else(|| CliError::validation(MISSING_ENV))
}

fn require_org(org: Option<&str>) -> CliResult<String> {
    non_empty(org)
        .map(str::to_string)
        .ok_or_else(|| CliError::validation("organization is required (flag --org or EDGE_ORG)"))
}

fn build_config(
    org: &str,
    env: &str,
    time_unit: TimeUnitArg,
    namespace: Option<&str>,
    source: PathBuf,
    apiserver: Option<Url>,
) -> CliResult<DemoConfig> {
    let names =
        non_empty(namespace).map_or_else(Discriminators::default, Discriminators::namespaced);
    let mut config = DemoConfig::new(org, env)
        .map_err(|err| {
            CliError::validation(format!(
                "org '{org}' and env '{env}' do not form a runtime host: {err}"
            ))
        })?
        .with_time_unit(time_unit.into())
        .with_names(names)
        .with_source(source);
    if let Some(apiserver) = apiserver {
        config = config.with_apiserver(apiserver);
    }
    Ok(config)
}

fn resolve_credentials(
    token: Option<String>,
    username: Option<String>,
    password: Option<String>,
    no_token: bool,
    prompt: impl FnOnce() -> CliResult<String>,
) -> CliResult<Credentials> {
    if let Some(token) = non_empty(token.as_deref()) {
        if username.is_some() || no_token {
            warn!("--token given; ignoring username and --notoken");
        }
        return Ok(Credentials::Bearer(token.to_string()));
    }

    let username = non_empty(username.as_deref())
        .map(str::to_string)
        .ok_or_else(|| {
            CliError::validation(
                "credentials required: supply --token, or --username with --password",
            )
        })?;
    let password = match password {
        Some(password) if !password.is_empty() => password,
        _ => prompt()?,
    };

    Ok(if no_token {
        Credentials::Basic { username, password }
    } else {
        Credentials::PasswordGrant { username, password }
    })
}

fn prompt_password() -> CliResult<String> {
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "password required; supply via --password or EDGE_PASSWORD when running non-interactively",
        ));
    }
    let password = rpassword::prompt_password("Password: ").map_err(|err| {
        CliError::failure(anyhow!("failed to read password from stdin: {err}"))
    })?;
    if password.is_empty() {
        return Err(CliError::validation("password cannot be empty"));
    }
    Ok(password)
}
