//! Renderers for the demo output written to stdout.

use std::io::{self, Write};

use quota_edge::Credential;

use crate::demo::DemoConfig;

pub(crate) const TOKEN_PATH: &str = "oauth2-cc/token";
pub(crate) const WITH_TOKEN_PATH: &str = "ops/withtoken";
pub(crate) const WITH_KEY_PATH: &str = "ops/withkey";
pub(crate) const TOKEN_REQUEST_BODY: &str = "grant_type=client_credentials";

pub(crate) fn render_credentials(
    out: &mut dyn Write,
    config: &DemoConfig,
    credential: &Credential,
) -> io::Result<()> {
    writeln!(out, "\n\nORG={}", config.org)?;
    writeln!(out, "ENV={}", config.env)?;
    writeln!(out, "client_id={}", credential.consumer_key)?;
    writeln!(out, "client_secret={}", credential.consumer_secret)?;
    writeln!(out)
}

pub(crate) fn render_token_request(out: &mut dyn Write, config: &DemoConfig) -> io::Result<()> {
    writeln!(out, "# Get new token")?;
    writeln!(out, "curl -i -X POST \\")?;
    writeln!(out, "   -H content-type:application/x-www-form-urlencoded \\")?;
    writeln!(out, "   -u ${{client_id}}:${{client_secret}} \\")?;
    writeln!(out, "   -d \"{TOKEN_REQUEST_BODY}\" \\")?;
    writeln!(out, "   {}\n", config.proxy_url(TOKEN_PATH))
}

pub(crate) fn render_next_steps(
    out: &mut dyn Write,
    config: &DemoConfig,
    access_token: &str,
    consumer_key: &str,
) -> io::Result<()> {
    writeln!(out, "# Invoke API with Token")?;
    writeln!(
        out,
        "curl -i -H \"Authorization: Bearer {access_token}\" {}\n",
        config.proxy_url(WITH_TOKEN_PATH)
    )?;
    writeln!(out, "# Invoke API with Key")?;
    writeln!(
        out,
        "curl -i -H APIKey:{consumer_key} {}\n",
        config.proxy_url(WITH_KEY_PATH)
    )
}
