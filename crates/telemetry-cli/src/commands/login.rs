//! Login command - print the authorization URL

use anyhow::{Context, Result};
use telemetry_client::TelemetryClient;

use crate::output::OutputContext;

/// Print the URL that links a user's vehicles
pub fn login_url(client: &TelemetryClient, user_id: &str, ctx: &OutputContext) -> Result<()> {
    let url = client
        .authorization_url(user_id)
        .context("Failed to build authorization URL")?;

    if ctx.quiet {
        println!("{}", url);
    } else {
        ctx.print_kv(&[("User", user_id.to_string()), ("URL", url.to_string())]);
    }
    Ok(())
}
