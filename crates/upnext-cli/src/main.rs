//! upnext: print the upcoming events of one named Google calendar.
//!
//! A single linear run: load the client secret, obtain a token (cached on
//! disk after the first interactive consent), list calendars, and print
//! the recently-updated upcoming events of the target calendar.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};

use upnext_auth::{obtain_token, ClientSecret, GoogleAuthorizer, TokenCache, CLIENT_SECRET_FILE};
use upnext_calendar::CalendarClient;

mod agenda;

#[tokio::main]
async fn main() {
    init_tracing();

    // Single exit point: every failure propagates here as an error chain.
    if let Err(err) = run().await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let secret = ClientSecret::from_file(CLIENT_SECRET_FILE)
        .with_context(|| format!("Unable to read {}", CLIENT_SECRET_FILE))?;
    let authorizer = GoogleAuthorizer::new(secret.app_secret()?);

    let cache = TokenCache::resolve().context("Unable to resolve the token cache path")?;
    let token = obtain_token(&authorizer, &cache)
        .await
        .context("Unable to obtain an access token")?;

    let client = CalendarClient::new(&token.access_token);
    let calendars = client
        .list_calendars()
        .await
        .context("Unable to retrieve the list of calendars")?;

    let now = Utc::now();
    let updated_min = now - Duration::hours(agenda::UPDATED_LOOKBACK_HOURS);

    for calendar in &calendars {
        if !agenda::is_target(calendar) {
            continue;
        }

        let events = client
            .list_events(&calendar.id, updated_min, now)
            .await
            .context("Unable to retrieve the calendar events list")?;

        for event in &events {
            println!("{}", agenda::render_event(event));
        }
    }

    Ok(())
}
