//! Read-only check of the Linear credentials: viewer, teams, workflow states
//! of the configured team and, optionally, one issue by id.
//!
//! Usage: `cargo run --bin linear_probe -- [ISSUE_ID]`

use std::time::Duration;

use anyhow::{Context, Result};
use sam_opportunity_monitor::notify::linear::{LinearClient, LinearSettings, DEFAULT_LINEAR_API_URL};
use sam_opportunity_monitor::notify::DEFAULT_PRIORITY;

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let settings = LinearSettings {
        api_url: var("LINEAR_API_URL").unwrap_or_else(|| DEFAULT_LINEAR_API_URL.to_string()),
        api_key: var("LINEAR_API_KEY").context("LINEAR_API_KEY environment variable is not set")?,
        team_id: var("LINEAR_TEAM_ID").context("LINEAR_TEAM_ID environment variable is not set")?,
        priority: DEFAULT_PRIORITY,
        timeout: Duration::from_secs(30),
    };
    let client = LinearClient::new(settings)?;

    let viewer = client.viewer().await.context("viewer query")?;
    println!(
        "authenticated as {} <{}> ({})",
        viewer.name.as_deref().unwrap_or("?"),
        viewer.email.as_deref().unwrap_or("?"),
        viewer.id
    );

    let teams = client.teams().await.context("teams query")?;
    println!("teams:");
    for t in &teams {
        let marker = if t.id == client.team_id() { " *" } else { "" };
        println!("  {} [{}] {}{}", t.name, t.key.as_deref().unwrap_or("-"), t.id, marker);
    }
    if !teams.iter().any(|t| t.id == client.team_id()) {
        tracing::warn!(team_id = client.team_id(), "configured team not visible to this key");
    }

    let states = client
        .team_states(client.team_id())
        .await
        .context("team states query")?;
    println!("workflow states:");
    for s in &states {
        println!("  {} ({})", s.name, s.kind.as_deref().unwrap_or("-"));
    }

    if let Some(id) = std::env::args().nth(1) {
        let issue = client.issue(&id).await.context("issue query")?;
        println!("{}", serde_json::to_string_pretty(&issue)?);
    }

    println!("linear-probe done");
    Ok(())
}
