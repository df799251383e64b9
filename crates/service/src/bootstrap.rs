//! Process startup.

use anyhow::Context;

use issuetrack_core::Clock;

use crate::{IssueTracker, Settings};

/// Load settings from the environment and start.
pub fn start_from_env() -> anyhow::Result<IssueTracker> {
    let settings = Settings::from_env().context("invalid configuration")?;
    start(&settings)
}

/// Initialise logging, build the in-memory tracker and seed the admin.
pub fn start(settings: &Settings) -> anyhow::Result<IssueTracker> {
    issuetrack_observability::init_with(settings.log_format);

    let tracker = IssueTracker::in_memory(settings).context("failed to build issue tracker")?;
    seed_admin(&tracker, settings)?;

    tracing::info!(
        role_freshness = ?settings.role_freshness,
        token_ttl_minutes = settings.token_ttl.num_minutes(),
        "issue tracker ready"
    );
    Ok(tracker)
}

/// Create the configured bootstrap admin if it does not exist yet.
pub fn seed_admin<C>(tracker: &IssueTracker<C>, settings: &Settings) -> anyhow::Result<()>
where
    C: Clock + Clone,
{
    let Some(seed) = &settings.admin else {
        tracing::debug!("no bootstrap admin configured");
        return Ok(());
    };

    let admin = tracker
        .ensure_admin(&seed.email, &seed.password)
        .with_context(|| format!("failed to seed bootstrap admin {}", seed.email))?;
    tracing::info!(user_id = %admin.id, "bootstrap admin present");
    Ok(())
}
