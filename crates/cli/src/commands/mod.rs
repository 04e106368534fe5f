pub mod ask;
pub mod chat;
pub mod onboard;
pub mod status;
pub mod topic;

use vectormentor_config::AppConfig;
use vectormentor_workflow::SessionManager;

/// Load configuration and build the tutoring runtime.
pub(crate) fn runtime() -> Result<SessionManager, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let manager = SessionManager::from_config(&config)?;
    if manager.info().local_only {
        eprintln!("  ⚠️  No API key configured — running in local mode.");
        eprintln!("     Set VECTORMENTOR_API_KEY or run `vectormentor onboard`.");
        eprintln!();
    }
    Ok(manager)
}
