//! `vectormentor status` — Show runtime status.

use vectormentor_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let manager = vectormentor_workflow::SessionManager::from_config(&config)?;
    let info = manager.info();

    println!("📐 VectorMentor Status");
    println!("=====================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Mode:         {}", if info.local_only { "local (no API key)" } else { "online" });
    println!("  Provider:     {}", info.provider);
    println!("  Model:        {}", info.model);
    println!("  Timeout:      {}s", config.request_timeout_secs);
    println!("  Trend delta:  {}", config.progress.trend_threshold);
    println!(
        "  Exercises:    skipped with p = {}",
        config.tutor.exercise_skip_probability
    );

    let router = vectormentor_providers::build_from_config(&config)?;
    let mut registered = router.list();
    registered.sort_unstable();
    println!("  Registered:   {}", registered.join(", "));
    if let Some(provider) = router.default() {
        let reachable = provider.health_check().await.unwrap_or(false);
        println!("  Reachable:    {}", if reachable { "yes" } else { "no" });
    }

    match manager.retrieval_stats().await {
        Some(stats) => {
            println!("  Retrieval:    {} ({}, {} passages)", stats.kind, stats.status, stats.count);
            if !stats.topics.is_empty() {
                println!("  Topics:       {}", stats.topics.join(", "));
            }
        }
        None => println!("  Retrieval:    unavailable"),
    }

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `vectormentor onboard` first");
    }

    Ok(())
}
