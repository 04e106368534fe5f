//! `vectormentor ask` — Single-turn mode.

pub async fn run(message: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::runtime()?;
    let session_id = manager.create_session().await;
    tracing::debug!(%session_id, "Single-turn session opened");

    eprint!("  Pensando...");
    let outcome = manager.process_turn(&session_id, &message).await?;
    eprint!("\r              \r");

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.response);
        if !outcome.degraded_stages.is_empty() {
            eprintln!();
            eprintln!("  ⚠️  Degraded stages: {}", outcome.degraded_stages.join(", "));
        }
    }
    Ok(())
}
