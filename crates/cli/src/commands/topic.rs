//! `vectormentor topic` — Browse reference passages.

use vectormentor_core::tutoring::{Level, TopicId};

pub async fn run(name: String, level: Option<u8>) -> Result<(), Box<dyn std::error::Error>> {
    let topic: TopicId = name.parse().map_err(|e| {
        let known: Vec<&str> = TopicId::ALL.iter().map(|t| t.as_str()).collect();
        format!("{e} (known topics: {})", known.join(", "))
    })?;
    let level = level.map(|l| Level::clamped(i64::from(l)));

    let manager = super::runtime()?;
    let documents = manager.browse_topic(topic, level).await;

    println!("📚 {}", topic.display_name());
    println!();
    if documents.is_empty() {
        println!("  No se encontró contenido para este tema.");
        return Ok(());
    }
    for doc in documents {
        println!("  [nivel {}] {}", doc.level, doc.content);
        println!();
    }
    Ok(())
}
