//! `vectormentor chat` — Interactive tutoring session.

use std::io::Write;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use vectormentor_workflow::{SessionManager, SessionStats};

/// One line of user input, interpreted.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Exit,
    Stats,
    Reset,
    Suggest,
    Message(&'a str),
}

impl<'a> ChatInput<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => Self::Empty,
            "salir" | "exit" | "quit" | "/salir" | "/exit" | "/quit" => Self::Exit,
            "/stats" | "/estadisticas" => Self::Stats,
            "/reset" | "/reiniciar" => Self::Reset,
            "/sugerencia" => Self::Suggest,
            _ => Self::Message(line),
        }
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let manager = super::runtime()?;
    let session_id = manager.create_session().await;
    let info = manager.info();

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║     VectorMentor — Tutor de Álgebra Lineal    ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", info.provider);
    println!("  Model:     {}", info.model);
    println!("  Mode:      {}", if info.local_only { "local" } else { "online" });
    println!();
    println!("  Escribe tu pregunta y pulsa Enter.");
    println!("  Comandos: /stats, /reset, /sugerencia. 'salir' para terminar.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        match ChatInput::parse(&line) {
            ChatInput::Empty => {}
            ChatInput::Exit => break,
            ChatInput::Stats => print_stats(&manager.get_stats(&session_id).await?),
            ChatInput::Reset => {
                manager.reset(&session_id).await?;
                println!("  Sesión reiniciada.\n");
            }
            ChatInput::Suggest => {
                let suggestion = manager.suggest_next_topic(&session_id).await?;
                println!("  💡 {suggestion}\n");
            }
            ChatInput::Message(text) => reply(&manager, &session_id, text).await,
        }
        prompt()?;
    }

    println!();
    println!("  ¡Hasta pronto! 👋");
    println!();
    Ok(())
}

async fn reply(manager: &SessionManager, session_id: &str, text: &str) {
    eprint!("  ...");
    let result = manager.process_turn(session_id, text).await;
    eprint!("\r     \r");

    match result {
        Ok(outcome) => {
            println!();
            for line in outcome.response.lines() {
                println!("  VectorMentor > {line}");
            }
            println!();
            println!(
                "  [nivel {}/5 · {} · tendencia: {}]",
                outcome.assessment.level(),
                outcome.assessment.topic().display_name(),
                outcome.trend
            );
            println!();
        }
        Err(e) => {
            eprintln!("  [Error] {e}");
            println!();
        }
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  Tú > ");
    std::io::stdout().flush()
}

fn print_stats(stats: &SessionStats) {
    println!();
    println!("  📊 Progreso de la sesión");
    println!("  Interacciones:     {}", stats.interactions);
    println!("  Nivel actual:      {}/5", stats.current_level);
    println!("  Nivel promedio:    {:.1}", stats.average_level);
    println!("  Tendencia:         {}", stats.trend);
    println!("  Temas cubiertos:   {}", stats.topics_covered);
    if let Some(topic) = stats.most_studied_topic {
        println!("  Tema más estudiado: {}", topic.display_name());
    }
    println!();
}
