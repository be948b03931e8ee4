use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use nudge::kernel::gate::RngSource;
use nudge::kernel::time::SystemClock;
use nudge::{responder, AppConfig, ContextPatch, Difficulty, Emotion, EmotionReading, Reactor};

const HELP: &str = "commands: emotion <name> | lesson <text> | difficulty <easy|medium|hard> | course <id> | click <surface> | dismiss <surface> | close <surface> | say <text> | status | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => AppConfig::default(),
    };
    tracing::info!(surfaces = config.surfaces.len(), "nudge booting");

    let reactor = Reactor::from_config(&config, Arc::new(SystemClock))?;
    let (handle, mut events, join) = reactor.spawn();
    let mut chat_rng = RngSource::from_entropy();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{HELP}");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let (verb, rest) = line.trim().split_once(' ').unwrap_or((line.trim(), ""));
                let rest = rest.trim();

                match verb {
                    "" => {}
                    "emotion" => match rest.parse::<Emotion>() {
                        Ok(emotion) => {
                            handle.ingest_emotion(EmotionReading::new(emotion, 0.9, chrono::Utc::now())).await?
                        }
                        Err(e) => println!("{e}"),
                    },
                    "lesson" => handle.update_learning_context(ContextPatch::new().lesson(rest)).await?,
                    "difficulty" => match rest.parse::<Difficulty>() {
                        Ok(d) => handle.update_learning_context(ContextPatch::new().difficulty(d)).await?,
                        Err(e) => println!("{e}"),
                    },
                    "course" => handle.navigate(rest).await?,
                    "click" => handle.trigger_immediate(rest).await?,
                    "dismiss" => handle.dismiss(rest).await?,
                    "close" => handle.unregister(rest).await?,
                    "say" => {
                        let snap = handle.snapshot().await?;
                        println!("assistant: {}", responder::respond(rest, &snap.emotion, &snap.context, &mut chat_rng));
                    }
                    "status" => {
                        let snap = handle.snapshot().await?;
                        println!("{}", serde_json::to_string_pretty(&snap.telemetry)?);
                        for s in &snap.surfaces {
                            println!("{}: {:?}", s.surface, s.phase);
                        }
                    }
                    "quit" | "exit" => break,
                    _ => println!("{HELP}"),
                }
            }
        }
    }

    handle.shutdown();
    join.await.context("reactor task panicked")?;
    tracing::info!("nudge stopped");
    Ok(())
}
