//! Interactive conflict resolution
//!
//! [`PromptResolver`] is the fallback behind the `ask` strategy: it shows
//! both copies of a conflicting document on stderr and reads the answer
//! from stdin. A closed stdin answers `skip`.

use std::io::{BufRead, Write};

use anyhow::Context;
use tracing::debug;

use docsync_core::domain::conflict::{ConflictContext, ConflictSide, Resolution};
use docsync_core::domain::snapshot::human_size;
use docsync_core::ports::resolver::IConflictResolver;

/// Asks the user on the terminal
#[derive(Debug, Default)]
pub struct PromptResolver;

impl PromptResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Parses an answer; accepts the initial or the full word, any case
pub fn parse_answer(input: &str) -> Option<Resolution> {
    match input.trim().to_lowercase().as_str() {
        "l" | "local" => Some(Resolution::Local),
        "r" | "remote" => Some(Resolution::Remote),
        "s" | "skip" => Some(Resolution::Skip),
        _ => None,
    }
}

fn describe(label: &str, side: &ConflictSide) -> String {
    let modified = side
        .modified
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "  {label:<7} {}  {:>10}  {modified}  ({})",
        side.path,
        human_size(side.size),
        side.state
    )
}

fn ask(conflict: &ConflictContext) -> anyhow::Result<Resolution> {
    let stdin = std::io::stdin();
    let mut stderr = std::io::stderr();

    writeln!(stderr, "\nConflict ({}):", conflict.reason())?;
    if conflict.anomaly {
        writeln!(stderr, "  neither history nor size explains this difference")?;
    }
    writeln!(stderr, "{}", describe("local", &conflict.local))?;
    writeln!(stderr, "{}", describe("remote", &conflict.remote))?;

    loop {
        write!(stderr, "Keep [l]ocal, [r]emote, or [s]kip? ")?;
        stderr.flush()?;

        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).context("Failed to read answer")?;
        if read == 0 {
            debug!("stdin closed; skipping conflict");
            return Ok(Resolution::Skip);
        }
        if let Some(resolution) = parse_answer(&line) {
            return Ok(resolution);
        }
    }
}

#[async_trait::async_trait]
impl IConflictResolver for PromptResolver {
    async fn resolve(&self, conflict: &ConflictContext) -> anyhow::Result<Resolution> {
        let conflict = conflict.clone();
        tokio::task::spawn_blocking(move || ask(&conflict))
            .await
            .context("Prompt task failed")?
    }
}
