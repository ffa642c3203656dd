//! Line-oriented terminal I/O shared by the subcommands.

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

use classroom_core::model::IdentityDraft;
use services::{IdentityPrompt, SubmitConfirm};

pub struct Console {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl Console {
    pub fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    pub async fn say(&self, text: &str) -> io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    }

    /// Print `prompt` and read one line. `None` on end of input.
    pub async fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;
        self.lines.lock().await.next_line().await
    }

    /// Ask until the answer is `y` or `n`; end of input counts as no.
    pub async fn yes_no(&self, prompt: &str) -> bool {
        loop {
            match self.read_line(&format!("{prompt} [y/n] ")).await {
                Ok(Some(line)) => match line.trim().to_ascii_lowercase().as_str() {
                    "y" | "yes" => return true,
                    "n" | "no" => return false,
                    _ => {}
                },
                Ok(None) => return false,
                Err(err) => {
                    tracing::warn!(error = %err, "could not read confirmation");
                    return false;
                }
            }
        }
    }

    /// Read a name and class group, offering `current` as the default.
    pub async fn identity_draft(&self, current: Option<&IdentityDraft>) -> Option<IdentityDraft> {
        let name_default = current.map(|d| d.student_name.as_str()).unwrap_or_default();
        let group_default = current.map(|d| d.class_group.as_str()).unwrap_or_default();
        let name = self.ask_with_default("Your name", name_default).await?;
        let group = self.ask_with_default("Class group", group_default).await?;
        Some(IdentityDraft::new(name, group))
    }

    async fn ask_with_default(&self, label: &str, default: &str) -> Option<String> {
        let prompt = if default.is_empty() {
            format!("{label}: ")
        } else {
            format!("{label} [{default}]: ")
        };
        let line = match self.read_line(&prompt).await {
            Ok(line) => line?,
            Err(err) => {
                tracing::warn!(error = %err, "could not read from stdin");
                return None;
            }
        };
        if line.trim().is_empty() {
            Some(default.to_owned())
        } else {
            Some(line)
        }
    }
}

#[async_trait]
impl IdentityPrompt for Console {
    async fn ask(&self) -> Option<IdentityDraft> {
        if let Err(err) = self.say("Who is this? (saved for next time)").await {
            tracing::warn!(error = %err, "could not write to stdout");
        }
        self.identity_draft(None).await
    }
}

/// `SubmitConfirm` over the console.
pub struct ConfirmOnConsole<'a>(pub &'a Console);

#[async_trait]
impl SubmitConfirm for ConfirmOnConsole<'_> {
    async fn confirm_incomplete(&mut self, answered: usize, total: usize) -> bool {
        self.0
            .yes_no(&format!(
                "You answered only {answered} of {total} questions. Hand in anyway?"
            ))
            .await
    }
}
