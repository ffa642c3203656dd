mod commands;
mod console;

use std::fmt;
use std::sync::Arc;

use classroom_core::model::{AnnotationId, ArticleId, QuizId, ReactionKind, SlideId};
use services::{AppServices, Clock, RemoteConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::console::Console;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidReaction { raw: String },
    InvalidDbUrl { raw: String },
    InvalidApiUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidReaction { raw } => {
                write!(f, "invalid reaction: {raw} (heart, star, thinking, clap)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidApiUrl { raw } => write!(f, "invalid --api value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id(raw: String, flag: &'static str) -> Result<u64, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [--api <url>] [--db <sqlite_url>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  quiz --quiz-id <id>                      take a quiz");
    eprintln!("  notes --article-id <slug>                edit the class note for an article");
    eprintln!("  reactions --article-id <slug> [--toggle <kind>]");
    eprintln!("  annotations --slide-id <id> [--like <annotation_id>]");
    eprintln!("  progress                                 list your reading progress");
    eprintln!("  glossary [--search <term>]");
    eprintln!("  timeline");
    eprintln!("  logout                                   forget the cached name and class");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --api http://127.0.0.1:8000/");
    eprintln!("  --db sqlite://classroom.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CLASSROOM_API_URL, CLASSROOM_API_TIMEOUT_SECS, CLASSROOM_DB_URL, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Quiz(QuizId),
    Notes(ArticleId),
    Reactions {
        article_id: ArticleId,
        toggle: Option<ReactionKind>,
    },
    Annotations {
        slide: SlideId,
        like: Option<AnnotationId>,
    },
    Progress,
    Glossary {
        search: Option<String>,
    },
    Timeline,
    Logout,
}

struct Args {
    db_url: String,
    api_url: Option<String>,
    command: Command,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = std::env::var("CLASSROOM_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://classroom.sqlite3".into(), normalize_sqlite_url);
        let mut api_url = None;
        let mut name = None;
        let mut article_id = None;
        let mut quiz_id = None;
        let mut slide = None;
        let mut like = None;
        let mut toggle = None;
        let mut search = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => {
                    let value = require_value(&mut args, "--api")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidApiUrl { raw: value });
                    }
                    api_url = Some(value);
                }
                "--quiz-id" => {
                    let value = require_value(&mut args, "--quiz-id")?;
                    quiz_id = Some(QuizId::new(parse_id(value, "--quiz-id")?));
                }
                "--article-id" => {
                    let value = require_value(&mut args, "--article-id")?;
                    article_id = Some(ArticleId::new(value.trim()));
                }
                "--slide-id" => {
                    let value = require_value(&mut args, "--slide-id")?;
                    slide = Some(SlideId::new(parse_id(value, "--slide-id")?));
                }
                "--like" => {
                    let value = require_value(&mut args, "--like")?;
                    like = Some(AnnotationId::new(parse_id(value, "--like")?));
                }
                "--toggle" => {
                    let value = require_value(&mut args, "--toggle")?;
                    toggle = Some(
                        ReactionKind::parse(&value)
                            .ok_or(ArgsError::InvalidReaction { raw: value })?,
                    );
                }
                "--search" => search = Some(require_value(&mut args, "--search")?),
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if name.is_none() => name = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let Some(name) = name else {
            return Ok(None);
        };
        let command = match name.as_str() {
            "quiz" => Command::Quiz(quiz_id.ok_or(ArgsError::MissingFlag { flag: "--quiz-id" })?),
            "notes" => Command::Notes(
                article_id.ok_or(ArgsError::MissingFlag { flag: "--article-id" })?,
            ),
            "reactions" => Command::Reactions {
                article_id: article_id.ok_or(ArgsError::MissingFlag { flag: "--article-id" })?,
                toggle,
            },
            "annotations" => Command::Annotations {
                slide: slide.ok_or(ArgsError::MissingFlag { flag: "--slide-id" })?,
                like,
            },
            "progress" => Command::Progress,
            "glossary" => Command::Glossary { search },
            "timeline" => Command::Timeline,
            "logout" => Command::Logout,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };
        Ok(Some(Self {
            db_url,
            api_url,
            command,
        }))
    }

    fn remote_config(&self) -> Result<RemoteConfig, ArgsError> {
        let config = RemoteConfig::from_env().map_err(|_| ArgsError::InvalidApiUrl {
            raw: std::env::var("CLASSROOM_API_URL").unwrap_or_default(),
        })?;
        match &self.api_url {
            Some(raw) => RemoteConfig::new(raw)
                .map(|overridden| overridden.with_timeout(config.timeout))
                .map_err(|_| ArgsError::InvalidApiUrl { raw: raw.clone() }),
            None => Ok(config),
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Logs go to stderr so prompts on stdout stay readable.
fn init_tracing() {
    let result = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .try_init();
    if let Err(err) = result {
        eprintln!("logging already initialised: {err}");
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    let remote = parsed.remote_config()?;
    // The identity cache lives in SQLite; open and migrate it in the binary glue.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, remote, Clock::default_clock()).await?;
    let console = Arc::new(Console::new());

    tracing::debug!(command = ?parsed.command, "starting");
    match parsed.command {
        Command::Quiz(quiz_id) => commands::quiz(&services, &console, quiz_id).await,
        Command::Notes(article_id) => commands::notes(&services, &console, article_id).await,
        Command::Reactions { article_id, toggle } => {
            commands::reactions(&services, &console, article_id, toggle).await
        }
        Command::Annotations { slide, like } => {
            commands::annotations(&services, &console, slide, like).await
        }
        Command::Progress => commands::progress(&services, &console).await,
        Command::Glossary { search } => commands::glossary(&services, &console, search).await,
        Command::Timeline => commands::timeline(&services, &console).await,
        Command::Logout => commands::logout(&services, &console).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(raw.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_quiz_with_globals() {
        let parsed = args(&["--api", "http://school.test/", "quiz", "--quiz-id", "4", "--db", "sqlite::memory:"])
            .unwrap()
            .unwrap();
        assert_eq!(parsed.command, Command::Quiz(QuizId::new(4)));
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert_eq!(parsed.api_url.as_deref(), Some("http://school.test/"));
    }

    #[test]
    fn reactions_accept_a_toggle() {
        let parsed = args(&["reactions", "--article-id", "rome", "--toggle", "clap"])
            .unwrap()
            .unwrap();
        assert_eq!(
            parsed.command,
            Command::Reactions {
                article_id: ArticleId::new("rome"),
                toggle: Some(ReactionKind::Clap)
            }
        );
        assert!(matches!(
            args(&["reactions", "--article-id", "rome", "--toggle", "boo"]),
            Err(ArgsError::InvalidReaction { .. })
        ));
    }

    #[test]
    fn missing_required_flag_is_reported() {
        assert!(matches!(
            args(&["notes"]),
            Err(ArgsError::MissingFlag { flag: "--article-id" })
        ));
        assert!(matches!(
            args(&["quiz", "--quiz-id", "x"]),
            Err(ArgsError::InvalidId { flag: "--quiz-id", .. })
        ));
    }

    #[test]
    fn no_command_or_help_prints_usage() {
        assert!(args(&[]).unwrap().is_none());
        assert!(args(&["timeline", "--help"]).unwrap().is_none());
        assert!(matches!(args(&["dance"]), Err(ArgsError::UnknownCommand(_))));
    }

    #[test]
    fn logout_takes_no_flags() {
        let parsed = args(&["logout"]).unwrap().unwrap();
        assert_eq!(parsed.command, Command::Logout);
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/classroom.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/classroom.sqlite3"));
    }
}
