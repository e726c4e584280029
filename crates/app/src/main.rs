mod fixture;
mod logging;
mod play;

use std::fmt;
use std::sync::Arc;

use lesson_core::model::{ActivityKind, ChapterId, TopicId, TopicStatus, UserId};
use lesson_core::{Clock, LessonSettings};
use services::{LoggedSpeech, SessionOrchestrator};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::play::{PLAY_HELP, PlayCommand, parse_command, render_outcome, render_view};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidActivity { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "{flag} expects a non-negative integer, got: {raw}")
            }
            ArgsError::InvalidActivity { raw } => write!(
                f,
                "invalid --activity value: {raw} (flashcard, matching, quiz, scramble, sayit)"
            ),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

/// Parse an optional value such as an environment variable. Unset is `None`,
/// anything unparsable is an error.
fn optional_number<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
) -> Result<Option<T>, ArgsError> {
    raw.map(|value| parse_number(name, value)).transpose()
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- seed     [--db <sqlite_url>] [--fixture <file.json>]");
    eprintln!("  cargo run -p app -- progress [--db <url>] [--user <id>] [--chapter <id>]");
    eprintln!("  cargo run -p app -- reset    [--db <url>] [--user <id>] [--chapter <id>] --topic <id>");
    eprintln!(
        "  cargo run -p app -- play     [--db <url>] [--user <id>] [--chapter <id>] --topic <id> --activity <kind> [--seed <n>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lessons.sqlite3");
    eprintln!("  --user learner");
    eprintln!("  --chapter about-me");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_USER_ID, LESSON_CHAPTER_ID, LESSON_QUIZ_LIVES,");
    eprintln!("  LESSON_SEED, LESSON_LOG (tracing filter, default \"info\")");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Seed,
    Progress,
    Reset,
    Play,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "seed" => Some(Self::Seed),
            "progress" => Some(Self::Progress),
            "reset" => Some(Self::Reset),
            "play" => Some(Self::Play),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user: UserId,
    chapter: ChapterId,
    topic: Option<TopicId>,
    activity: Option<ActivityKind>,
    fixture: Option<String>,
    quiz_lives: Option<u32>,
    seed: Option<u64>,
}

impl Args {
    fn defaults() -> Result<Self, ArgsError> {
        let db_url = std::env::var("LESSON_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://lessons.sqlite3".into(), normalize_sqlite_url);
        let user = parse_id(
            "--user",
            std::env::var("LESSON_USER_ID").unwrap_or_else(|_| "learner".into()),
            UserId::new,
        )?;
        let chapter = parse_id(
            "--chapter",
            std::env::var("LESSON_CHAPTER_ID").unwrap_or_else(|_| "about-me".into()),
            ChapterId::new,
        )?;
        let quiz_lives =
            optional_number("LESSON_QUIZ_LIVES", std::env::var("LESSON_QUIZ_LIVES").ok())?;
        let seed = optional_number("LESSON_SEED", std::env::var("LESSON_SEED").ok())?;

        Ok(Self {
            db_url,
            user,
            chapter,
            topic: None,
            activity: None,
            fixture: None,
            quiz_lives,
            seed,
        })
    }

    fn parse(cmd: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::defaults()?;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    parsed.user = parse_id("--user", value, UserId::new)?;
                }
                "--chapter" => {
                    let value = require_value(args, "--chapter")?;
                    parsed.chapter = parse_id("--chapter", value, ChapterId::new)?;
                }
                "--topic" => {
                    let value = require_value(args, "--topic")?;
                    parsed.topic = Some(parse_id("--topic", value, TopicId::new)?);
                }
                "--activity" => {
                    let value = require_value(args, "--activity")?;
                    let kind = ActivityKind::from_key(value.trim())
                        .ok_or(ArgsError::InvalidActivity { raw: value })?;
                    parsed.activity = Some(kind);
                }
                "--fixture" => {
                    parsed.fixture = Some(require_value(args, "--fixture")?);
                }
                "--lives" => {
                    let value = require_value(args, "--lives")?;
                    parsed.quiz_lives = Some(parse_number("--lives", value)?);
                }
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    parsed.seed = Some(parse_number("--seed", value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        match cmd {
            Command::Reset | Command::Play if parsed.topic.is_none() => {
                return Err(ArgsError::MissingValue { flag: "--topic" });
            }
            Command::Play if parsed.activity.is_none() => {
                return Err(ArgsError::MissingValue { flag: "--activity" });
            }
            _ => {}
        }
        Ok(parsed)
    }

    fn settings(&self) -> Result<LessonSettings, Box<dyn std::error::Error>> {
        let defaults = LessonSettings::default();
        let settings = LessonSettings::new(
            self.quiz_lives.unwrap_or(defaults.quiz_lives()),
            defaults.matching_pairs(),
            defaults.quiz_word_limit(),
            defaults.wrong_flash_ms(),
            defaults.speech_locale(),
        )?;
        Ok(settings.with_shuffle_seed(self.seed))
    }
}

fn parse_id<T>(
    flag: &'static str,
    raw: String,
    build: impl FnOnce(String) -> Result<T, lesson_core::model::ParseIdError>,
) -> Result<T, ArgsError> {
    build(raw.clone()).map_err(|_| ArgsError::InvalidId { flag, raw })
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

fn status_label(status: TopicStatus) -> &'static str {
    match status {
        TopicStatus::Locked => "locked",
        TopicStatus::Unlocked => "unlocked",
        TopicStatus::Completed => "completed",
    }
}

async fn print_progress(
    orchestrator: &mut SessionOrchestrator,
    user: &UserId,
    chapter: &ChapterId,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = orchestrator.progress_graph(chapter).await?;
    println!("{chapter} (user {user})");
    for topic in graph.catalog().topics() {
        let progress = graph.snapshot(user, &topic.id).await?;
        let activities: Vec<String> = ActivityKind::all()
            .iter()
            .map(|kind| {
                let mark = if progress.is_completed(*kind) {
                    match progress.outcome(*kind) {
                        Some(outcome) => format!("{}/{}", outcome.score, outcome.total),
                        None => "done".to_string(),
                    }
                } else if progress.is_unlocked(*kind) {
                    "open".to_string()
                } else {
                    "-".to_string()
                };
                format!("{kind}:{mark}")
            })
            .collect();
        let next = progress
            .next_available()
            .map_or_else(String::new, |kind| format!("  next: {kind}"));
        println!(
            "  {:>2}. {:<24} {:<9} {}{next}",
            topic.order,
            topic.title,
            status_label(progress.status()),
            activities.join(" ")
        );
    }
    Ok(())
}

async fn play(
    orchestrator: &mut SessionOrchestrator,
    clock: Clock,
    args: &Args,
    topic: &TopicId,
    kind: ActivityKind,
) -> Result<(), Box<dyn std::error::Error>> {
    let view = orchestrator
        .start_activity(&args.user, &args.chapter, topic, kind)
        .await?;
    println!("{}", render_view(&view));
    println!("type `help` for commands");

    let speaking = kind == ActivityKind::SpeakIt;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(view) = orchestrator.tick(clock.now()) {
            println!("{}", render_view(&view));
        }
        let command = match parse_command(&line, speaking) {
            Ok(command) => command,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        let input = match command {
            PlayCommand::Input(input) => input,
            PlayCommand::Show => {
                if let Some(view) = orchestrator.current_puzzle_state() {
                    println!("{}", render_view(&view));
                }
                continue;
            }
            PlayCommand::Help => {
                println!("{PLAY_HELP}");
                continue;
            }
            PlayCommand::Quit => {
                orchestrator.abandon();
                return Ok(());
            }
        };

        match orchestrator.submit(input, clock.now()).await {
            Ok(update) => {
                print!("{}", render_view(&update.view));
                if let Some(outcome) = update.outcome {
                    println!("{}", render_outcome(&outcome));
                    return Ok(());
                }
            }
            Err(services::SessionError::PersistenceFailure(err)) => {
                eprintln!("could not save progress: {err}; retrying once");
                let update = orchestrator.retry_completion().await?;
                if let Some(outcome) = update.outcome {
                    println!("{}", render_outcome(&outcome));
                }
                return Ok(());
            }
            Err(err) => eprintln!("{err}"),
        }
    }
    orchestrator.abandon();
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init_tracing(std::env::var("LESSON_LOG").ok().as_deref());

    // Open + migrate SQLite at startup; the library crates never touch the filesystem.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    let clock = Clock::system();
    let mut orchestrator = SessionOrchestrator::new(clock, Arc::clone(&storage.documents))
        .with_settings(parsed.settings()?)
        .with_speech(Arc::new(LoggedSpeech));

    match cmd {
        Command::Seed => {
            let text = match &parsed.fixture {
                Some(file) => std::fs::read_to_string(file)?,
                None => fixture::DEMO_FIXTURE.to_string(),
            };
            let count = fixture::load_fixture(storage.documents.as_ref(), &text).await?;
            println!("seeded {count} documents into {}", parsed.db_url);
            Ok(())
        }
        Command::Progress => print_progress(&mut orchestrator, &parsed.user, &parsed.chapter).await,
        Command::Reset => {
            let topic = parsed
                .topic
                .clone()
                .ok_or(ArgsError::MissingValue { flag: "--topic" })?;
            let graph = orchestrator.progress_graph(&parsed.chapter).await?;
            let progress = graph.reset(&parsed.user, &topic).await?;
            println!("{topic}: {}", status_label(progress.status()));
            Ok(())
        }
        Command::Play => {
            let topic = parsed
                .topic
                .clone()
                .ok_or(ArgsError::MissingValue { flag: "--topic" })?;
            let kind = parsed
                .activity
                .ok_or(ArgsError::MissingValue { flag: "--activity" })?;
            play(&mut orchestrator, clock, &parsed, &topic, kind).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
