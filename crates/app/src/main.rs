use std::fmt;
use std::path::PathBuf;

use onboard_core::model::{AdminScope, LearnerId, ModuleDraft, ModuleId, StaffMember};
use onboard_core::quiz::QuizStep;
use services::{AppServices, Clock, PortalConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidModuleId { raw: String },
    InvalidAnswers { raw: String },
    UnknownStaff { email: String },
    NotAdmin { email: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidModuleId { raw } => write!(f, "invalid module id: {raw}"),
            ArgsError::InvalidAnswers { raw } => {
                write!(f, "invalid --answers value (expected e.g. 0,2,1): {raw}")
            }
            ArgsError::UnknownStaff { email } => write!(f, "{email} is not in the staff roster"),
            ArgsError::NotAdmin { email } => write!(f, "{email} has no admin scope"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  onboard [--config <file>] [--db <sqlite_url>] <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  modules --as <email>                         Show curriculum and status");
    eprintln!("  watch <module-id> --as <email>               Mark a video as watched");
    eprintln!("  rewatch <module-id> --as <email>             Reset a module to re-watch");
    eprintln!("  quiz <module-id> --as <email> --answers 0,1  Take a quiz");
    eprintln!("  add-module <draft.json> [--generate]         Author a module");
    eprintln!("  report --as <admin-email> [--search <term>]  Staff progress report");
    eprintln!("  delete-learner <email> --as <hr-email>       Remove a learner's progress");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ONBOARD_DATABASE_URL overrides database_url from the config file");
    eprintln!("  RUST_LOG overrides log_filter from the config file");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Modules,
    Watch,
    Rewatch,
    Quiz,
    AddModule,
    Report,
    DeleteLearner,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "modules" => Some(Self::Modules),
            "watch" => Some(Self::Watch),
            "rewatch" => Some(Self::Rewatch),
            "quiz" => Some(Self::Quiz),
            "add-module" => Some(Self::AddModule),
            "report" => Some(Self::Report),
            "delete-learner" => Some(Self::DeleteLearner),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    db_url: Option<String>,
    command: Option<Command>,
    positional: Vec<String>,
    acting_as: Option<String>,
    answers: Vec<usize>,
    search: String,
    generate: bool,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    parsed.config = Some(PathBuf::from(require_value(&mut args, "--config")?));
                }
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(value);
                }
                "--as" => parsed.acting_as = Some(require_value(&mut args, "--as")?),
                "--answers" => {
                    let value = require_value(&mut args, "--answers")?;
                    parsed.answers = parse_answers(&value)?;
                }
                "--search" => parsed.search = require_value(&mut args, "--search")?,
                "--generate" => parsed.generate = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if parsed.command.is_none() => {
                    parsed.command = Some(
                        Command::from_arg(&arg).ok_or(ArgsError::UnknownCommand(arg.clone()))?,
                    );
                }
                _ => parsed.positional.push(arg),
            }
        }

        Ok(parsed)
    }

    fn command(&self) -> Result<Command, ArgsError> {
        self.command.ok_or(ArgsError::MissingArg { what: "command" })
    }

    fn first_positional(&self, what: &'static str) -> Result<&str, ArgsError> {
        self.positional
            .first()
            .map(String::as_str)
            .ok_or(ArgsError::MissingArg { what })
    }

    fn module_id(&self) -> Result<ModuleId, ArgsError> {
        let raw = self.first_positional("module id")?;
        raw.parse()
            .map_err(|_| ArgsError::InvalidModuleId { raw: raw.to_string() })
    }

    fn acting_as(&self) -> Result<&str, ArgsError> {
        self.acting_as
            .as_deref()
            .ok_or(ArgsError::MissingValue { flag: "--as" })
    }
}

fn parse_answers(raw: &str) -> Result<Vec<usize>, ArgsError> {
    raw.split(',')
        .map(|part| part.trim().parse::<usize>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ArgsError::InvalidAnswers { raw: raw.to_string() })
}

fn find_staff(roster: &[StaffMember], email: &str) -> Result<StaffMember, ArgsError> {
    let unknown = || ArgsError::UnknownStaff {
        email: email.to_string(),
    };
    let id = LearnerId::new(email).map_err(|_| unknown())?;
    roster
        .iter()
        .find(|m| m.learner_id == id)
        .cloned()
        .ok_or_else(unknown)
}

fn admin_scope(member: &StaffMember) -> Result<AdminScope, ArgsError> {
    member.admin_scope.ok_or_else(|| ArgsError::NotAdmin {
        email: member.learner_id.to_string(),
    })
}

fn init_tracing(config: &PortalConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // file, then environment, then --db
    let mut config = PortalConfig::load(args.config.as_deref())?
        .with_env_overrides(|key| std::env::var(key).ok())?;
    if let Some(db_url) = &args.db_url {
        config.database_url.clone_from(db_url);
    }
    init_tracing(&config);

    let command = args.command().map_err(|e| {
        print_usage();
        e
    })?;
    let roster = config.staff_members()?;
    let services = AppServices::new_sqlite(&config.database_url, Clock::default()).await?;

    match command {
        Command::Modules => {
            let member = find_staff(&roster, args.acting_as()?)?;
            let learner = services.learner(member).await?;
            println!(
                "{} ({}) {}",
                learner.learner().name,
                learner.learner().role.label(),
                learner.completion().label()
            );
            for entry in learner.curriculum() {
                let module = entry.module;
                let score = entry
                    .progress
                    .and_then(|p| p.score())
                    .map_or_else(|| "-".to_string(), |s| s.to_string());
                println!(
                    "  [{id:>3}] {folder} / {title:<32} {status:<18} {pct:>3}%  score {score}",
                    id = module.id().value(),
                    folder = module.folder_name(),
                    title = module.title(),
                    status = entry.status.label(),
                    pct = entry.status.completion_percent(),
                );
            }
        }
        Command::Watch => {
            let member = find_staff(&roster, args.acting_as()?)?;
            let mut learner = services.learner(member).await?;
            let record = learner.mark_video_watched(args.module_id()?).await?;
            println!("video watched for module {}", record.module_id());
        }
        Command::Rewatch => {
            let member = find_staff(&roster, args.acting_as()?)?;
            let mut learner = services.learner(member).await?;
            let record = learner.rewatch(args.module_id()?).await?;
            println!("module {} reset; watch the video again", record.module_id());
        }
        Command::Quiz => {
            let member = find_staff(&roster, args.acting_as()?)?;
            let mut learner = services.learner(member).await?;
            let module_id = args.module_id()?;
            let expected = learner
                .modules()
                .iter()
                .find(|m| m.id() == module_id)
                .map_or(0, |m| m.questions().len());
            if expected > 0 && args.answers.len() != expected {
                return Err(ArgsError::InvalidAnswers {
                    raw: format!(
                        "{} answers given, quiz has {expected} questions",
                        args.answers.len()
                    ),
                }
                .into());
            }
            let mut session = learner.start_quiz(module_id).await?;
            for &answer in &args.answers {
                if let QuizStep::Finished { outcome, .. } =
                    learner.submit_answer(&mut session, answer).await?
                {
                    let verdict = if outcome.passed { "passed" } else { "failed" };
                    println!(
                        "{verdict}: {} ({}/{} correct)",
                        outcome.score, outcome.correct, outcome.total
                    );
                }
            }
        }
        Command::AddModule => {
            let path = args.first_positional("draft file")?;
            let raw = std::fs::read_to_string(path)?;
            let mut draft: ModuleDraft = serde_json::from_str(&raw)?;
            let catalog = services.catalog();
            if args.generate {
                draft.questions = catalog
                    .generate_questions(&draft.transcript, draft.role)
                    .await?;
            }
            let module = catalog.add_module(draft).await?;
            println!(
                "added module {} \"{}\" at position {} for {}",
                module.id(),
                module.title(),
                module.ordinal(),
                module.role().label()
            );
        }
        Command::Report => {
            let admin = find_staff(&roster, args.acting_as()?)?;
            let scope = admin_scope(&admin)?;
            let rows = services
                .reports()
                .progress_report(scope, &roster, &args.search)
                .await?;
            println!("Scope: {scope}");
            for row in rows {
                println!(
                    "  {name:<24} {email:<32} {role:<16} {pct:>3}%  {label}",
                    name = row.member.name,
                    email = row.member.learner_id.as_str(),
                    role = row.member.role.label(),
                    pct = row.stats.percent(),
                    label = row.stats.label(),
                );
            }
        }
        Command::DeleteLearner => {
            let admin = find_staff(&roster, args.acting_as()?)?;
            let scope = admin_scope(&admin)?;
            let target = LearnerId::new(args.first_positional("learner email")?)?;
            let removed = services.reports().delete_learner(scope, &target).await?;
            println!("removed {removed} progress records for {target}");
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
