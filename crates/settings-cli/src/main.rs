//! `settings-migrate`: apply TOML migration plans to settings files

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use settings_migration::{MigrationPlan, Settings};

mod logging;

fn cli() -> Command {
    Command::new("settings-migrate")
        .version(settings_migration::VERSION)
        .about("Migrate hierarchical settings documents between versions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("migrate")
                .about("Apply a migration plan to a settings file")
                .arg(input_arg())
                .arg(
                    Arg::new("plan")
                        .long("plan")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML migration plan"),
                )
                .arg(
                    Arg::new("target")
                        .long("target")
                        .value_parser(value_parser!(u32))
                        .help("Version to migrate to (defaults to the plan's target)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the result here instead of back to the input"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Print the migrated document without writing any file"),
                ),
        )
        .subcommand(
            Command::new("version")
                .about("Print the version stored in a settings file")
                .arg(input_arg()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a settings file in canonical form")
                .arg(input_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("fingerprint")
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("fingerprint")
                        .long("fingerprint")
                        .action(ArgAction::SetTrue)
                        .help("Print the document's Blake3 fingerprint"),
                ),
        )
}

fn input_arg() -> Arg {
    Arg::new("input")
        .long("input")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Settings file")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MigrateArgs {
    input: PathBuf,
    plan: PathBuf,
    target: Option<u32>,
    output: Option<PathBuf>,
    dry_run: bool,
}

impl MigrateArgs {
    fn from_matches(args: &ArgMatches) -> Result<Self> {
        Ok(Self {
            input: required_path(args, "input")?,
            plan: required_path(args, "plan")?,
            target: args.get_one::<u32>("target").copied(),
            output: args.get_one::<PathBuf>("output").cloned(),
            dry_run: args.get_flag("dry-run"),
        })
    }
}

fn required_path(args: &ArgMatches, id: &str) -> Result<PathBuf> {
    args.get_one::<PathBuf>(id)
        .cloned()
        .with_context(|| format!("missing --{id}"))
}

fn load_settings(path: &Path) -> Result<Settings> {
    Settings::load(path).with_context(|| format!("failed to load settings from {}", path.display()))
}

fn migrate(args: &MigrateArgs, out: &mut impl Write) -> Result<()> {
    let plan = MigrationPlan::load(&args.plan)
        .with_context(|| format!("failed to load plan {}", args.plan.display()))?;
    let target = args.target.unwrap_or_else(|| plan.effective_target());
    let engine = plan.into_engine().context("invalid migration plan")?;

    let mut settings = load_settings(&args.input)?;
    let report = settings
        .migrate(&engine, target)
        .with_context(|| format!("failed to migrate {}", args.input.display()))?;

    writeln!(
        out,
        "{}: version {} -> {}",
        args.input.display(),
        report.from_version(),
        report.to_version()
    )?;
    for step in report.applied() {
        writeln!(out, "  [{}] {}", step.version, step.description)?;
    }
    writeln!(
        out,
        "  fingerprint {} -> {}",
        report.fingerprint_before().short(),
        report.fingerprint_after().short()
    )?;

    if args.dry_run {
        write!(out, "{}", settings.to_text())?;
        return Ok(());
    }

    match &args.output {
        Some(output) => {
            settings.save_as(output)?;
            tracing::info!(path = %output.display(), "wrote migrated settings");
        }
        None if report.is_migrated() => {
            settings.save()?;
            tracing::info!(path = %args.input.display(), "updated settings in place");
        }
        None => tracing::info!("settings already up to date"),
    }
    Ok(())
}

fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    match matches.subcommand() {
        Some(("migrate", args)) => migrate(&MigrateArgs::from_matches(args)?, out),
        Some(("version", args)) => {
            let settings = load_settings(&required_path(args, "input")?)?;
            writeln!(out, "{}", settings.version())?;
            Ok(())
        }
        Some(("show", args)) => {
            let settings = load_settings(&required_path(args, "input")?)?;
            if args.get_flag("fingerprint") {
                writeln!(out, "{}", settings.tree().fingerprint())?;
            } else if args.get_flag("json") {
                let json = serde_json::to_string_pretty(&settings.tree().to_json())?;
                writeln!(out, "{json}")?;
            } else {
                write!(out, "{}", settings.to_text())?;
            }
            Ok(())
        }
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    }
}

fn main() -> Result<()> {
    logging::init();
    let matches = cli().get_matches();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&matches, &mut out)
}
