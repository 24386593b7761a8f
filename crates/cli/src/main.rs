mod demo;
mod render;

use std::fs;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cmdtree_core::{Diagnostic, Failure, Outcome, Reason, Registry, SenderKind};
use cmdtree_diagnostics as diag;
use cmdtree_profile::{ProfileSender, SenderProfile, load_profile_from_path};
use serde::Serialize;

use crate::demo::FailureLog;
use crate::render::{
    Format, print_json, print_messages, print_suggestions_pretty, print_summary,
    render_diagnostic_pretty,
};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "cmdtree",
    version,
    about = "cmdtree: dispatch and complete command lines against a demonstration command set"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Sender profile JSON to run as. Defaults to the operator console.
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Dispatch a command line (e.g. `run add 1 2`).
    Run {
        /// The command line, label first.
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            required_unless_present = "script"
        )]
        words: Vec<String>,
        /// Dispatch every non-empty line of a file instead (`-` for stdin).
        #[arg(long, conflicts_with = "words")]
        script: Option<String>,
    },

    /// Complete a partial command line. Quote it to keep trailing spaces.
    Suggest { line: String },

    /// List the available commands and their usage.
    List,

    /// Explain a reason code (e.g. CMD1003).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());
    let profile = cli.profile.as_deref();

    match cli.cmd {
        Cmd::Run { words, script } => {
            let lines = match script {
                Some(path) => read_script(&path)?,
                None => vec![words.join(" ")],
            };
            let session = Session::open(profile)?;
            cmd_run(&session, &lines, format)?;
        }
        Cmd::Suggest { line } => cmd_suggest(&Session::open(profile)?, &line, format)?,
        Cmd::List => cmd_list(&Session::open(profile)?.registry, format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

/// The sender, its failure log, and the registry they dispatch against.
struct Session {
    sender: ProfileSender,
    log: FailureLog,
    registry: Registry,
}

impl Session {
    fn open(profile: Option<&str>) -> Result<Self> {
        let sender = load_sender(profile)?;
        let log = FailureLog::default();
        let registry = demo::registry(&log)
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to build command registry")?;
        tracing::debug!(commands = registry.len(), "registry ready");
        Ok(Self {
            sender,
            log,
            registry,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_sender(profile: Option<&str>) -> Result<ProfileSender> {
    let profile = match profile {
        Some(path) => load_profile_from_path(path)
            .with_context(|| format!("failed to load profile '{path}'"))?,
        None => SenderProfile::console(),
    };
    tracing::debug!(sender = %profile.name, kind = %profile.kind, "loaded sender profile");
    Ok(ProfileSender::new(profile))
}

fn read_script(path: &str) -> Result<Vec<String>> {
    let text = if path == "-" {
        std::io::read_to_string(std::io::stdin()).context("failed to read script from stdin")?
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read script '{path}'"))?
    };
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

// ── Commands ────────────────────────────────────────────────────────────

fn outcome_name(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Executed => "executed",
        Outcome::Failed(_) => "failed",
        Outcome::Unhandled => "unhandled",
    }
}

/// One dispatched line in `run --output json`.
#[derive(Serialize)]
struct LineReport<'a> {
    line: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<Reason>,
    messages: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

fn cmd_run(session: &Session, lines: &[String], format: Format) -> Result<()> {
    let mut reports = Vec::with_capacity(lines.len());
    let (mut executed, mut failed) = (0usize, 0usize);

    for line in lines {
        let outcome = session
            .registry
            .dispatch_line(&session.sender, line)
            .with_context(|| format!("`{line}` aborted"))?;
        let messages = session.sender.drain_messages();
        let failures = session.log.drain();
        let reason = match outcome {
            Outcome::Executed => {
                executed += 1;
                None
            }
            Outcome::Failed(reason) => {
                failed += 1;
                Some(reason)
            }
            Outcome::Unhandled => {
                failed += 1;
                None
            }
        };

        match format {
            Format::Json => reports.push(LineReport {
                line,
                outcome: outcome_name(outcome),
                reason,
                messages,
                diagnostics: failures.iter().map(Failure::to_diagnostic).collect(),
            }),
            Format::Pretty => {
                print_messages(&messages);
                for failure in &failures {
                    render_diagnostic_pretty(
                        failure.input().command_line(),
                        &failure.to_diagnostic(),
                    );
                }
                if outcome == Outcome::Unhandled {
                    let label = line.split_whitespace().next().unwrap_or_default();
                    eprintln!("error: unknown command `{label}` (see `cmdtree list`)");
                }
            }
        }
    }

    match format {
        Format::Json => print_json(&serde_json::to_value(&reports)?)?,
        Format::Pretty => print_summary(executed, failed),
    }

    if failed > 0 {
        process::exit(1);
    }
    Ok(())
}

fn cmd_suggest(session: &Session, line: &str, format: Format) -> Result<()> {
    let suggestions = session.registry.suggest_line(&session.sender, line);
    match format {
        Format::Json => print_json(&serde_json::to_value(&suggestions)?)?,
        Format::Pretty => print_suggestions_pretty(&suggestions),
    }
    Ok(())
}

fn cmd_list(registry: &Registry, format: Format) -> Result<()> {
    let commands = registry.commands();
    match format {
        Format::Json => {
            let list: Vec<_> = commands
                .iter()
                .map(|spec| {
                    let arity = spec.parameter().arity();
                    serde_json::json!({
                        "label": spec.label(),
                        "aliases": spec.aliases(),
                        "usage": spec.usage(),
                        "min": arity.min,
                        "max": (arity.max != usize::MAX).then_some(arity.max),
                        "permission": spec.permission(),
                        "sender_kind": spec.sender_kind(),
                        "description": spec.description(),
                    })
                })
                .collect();
            print_json(&serde_json::json!(list))?;
        }
        Format::Pretty => {
            use ariadne::{Color, Fmt};
            for spec in &commands {
                let usage = spec.usage();
                let signature = if usage.is_empty() {
                    spec.label().to_owned()
                } else {
                    format!("{} {usage}", spec.label())
                };
                println!("{}", signature.fg(Color::Cyan));
                if let Some(description) = spec.description() {
                    println!("    {description}");
                }
                if !spec.aliases().is_empty() {
                    println!("    aliases: {}", spec.aliases().join(", "));
                }
                if let Some(permission) = spec.permission() {
                    println!("    permission: {permission}");
                }
                if spec.sender_kind() != SenderKind::Any {
                    println!("    senders: {}", spec.sender_kind());
                }
            }
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    let id = id.to_ascii_uppercase();
    let reason = Reason::from_code(&id);
    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "reason": reason,
                "summary": diag::summary(&id),
                "explanation": diag::explain(&id),
            });
            print_json(&out)?;
        }
        Format::Pretty => {
            // Explanation is the expected output: stdout, not stderr.
            if let (Some(reason), Some(text)) = (reason, diag::explain(&id)) {
                use ariadne::Fmt;
                println!("{} ({reason}): {text}", id.as_str().fg(ariadne::Color::Cyan));
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}
