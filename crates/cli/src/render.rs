//! Pretty diagnostic rendering using ariadne.
//!
//! Converts dispatch failures into ariadne [`Report`]s annotated against the
//! command line that caused them. Falls back to structured JSON when the
//! output is piped or when the user explicitly requests it.

use std::io::{self, IsTerminal};

use ariadne::{Color, Config, Fmt, Label, Report, ReportKind, Source};
use cmdtree_core::Suggestion;
use cmdtree_diagnostics::Diagnostic;

// ── Output format ───────────────────────────────────────────────────────

/// Output format for results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Coloured, source-annotated output (ariadne).
    Pretty,
    /// Machine-readable JSON.
    Json,
}

impl Format {
    /// Use the explicit choice, or detect from whether stdout is a TTY.
    pub(crate) fn resolve_or_detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("json") => Format::Json,
            Some("pretty") => Format::Pretty,
            // Default: pretty for interactive terminals, JSON for pipes
            _ => {
                if io::stdout().is_terminal() {
                    Format::Pretty
                } else {
                    Format::Json
                }
            }
        }
    }
}

// ── Pretty rendering ────────────────────────────────────────────────────

fn context_note(diag: &Diagnostic) -> Option<String> {
    let ctx = diag.context.as_ref().filter(|ctx| !ctx.is_empty())?;
    Some(
        ctx.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Render one failure diagnostic against `command_line`, to stderr.
///
/// Diagnostics with a span are underlined in the command line; those without
/// one are printed as standalone messages.
pub(crate) fn render_diagnostic_pretty(command_line: &str, diag: &Diagnostic) {
    const SOURCE: &str = "<command>";

    let Some(span) = &diag.span else {
        eprintln!("error[{}]: {}", diag.id, diag.message);
        if let Some(note) = context_note(diag) {
            eprintln!("  = note: {note}");
        }
        if let Some(explanation) = diag.explain() {
            eprintln!("  = help: {explanation}");
        }
        return;
    };

    // Clamp span to the line to avoid panics on truncated input.
    let start = span.start.min(command_line.len());
    let end = span.end.min(command_line.len()).max(start);

    let mut builder = Report::build(ReportKind::Error, (SOURCE, start..end))
        .with_code(diag.id.as_ref())
        .with_message(&diag.message)
        .with_config(Config::default().with_compact(false))
        .with_label(
            Label::new((SOURCE, start..end))
                .with_message(diag.reason.summary())
                .with_color(Color::Red),
        );
    if let Some(note) = context_note(diag) {
        builder = builder.with_note(note);
    }
    if let Some(explanation) = diag.explain() {
        builder = builder.with_help(explanation);
    }

    builder
        .finish()
        .eprint((SOURCE, Source::from(command_line)))
        .ok();
}

/// Print sender messages to stdout, one per line.
pub(crate) fn print_messages(messages: &[String]) {
    for message in messages {
        println!("{message}");
    }
}

/// Print completion candidates to stdout, one per line.
pub(crate) fn print_suggestions_pretty(suggestions: &[Suggestion]) {
    for s in suggestions {
        match &s.tooltip {
            Some(tip) => println!("{}  {}", s.text, tip.as_str().fg(Color::Cyan)),
            None => println!("{}", s.text),
        }
    }
}

// ── Summary line ────────────────────────────────────────────────────────

/// Print a coloured summary line such as `2 executed, 1 failed`.
pub(crate) fn print_summary(executed: usize, failed: usize) {
    if executed + failed <= 1 {
        return;
    }
    let mut parts = vec![format!("{}", format!("{executed} executed").fg(Color::Green))];
    if failed > 0 {
        parts.push(format!("{}", format!("{failed} failed").fg(Color::Red)));
    }
    eprintln!("{}", parts.join(", "));
}

// ── JSON rendering ──────────────────────────────────────────────────────

/// Print a JSON value to stdout.
pub(crate) fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
