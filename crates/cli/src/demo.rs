//! The built-in demonstration command set.
//!
//! A tiny in-memory "world" with a few players stands in for a real host, so
//! that every leaf, combinator, and failure path can be exercised from the
//! command line.

use std::sync::{Arc, Mutex, PoisonError};

use cmdtree_core::suggest::filter_prefix;
use cmdtree_core::{
    BoxError, CasePolicy, CommandHost, CommandInput, CommandSpec, EnumRepository, Failure,
    FailureHandler, FirstArgument, MutableParameter, NamedConstant, Parameter, Registry, Resolver,
    Sender, SenderKind, StaticSuggestions, Suggestion, Value,
};

// ── Failure capture ─────────────────────────────────────────────────────

/// Collects failures so the CLI can render them after dispatch returns.
#[derive(Clone, Default)]
pub(crate) struct FailureLog {
    failures: Arc<Mutex<Vec<Failure>>>,
}

impl FailureLog {
    pub(crate) fn drain(&self) -> Vec<Failure> {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *failures)
    }
}

impl FailureHandler for FailureLog {
    fn handle(&self, _sender: &dyn Sender, failure: Failure) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(failure);
    }
}

// ── World ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl NamedConstant for GameMode {
    fn constants() -> &'static [Self] {
        &[
            GameMode::Survival,
            GameMode::Creative,
            GameMode::Adventure,
            GameMode::Spectator,
        ]
    }

    fn name(self) -> &'static str {
        match self {
            GameMode::Survival => "SURVIVAL",
            GameMode::Creative => "CREATIVE",
            GameMode::Adventure => "ADVENTURE",
            GameMode::Spectator => "SPECTATOR",
        }
    }
}

/// Shape accepted by the `value` command, switched with `setmode`.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueMode {
    Int,
    Bool,
    Text,
}

impl NamedConstant for ValueMode {
    fn constants() -> &'static [Self] {
        &[ValueMode::Int, ValueMode::Bool, ValueMode::Text]
    }

    fn name(self) -> &'static str {
        match self {
            ValueMode::Int => "int",
            ValueMode::Bool => "bool",
            ValueMode::Text => "text",
        }
    }

    fn type_label() -> String {
        "mode".into()
    }
}

impl ValueMode {
    fn parameter(self) -> Parameter {
        match self {
            ValueMode::Int => Parameter::integer(),
            ValueMode::Bool => Parameter::boolean(),
            ValueMode::Text => Parameter::text(),
        }
    }
}

const PLAYERS: [&str; 3] = ["alice", "albert", "bob"];
const WORLDS: [&str; 3] = ["overworld", "nether", "end"];

#[derive(Debug, Clone, PartialEq)]
struct Place {
    world: &'static str,
    x: f64,
    y: f64,
    z: f64,
}

fn coordinate(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Online players by exact name.
struct Players;

impl Resolver for Players {
    fn resolve(&self, _sender: &dyn Sender, tokens: &[String]) -> Result<Option<Value>, BoxError> {
        let name = tokens.first().map(String::as_str).unwrap_or_default();
        Ok(PLAYERS
            .iter()
            .find(|p| **p == name)
            .map(|p| Value::object(*p, *p)))
    }

    fn suggest(&self, _sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        filter_prefix(PLAYERS.map(Suggestion::new), input.last_argument())
    }
}

/// `<world> <x> <y> <z>`.
struct Places;

impl Resolver for Places {
    fn resolve(&self, _sender: &dyn Sender, tokens: &[String]) -> Result<Option<Value>, BoxError> {
        let [world, x, y, z] = tokens else {
            return Err(format!("expected 4 tokens, got {}", tokens.len()).into());
        };
        let Some(&world) = WORLDS.iter().find(|w| **w == world.as_str()) else {
            return Ok(None);
        };
        let (Some(x), Some(y), Some(z)) = (coordinate(x), coordinate(y), coordinate(z)) else {
            return Ok(None);
        };
        let place = Place { world, x, y, z };
        let label = format!("{world} ({x}, {y}, {z})");
        Ok(Some(Value::object(label, place)))
    }

    fn suggest(&self, _sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        if input.argument_count() == 1 {
            filter_prefix(WORLDS.map(Suggestion::new), input.last_argument())
        } else {
            Vec::new()
        }
    }
}

// ── Executors ───────────────────────────────────────────────────────────

fn echo(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    sender.send_message(&value.to_string());
    Ok(())
}

fn add(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let (a, b) = value.as_pair().ok_or("add expects a pair")?;
    let (a, b) = (a.as_int().unwrap_or_default(), b.as_int().unwrap_or_default());
    match a.checked_add(b) {
        Some(sum) => sender.send_message(&sum.to_string()),
        None => sender.send_message("overflow"),
    }
    Ok(())
}

fn toggle(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let on = value.as_bool().ok_or("toggle expects a bool")?;
    sender.send_message(if on { "enabled" } else { "disabled" });
    Ok(())
}

fn scale(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let (n, factor) = value.as_pair().ok_or("scale expects a pair")?;
    let n = n.as_double().unwrap_or_default();
    let factor = factor.as_double().unwrap_or(2.0);
    sender.send_message(&(n * factor).to_string());
    Ok(())
}

fn sum(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let items = value.as_list().ok_or("sum expects a list")?;
    let total = items
        .iter()
        .filter_map(Value::as_int)
        .try_fold(0i64, i64::checked_add);
    match total {
        Some(total) => sender.send_message(&total.to_string()),
        None => sender.send_message("overflow"),
    }
    Ok(())
}

fn uuid(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let id = value.as_uuid().ok_or("uuid expects a uuid")?;
    sender.send_message(&format!("{id} (version {})", id.get_version_num()));
    Ok(())
}

fn gamemode(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let (mode, target) = value.as_pair().ok_or("gamemode expects a pair")?;
    let mode = mode
        .downcast_ref::<GameMode>()
        .ok_or("gamemode expects a mode")?;
    let target = target.downcast_ref::<&str>().copied().unwrap_or(sender.name());
    sender.send_message(&format!(
        "set {target}'s game mode to {}",
        mode.name().to_lowercase()
    ));
    Ok(())
}

fn tp(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let (player, place) = value.as_pair().ok_or("tp expects a pair")?;
    let player = player.downcast_ref::<&str>().ok_or("tp expects a player")?;
    let place = place.downcast_ref::<Place>().ok_or("tp expects a place")?;
    sender.send_message(&format!(
        "teleported {player} to {} ({}, {}, {})",
        place.world, place.x, place.y, place.z
    ));
    Ok(())
}

fn msg(sender: &dyn Sender, value: Value, _: &CommandInput) -> Result<(), BoxError> {
    let (to, text) = value.as_pair().ok_or("msg expects a pair")?;
    let to = to.downcast_ref::<&str>().ok_or("msg expects a player")?;
    sender.send_message(&format!("[{} -> {to}] {text}", sender.name()));
    Ok(())
}

/// Switches `slot` to the selected mode's parameter.
fn setmode(
    slot: MutableParameter,
) -> impl Fn(&dyn Sender, Value, &CommandInput) -> Result<(), BoxError> + Send + Sync + 'static {
    move |sender, value, _| {
        let mode = value
            .downcast_ref::<ValueMode>()
            .ok_or("setmode expects a mode")?;
        slot.set(mode.parameter());
        sender.send_message(&format!("value now takes {}", mode.name()));
        Ok(())
    }
}

// ── Registry ────────────────────────────────────────────────────────────

/// Build the demonstration registry; every command reports failures to `log`.
pub(crate) fn registry(log: &FailureLog) -> Result<Registry, BoxError> {
    let enums = EnumRepository::new();
    let registry = Registry::new();
    let player = || Parameter::lookup("player", 1, Players);

    registry.register(
        CommandSpec::new("echo", Parameter::text(), echo)
            .with_alias("say")
            .with_handler(log.clone())
            .with_description("Repeat the given text"),
    )?;
    registry.register(
        CommandSpec::new(
            "add",
            Parameter::sequence(Parameter::integer(), Parameter::integer())?,
            add,
        )
        .with_permission("demo.math.add")
        .with_handler(log.clone())
        .with_description("Add two whole numbers"),
    )?;
    registry.register(
        CommandSpec::new("toggle", Parameter::boolean(), toggle)
            .with_handler(log.clone())
            .with_description("Switch something on or off"),
    )?;
    registry.register(
        CommandSpec::new(
            "scale",
            Parameter::sequence(Parameter::double(), Parameter::optional(Parameter::double()))?,
            scale,
        )
        .with_permission("demo.math.scale")
        .with_handler(log.clone())
        .with_description("Multiply a number by a factor (default 2)"),
    )?;
    registry.register(
        CommandSpec::new(
            "sum",
            Parameter::repetition(Parameter::integer(), 1, 16)?,
            sum,
        )
        .with_permission("demo.math.sum")
        .with_handler(log.clone())
        .with_description("Add up to sixteen whole numbers"),
    )?;
    registry.register(
        CommandSpec::new("uuid", Parameter::uuid(), uuid)
            .with_handler(log.clone())
            .with_description("Inspect a UUID"),
    )?;
    registry.register(
        CommandSpec::new(
            "gamemode",
            Parameter::sequence(
                enums.parameter::<GameMode>(CasePolicy::UpperInsensitive),
                Parameter::optional(player()?),
            )?,
            gamemode,
        )
        .with_alias("gm")
        .with_permission("demo.gamemode")
        .with_handler(log.clone())
        .with_description("Change a player's game mode"),
    )?;
    registry.register(
        CommandSpec::new(
            "tp",
            Parameter::sequence(player()?, Parameter::lookup("place", 4, Places)?)?,
            tp,
        )
        .with_alias("teleport")
        .with_permission("demo.tp")
        .with_handler(log.clone())
        .with_description("Teleport a player to a place"),
    )?;
    registry.register(
        CommandSpec::new(
            "msg",
            Parameter::sequence(player()?, Parameter::text())?,
            msg,
        )
        .with_alias("tell")
        .with_sender_kind(SenderKind::Player)
        .with_handler(log.clone())
        .with_description("Whisper to another player"),
    )?;

    // `value` takes whatever shape `setmode` last selected.
    let slot = MutableParameter::with(ValueMode::Int.parameter());
    registry.register(
        CommandSpec::new("value", Parameter::mutable(&slot), echo)
            .with_handler(log.clone())
            .with_description("Echo a value of the current mode"),
    )?;
    registry.register(
        CommandSpec::new(
            "setmode",
            enums.parameter::<ValueMode>(CasePolicy::LowerInsensitive),
            setmode(slot),
        )
        .with_permission("demo.setmode")
        .with_handler(log.clone())
        .with_suggestions(FirstArgument::new(StaticSuggestions::new(["int", "bool", "text"])))
        .with_description("Switch the shape accepted by `value`"),
    )?;

    Ok(registry)
}
