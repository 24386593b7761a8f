//! End-to-end dispatch tests: the check order, failure reasons, handler
//! routing, and fault propagation.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{CountingLeaf, Recorder, recording_executor, recording_handler, tokens};
use cmdtree_core::{
    BoxError, CommandHost, CommandInput, CommandSpec, DispatchError, Outcome, Parameter,
    ParseFault, Reason, ReasonMultiplexer, Registry, Sender, SenderKind, Value,
};

fn run(spec: &CommandSpec, sender: &dyn Sender, words: &[&str]) -> Outcome {
    spec.dispatch(sender, CommandInput::new(spec.label(), tokens(words)))
        .unwrap()
}

// ─── Arity boundaries ────────────────────────────────────────────────────────

#[test]
fn one_below_min_is_lacking_one_above_max_is_extra() {
    let tree = Parameter::chain([
        Parameter::integer(),
        Parameter::integer(),
        Parameter::optional(Parameter::integer()),
    ])
    .unwrap();
    assert_eq!((tree.min_usage(), tree.max_usage()), (2, 3));

    let (reasons, handler) = recording_handler();
    let (values, executor) = recording_executor();
    let spec = CommandSpec::new("sum", tree, executor).with_handler(handler);
    let sender = Recorder::console();

    assert_eq!(run(&spec, &sender, &["1"]), Outcome::Failed(Reason::LackingArguments));
    assert_eq!(
        run(&spec, &sender, &["1", "2", "3", "4"]),
        Outcome::Failed(Reason::ExtraArguments)
    );
    assert_eq!(run(&spec, &sender, &["1", "2"]), Outcome::Executed);
    assert_eq!(run(&spec, &sender, &["1", "2", "3"]), Outcome::Executed);

    assert_eq!(
        *reasons.lock().unwrap(),
        [Reason::LackingArguments, Reason::ExtraArguments]
    );
    let values = values.lock().unwrap();
    assert_eq!(
        values[0].flatten(),
        [&Value::Int(1), &Value::Int(2), &Value::Omitted]
    );
    assert_eq!(
        values[1].flatten(),
        [&Value::Int(1), &Value::Int(2), &Value::Int(3)]
    );
}

#[test]
fn malformed_token_is_insufficient() {
    let (reasons, handler) = recording_handler();
    let (values, executor) = recording_executor();
    let spec = CommandSpec::new("set", Parameter::integer(), executor).with_handler(handler);

    assert_eq!(
        run(&spec, &Recorder::console(), &["12.5"]),
        Outcome::Failed(Reason::InsufficientArguments)
    );
    assert_eq!(*reasons.lock().unwrap(), [Reason::InsufficientArguments]);
    assert!(values.lock().unwrap().is_empty());
}

#[test]
fn boolean_accepts_uppercase() {
    let (values, executor) = recording_executor();
    let spec = CommandSpec::new("toggle", Parameter::boolean(), executor);
    assert_eq!(run(&spec, &Recorder::console(), &["TRUE"]), Outcome::Executed);
    assert_eq!(*values.lock().unwrap(), [Value::Bool(true)]);
}

#[test]
fn short_sequence_is_lacking() {
    let (reasons, handler) = recording_handler();
    let (_, executor) = recording_executor();
    let tree = Parameter::sequence(Parameter::integer(), Parameter::integer()).unwrap();
    let spec = CommandSpec::new("add", tree, executor).with_handler(handler);
    assert_eq!(
        run(&spec, &Recorder::console(), &["3"]),
        Outcome::Failed(Reason::LackingArguments)
    );
    assert_eq!(*reasons.lock().unwrap(), [Reason::LackingArguments]);
}

#[test]
fn long_repetition_is_extra() {
    let (_, executor) = recording_executor();
    let tree = Parameter::repetition(Parameter::integer(), 1, 3).unwrap();
    let spec = CommandSpec::new("avg", tree, executor);
    assert_eq!(
        run(&spec, &Recorder::console(), &["1", "2", "3", "4"]),
        Outcome::Failed(Reason::ExtraArguments)
    );
}

// ─── Check order ─────────────────────────────────────────────────────────────

#[test]
fn missing_permission_stops_before_parsing() {
    let leaf = CountingLeaf::default();
    let calls = Arc::clone(&leaf.calls);
    let (reasons, handler) = recording_handler();
    let (values, executor) = recording_executor();
    let spec = CommandSpec::new("secret", Parameter::leaf(leaf), executor)
        .with_permission("cmd.secret")
        .with_handler(handler);

    assert_eq!(
        run(&spec, &Recorder::console(), &["x"]),
        Outcome::Failed(Reason::LackingPermission)
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(values.lock().unwrap().is_empty());
    assert_eq!(*reasons.lock().unwrap(), [Reason::LackingPermission]);

    let admin = Recorder::console().granted("cmd.secret");
    assert_eq!(run(&spec, &admin, &["x"]), Outcome::Executed);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn permission_is_checked_before_sender_kind() {
    let (reasons, handler) = recording_handler();
    let (_, executor) = recording_executor();
    let spec = CommandSpec::new("fly", Parameter::empty(), executor)
        .with_permission("fly")
        .with_sender_kind(SenderKind::Player)
        .with_handler(handler);

    run(&spec, &Recorder::console(), &[]);
    run(&spec, &Recorder::console().granted("fly"), &[]);
    run(&spec, &Recorder::player("alice").granted("fly"), &[]);
    assert_eq!(
        *reasons.lock().unwrap(),
        [Reason::LackingPermission, Reason::InvalidSender]
    );
}

#[test]
fn subtype_senders_are_accepted() {
    let (_, executor) = recording_executor();
    let spec = CommandSpec::new("heal", Parameter::empty(), executor)
        .with_sender_kind(SenderKind::Entity);
    assert_eq!(run(&spec, &Recorder::player("bob"), &[]), Outcome::Executed);
    assert_eq!(
        run(&spec, &Recorder::console(), &[]),
        Outcome::Failed(Reason::InvalidSender)
    );
}

#[test]
fn sender_kind_is_checked_before_arity() {
    let (reasons, handler) = recording_handler();
    let (_, executor) = recording_executor();
    let spec = CommandSpec::new("give", Parameter::integer(), executor)
        .with_sender_kind(SenderKind::Player)
        .with_handler(handler);
    run(&spec, &Recorder::console(), &[]);
    assert_eq!(*reasons.lock().unwrap(), [Reason::InvalidSender]);
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[test]
fn multiplexer_sends_each_reason_once() {
    let (arity_log, arity_handler) = recording_handler();
    let (other_log, other_handler) = recording_handler();
    let (_, executor) = recording_executor();
    let mux = ReasonMultiplexer::new(other_handler).on(Reason::LackingArguments, arity_handler);
    let tree = Parameter::chain([Parameter::integer(), Parameter::integer()]).unwrap();
    let spec = CommandSpec::new("add", tree, executor).with_handler(mux);

    let sender = Recorder::console();
    run(&spec, &sender, &[]);
    run(&spec, &sender, &["a", "b"]);
    assert_eq!(*arity_log.lock().unwrap(), [Reason::LackingArguments]);
    assert_eq!(*other_log.lock().unwrap(), [Reason::InsufficientArguments]);
}

#[test]
fn failure_diagnostic_points_at_surplus_tokens() {
    let captured = Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&captured);
    let (_, executor) = recording_executor();
    let tree = Parameter::chain([Parameter::integer(), Parameter::integer()]).unwrap();
    let spec = CommandSpec::new("add", tree, executor)
        .with_handler(move |_: &dyn Sender, failure: cmdtree_core::Failure| {
            *sink.lock().unwrap() = Some(failure.to_diagnostic());
        });
    run(&spec, &Recorder::console(), &["1", "2", "3"]);

    let diagnostic = captured.lock().unwrap().take().unwrap();
    assert_eq!(diagnostic.id, "CMD1002");
    let span = diagnostic.span.unwrap();
    assert_eq!(&"add 1 2 3"[span.start..span.end], "3");
}

// ─── Faults ──────────────────────────────────────────────────────────────────

#[test]
fn executor_errors_propagate_instead_of_reaching_the_handler() {
    let (reasons, handler) = recording_handler();
    let spec = CommandSpec::new(
        "explode",
        Parameter::empty(),
        |_: &dyn Sender, _: Value, _: &CommandInput| -> Result<(), BoxError> {
            Err("kaboom".into())
        },
    )
    .with_handler(handler);

    let err = spec
        .dispatch(&Recorder::console(), CommandInput::new("explode", tokens(&[])))
        .unwrap_err();
    match err {
        DispatchError::Execution { command, source } => {
            assert_eq!(command, "explode");
            assert_eq!(source.to_string(), "kaboom");
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert!(reasons.lock().unwrap().is_empty());
}

#[test]
fn resolver_faults_propagate_unchanged() {
    let (reasons, handler) = recording_handler();
    let (values, executor) = recording_executor();
    let lookup = Parameter::lookup(
        "player",
        1,
        |_: &dyn Sender, _: &[String]| -> Result<Option<Value>, BoxError> {
            Err("player database offline".into())
        },
    )
    .unwrap();
    let spec = CommandSpec::new("kick", lookup, executor).with_handler(handler);

    let err = spec
        .dispatch(&Recorder::console(), CommandInput::new("kick", tokens(&["bob"])))
        .unwrap_err();
    assert!(matches!(
        err,
        DispatchError::Parse {
            source: ParseFault::Resolver { .. },
            ..
        }
    ));
    assert!(reasons.lock().unwrap().is_empty());
    assert!(values.lock().unwrap().is_empty());
}

#[test]
fn resolver_absence_is_insufficient() {
    let (_, executor) = recording_executor();
    let lookup = Parameter::lookup(
        "player",
        1,
        |_: &dyn Sender, _: &[String]| -> Result<Option<Value>, BoxError> { Ok(None) },
    )
    .unwrap();
    let spec = CommandSpec::new("kick", lookup, executor);
    assert_eq!(
        run(&spec, &Recorder::console(), &["ghost"]),
        Outcome::Failed(Reason::InsufficientArguments)
    );
}

// ─── Registry ────────────────────────────────────────────────────────────────

#[test]
fn alias_equal_to_label_cannot_register() {
    let registry = Registry::new();
    let (_, executor) = recording_executor();
    let spec = CommandSpec::new("spawn", Parameter::empty(), executor).with_alias("spawn");
    assert!(matches!(
        registry.register(spec),
        Err(cmdtree_core::RegistrationError::AliasIsLabel { .. })
    ));
    assert!(registry.is_empty());
}

#[test]
fn registry_dispatches_by_alias() {
    let registry = Registry::new();
    let (values, executor) = recording_executor();
    registry
        .register(CommandSpec::new("say", Parameter::text(), executor).with_alias("echo"))
        .unwrap();
    let sender = Recorder::console();
    assert_eq!(
        registry.dispatch(&sender, "ECHO", &tokens(&["hi", "there"])).unwrap(),
        Outcome::Executed
    );
    assert_eq!(
        registry.dispatch(&sender, "nope", &tokens(&[])).unwrap(),
        Outcome::Unhandled
    );
    assert_eq!(*values.lock().unwrap(), [Value::Text("hi there".into())]);
}
