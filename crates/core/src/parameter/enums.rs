use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::{Arity, Leaf, Parameter, ParseFault, Parsed};
use crate::input::CommandInput;
use crate::sender::Sender;
use crate::suggest::{Suggestion, filter_prefix};
use crate::value::{Object, Value};

/// A fieldless enum whose constants can be looked up by name.
///
/// ```
/// use cmdtree_core::NamedConstant;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum GameMode { Survival, Creative }
///
/// impl NamedConstant for GameMode {
///     fn constants() -> &'static [Self] {
///         &[GameMode::Survival, GameMode::Creative]
///     }
///     fn name(self) -> &'static str {
///         match self {
///             GameMode::Survival => "SURVIVAL",
///             GameMode::Creative => "CREATIVE",
///         }
///     }
/// }
/// ```
pub trait NamedConstant: Copy + Send + Sync + 'static {
    /// Every constant, in declaration order.
    fn constants() -> &'static [Self];

    /// The constant's declared name.
    fn name(self) -> &'static str;

    /// Name used in usage strings; defaults to the last path segment of the
    /// Rust type name, lowercased.
    fn type_label() -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_ascii_lowercase()
    }
}

/// How a token is matched against declared constant names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CasePolicy {
    /// The token must match a name exactly.
    #[default]
    Sensitive,
    /// The token is uppercased, then matched exactly.
    UpperInsensitive,
    /// The token is lowercased, then matched exactly.
    LowerInsensitive,
}

impl CasePolicy {
    fn normalize<'a>(self, token: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            CasePolicy::Sensitive => token.into(),
            CasePolicy::UpperInsensitive => token.to_uppercase().into(),
            CasePolicy::LowerInsensitive => token.to_lowercase().into(),
        }
    }
}

/// Name → constant table for one enum type, built once.
struct EnumTable {
    type_label: String,
    names: Vec<&'static str>,
    values: Vec<Value>,
    by_name: HashMap<&'static str, usize>,
}

impl EnumTable {
    fn build<E: NamedConstant>() -> Self {
        let constants = E::constants();
        let mut by_name = HashMap::with_capacity(constants.len());
        let mut names = Vec::with_capacity(constants.len());
        let mut values = Vec::with_capacity(constants.len());
        for (i, constant) in constants.iter().enumerate() {
            let name = constant.name();
            // First declaration wins on duplicate names.
            by_name.entry(name).or_insert(i);
            names.push(name);
            values.push(Value::Object(Object::new(name, *constant)));
        }
        tracing::debug!(
            type_label = %E::type_label(),
            constants = names.len(),
            "built enum name table"
        );
        Self {
            type_label: E::type_label(),
            names,
            values,
            by_name,
        }
    }
}

type TableCell = Arc<OnceLock<Arc<EnumTable>>>;

/// Cache of per-type enum name tables.
///
/// Owned by whoever builds parameter trees (typically next to the
/// [`crate::Registry`]) rather than living in a global. Each type's table is
/// built at most once even when several threads ask for it at the same time;
/// the map lock is held only long enough to fetch the type's cell, and the
/// table itself is read lock-free by the leaves that hold it.
#[derive(Default)]
pub struct EnumRepository {
    tables: Mutex<HashMap<TypeId, TableCell>>,
}

impl EnumRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn table<E: NamedConstant>(&self) -> Arc<EnumTable> {
        let cell = {
            let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(tables.entry(TypeId::of::<E>()).or_default())
        };
        Arc::clone(cell.get_or_init(|| Arc::new(EnumTable::build::<E>())))
    }

    /// A one-token parameter resolving constants of `E` by name.
    pub fn parameter<E: NamedConstant>(&self, policy: CasePolicy) -> Parameter {
        Parameter::leaf(EnumLeaf {
            table: self.table::<E>(),
            policy,
        })
    }

    /// Number of enum types with a built table.
    pub fn cached_types(&self) -> usize {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        tables.values().filter(|cell| cell.get().is_some()).count()
    }
}

/// Leaf matching one token against an enum's constant names.
///
/// Values are [`Value::Object`]s holding the constant; recover it with
/// [`Value::downcast_ref`].
struct EnumLeaf {
    table: Arc<EnumTable>,
    policy: CasePolicy,
}

impl Leaf for EnumLeaf {
    fn name(&self) -> &str {
        &self.table.type_label
    }

    fn arity(&self) -> Arity {
        Arity::fixed(1)
    }

    fn parse(&self, _sender: &dyn Sender, input: &CommandInput) -> Result<Parsed, ParseFault> {
        let token = input.argument(0)?;
        let key = self.policy.normalize(token);
        Ok(self
            .table
            .by_name
            .get(key.as_ref())
            .map(|&i| self.table.values[i].clone())
            .into())
    }

    fn suggest(&self, _sender: &dyn Sender, input: &CommandInput) -> Vec<Suggestion> {
        filter_prefix(
            self.table.names.iter().map(|name| Suggestion::new(*name)),
            input.last_argument(),
        )
    }
}
