use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// A value produced by a parameter tree.
///
/// Leaves produce scalars or host objects; combinators nest them in
/// [`Value::Pair`] (sequence) and [`Value::List`] (repetition). An optional
/// parameter that was not supplied contributes [`Value::Omitted`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean leaf.
    Bool(bool),
    /// A whole-number leaf.
    Int(i64),
    /// A decimal leaf.
    Double(f64),
    /// A UUID leaf.
    Uuid(Uuid),
    /// Free text, rejoined with single spaces.
    Text(String),
    /// A host object: enum constants and resolver results.
    Object(Object),
    /// The two halves of a sequence.
    Pair(Box<Value>, Box<Value>),
    /// The repeated values of a repetition, in order.
    List(Vec<Value>),
    /// An optional parameter that was not supplied.
    Omitted,
}

impl Value {
    /// Build a [`Value::Pair`].
    pub fn pair(first: Value, second: Value) -> Self {
        Value::Pair(Box::new(first), Box::new(second))
    }

    /// Wrap a host object.
    pub fn object<T: Any + Send + Sync>(label: impl Into<String>, value: T) -> Self {
        Value::Object(Object::new(label, value))
    }

    /// The boolean, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The number, widening integers.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// The UUID, if this is a [`Value::Uuid`].
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// The text, if this is a [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Both halves, if this is a [`Value::Pair`].
    pub fn as_pair(&self) -> Option<(&Value, &Value)> {
        match self {
            Value::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// The elements, if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// The host object, if this is a [`Value::Object`] holding a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object(obj) => obj.downcast_ref(),
            _ => None,
        }
    }

    /// Whether this is [`Value::Omitted`].
    pub fn is_omitted(&self) -> bool {
        matches!(self, Value::Omitted)
    }

    /// Flatten nested pairs into their leaves, left to right.
    ///
    /// `Pair(a, Pair(b, c))` becomes `[a, b, c]`; lists are kept as one item.
    pub fn flatten(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(v) = stack.pop() {
            match v {
                Value::Pair(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }
                other => out.push(other),
            }
        }
        out
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n}"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Text(s) => f.write_str(s),
            Value::Object(obj) => f.write_str(obj.label()),
            Value::Pair(a, b) => write!(f, "{a} {b}"),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Omitted => f.write_str("-"),
        }
    }
}

/// A shared, type-erased host object with a display label.
///
/// Equality is identity of the shared allocation, so the same cached
/// constant compares equal across parses.
#[derive(Clone)]
pub struct Object {
    label: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wrap `value`, shown as `label`.
    pub fn new<T: Any + Send + Sync>(label: impl Into<String>, value: T) -> Self {
        Self {
            label: Arc::from(label.into()),
            value: Arc::new(value),
        }
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Borrow the object as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Object").field(&self.label).finish()
    }
}
