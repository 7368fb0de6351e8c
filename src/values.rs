//! Scalar values and per-placeholder value domains.
//!
//! A route placeholder declares a type (`string`, `int`, `float`, `path`) and
//! is fed from a [`ValueSource`] supplied at registration. The shape of a
//! source is decided once, at the API boundary:
//!
//! - [`ValueSource::Flat`] — an ordered, homogeneous list of scalars. The
//!   placeholder takes every value, independent of the other placeholders.
//! - [`ValueSource::Keyed`] — a mapping from each value the *preceding*
//!   placeholder can take to the sub-list of values this placeholder may
//!   take under it. The keyed form is the only chained representation; a
//!   positional list-of-lists cannot be expressed.
//!
//! Homogeneity is structural: [`ValueList`] wraps one `Vec` per scalar kind,
//! so a mixed-type list or a list that mixes scalars with sub-collections is
//! unrepresentable rather than checked.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use thiserror::Error;

/// Placeholder type token as written in a route string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    String,
    Int,
    Float,
    Path,
}

impl VarType {
    /// Parse a route token. Returns `None` for anything outside the four
    /// supported types.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "string" => Some(VarType::String),
            "int" => Some(VarType::Int),
            "float" => Some(VarType::Float),
            "path" => Some(VarType::Path),
            _ => None,
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            VarType::String => "string",
            VarType::Int => "int",
            VarType::Float => "float",
            VarType::Path => "path",
        };
        f.write_str(token)
    }
}

/// One concrete scalar: an element of a route variable tuple, or a key into
/// a keyed source.
///
/// `Value` is totally ordered and hashable — floats via `total_cmp` /
/// `to_bits` — so realized value sets can be compared against keyed-source
/// key sets deterministically.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Path(PathBuf),
}

impl Value {
    /// The type this scalar satisfies.
    pub fn kind(&self) -> VarType {
        match self {
            Value::Str(_) => VarType::String,
            Value::Int(_) => VarType::Int,
            Value::Float(_) => VarType::Float,
            Value::Path(_) => VarType::Path,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Str(_) => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Path(_) => 3,
        }
    }
}

/// Rendering into a route segment.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Path(p) => write!(f, "{}", p.display()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Path(a), Value::Path(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(x) => x.to_bits().hash(state),
            Value::Path(p) => p.hash(state),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// A value failed the declared-type contract of its placeholder.
#[derive(Error, Debug)]
pub enum TypeError {
    #[error("'{declared}' values required, got '{actual}' values")]
    Mismatch { declared: VarType, actual: VarType },
    #[error("path does not exist: {0}")]
    MissingPath(PathBuf),
}

/// An ordered, homogeneous collection of scalars of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueList {
    Strings(Vec<String>),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Paths(Vec<PathBuf>),
}

impl ValueList {
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ValueList::Strings(values.into_iter().map(Into::into).collect())
    }

    pub fn ints<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        ValueList::Ints(values.into_iter().collect())
    }

    pub fn floats<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        ValueList::Floats(values.into_iter().collect())
    }

    pub fn paths<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        ValueList::Paths(values.into_iter().map(Into::into).collect())
    }

    /// The scalar kind every element of this list satisfies.
    pub fn kind(&self) -> VarType {
        match self {
            ValueList::Strings(_) => VarType::String,
            ValueList::Ints(_) => VarType::Int,
            ValueList::Floats(_) => VarType::Float,
            ValueList::Paths(_) => VarType::Path,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValueList::Strings(v) => v.len(),
            ValueList::Ints(v) => v.len(),
            ValueList::Floats(v) => v.len(),
            ValueList::Paths(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate against the placeholder's declared type and return the
    /// sanitized scalars.
    ///
    /// - The list kind must equal the declared type exactly; an int list
    ///   never satisfies a `float` placeholder or vice versa.
    /// - `string` and `path` values are trimmed of surrounding whitespace.
    /// - `path` values must name an existing filesystem entry.
    pub fn check(&self, declared: VarType) -> Result<Vec<Value>, TypeError> {
        if self.kind() != declared {
            return Err(TypeError::Mismatch {
                declared,
                actual: self.kind(),
            });
        }
        let values = match self {
            ValueList::Strings(v) => v
                .iter()
                .map(|s| Value::Str(s.trim().to_string()))
                .collect(),
            ValueList::Ints(v) => v.iter().map(|n| Value::Int(*n)).collect(),
            ValueList::Floats(v) => v.iter().map(|x| Value::Float(*x)).collect(),
            ValueList::Paths(v) => {
                let mut out = Vec::with_capacity(v.len());
                for p in v {
                    let trimmed = PathBuf::from(p.to_string_lossy().trim());
                    if !trimmed.exists() {
                        return Err(TypeError::MissingPath(trimmed));
                    }
                    out.push(Value::Path(trimmed));
                }
                out
            }
        };
        Ok(values)
    }
}

/// The caller-supplied domain for one placeholder.
#[derive(Debug, Clone)]
pub enum ValueSource {
    /// Every listed value, independent of other placeholders.
    Flat(ValueList),
    /// Sub-list per concrete value of the immediately preceding placeholder.
    /// Entry order is preserved for diagnostics; lookup is by key equality.
    Keyed(Vec<(Value, ValueList)>),
}

impl ValueSource {
    pub fn flat(values: ValueList) -> Self {
        ValueSource::Flat(values)
    }

    pub fn keyed<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ValueList)>,
        K: Into<Value>,
    {
        ValueSource::Keyed(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v))
                .collect(),
        )
    }
}

impl From<ValueList> for ValueSource {
    fn from(values: ValueList) -> Self {
        ValueSource::Flat(values)
    }
}

/// The ordered `name -> ValueSource` mapping supplied at registration.
///
/// Key order is significant: it must match the left-to-right placeholder
/// order of the route string exactly.
#[derive(Debug, Clone, Default)]
pub struct ValueSources(Vec<(String, ValueSource)>);

impl ValueSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source, builder-style.
    pub fn with(mut self, name: &str, source: impl Into<ValueSource>) -> Self {
        self.0.push((name.to_string(), source.into()));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueSource)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }
}
