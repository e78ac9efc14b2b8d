use std::any::Any;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::rc::Rc;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Result of evaluating an expression, as handed back to consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness as applied by `&&` and `||`.
    pub fn is_truthy(&self) -> bool {
        crate::eval::truthy(&self.as_datum())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
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

// ---------------------------------------------------------------------------
// Datum
// ---------------------------------------------------------------------------

/// A dynamically-typed view of a live field value or an intermediate result.
///
/// Scalars are carried inline; collections and nested records are borrowed
/// from the instance being evaluated so subscripts and `len()` never copy.
#[derive(Clone)]
pub enum Datum<'a> {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Cow<'a, str>),
    Seq(&'a dyn Sequence),
    Map(&'a dyn Mapping),
    Record(&'a dyn Any),
}

impl<'a> Datum<'a> {
    pub fn str(s: &'a str) -> Self {
        Datum::Str(Cow::Borrowed(s))
    }

    pub fn owned_str(s: String) -> Self {
        Datum::Str(Cow::Owned(s))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Datum::Nil)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Project onto the consumer-facing [`Value`]; collections and records
    /// have no scalar form and become `Nil`.
    pub fn to_value(&self) -> Value {
        match self {
            Datum::Nil | Datum::Seq(_) | Datum::Map(_) | Datum::Record(_) => Value::Nil,
            Datum::Bool(b) => Value::Bool(*b),
            Datum::Number(n) => Value::Number(*n),
            Datum::Str(s) => Value::Str(s.to_string()),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Datum::Str(s) => Value::Str(s.into_owned()),
            other => other.to_value(),
        }
    }
}

impl fmt::Debug for Datum<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Nil => write!(f, "Nil"),
            Datum::Bool(b) => write!(f, "Bool({b})"),
            Datum::Number(n) => write!(f, "Number({n})"),
            Datum::Str(s) => write!(f, "Str({s:?})"),
            Datum::Seq(seq) => write!(f, "Seq(len={})", seq.len()),
            Datum::Map(map) => write!(f, "Map(len={})", map.len()),
            Datum::Record(_) => write!(f, "Record"),
        }
    }
}

impl PartialEq<Value> for Datum<'_> {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Datum::Nil, Value::Nil) => true,
            (Datum::Bool(a), Value::Bool(b)) => a == b,
            (Datum::Number(a), Value::Number(b)) => a == b,
            (Datum::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Collection traits
// ---------------------------------------------------------------------------

/// Indexable collection reachable through `$[n]`.
pub trait Sequence {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<Datum<'_>>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyed collection reachable through `$['key']`.
pub trait Mapping {
    fn len(&self) -> usize;

    /// Look up an entry by a subscript value; keys of the wrong type miss.
    fn get(&self, key: &Datum<'_>) -> Option<Datum<'_>>;

    /// All entries, in the map's own iteration order.
    fn entries(&self) -> Vec<(Datum<'_>, Datum<'_>)>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Conversion of a live Rust value into a [`Datum`] view.
pub trait AsDatum {
    fn as_datum(&self) -> Datum<'_>;
}

/// Map key types addressable from a subscript.
pub trait MapKey: Sized {
    fn from_datum(key: &Datum<'_>) -> Option<Self>;
}

// ---------------------------------------------------------------------------
// AsDatum for scalars
// ---------------------------------------------------------------------------

macro_rules! number_datum {
    ($($t:ty),* $(,)?) => {
        $(
            impl AsDatum for $t {
                fn as_datum(&self) -> Datum<'_> {
                    Datum::Number(*self as f64)
                }
            }
        )*
    };
}

number_datum!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl AsDatum for bool {
    fn as_datum(&self) -> Datum<'_> {
        Datum::Bool(*self)
    }
}

impl AsDatum for char {
    fn as_datum(&self) -> Datum<'_> {
        Datum::owned_str(self.to_string())
    }
}

impl AsDatum for str {
    fn as_datum(&self) -> Datum<'_> {
        Datum::str(self)
    }
}

impl AsDatum for String {
    fn as_datum(&self) -> Datum<'_> {
        Datum::str(self)
    }
}

impl AsDatum for Value {
    fn as_datum(&self) -> Datum<'_> {
        match self {
            Value::Nil => Datum::Nil,
            Value::Bool(b) => Datum::Bool(*b),
            Value::Number(n) => Datum::Number(*n),
            Value::Str(s) => Datum::str(s),
        }
    }
}

impl<T: AsDatum> AsDatum for Option<T> {
    fn as_datum(&self) -> Datum<'_> {
        match self {
            Some(v) => v.as_datum(),
            None => Datum::Nil,
        }
    }
}

impl<T: AsDatum + ?Sized> AsDatum for &T {
    fn as_datum(&self) -> Datum<'_> {
        (**self).as_datum()
    }
}

impl<T: AsDatum + ?Sized> AsDatum for Box<T> {
    fn as_datum(&self) -> Datum<'_> {
        (**self).as_datum()
    }
}

impl<T: AsDatum + ?Sized> AsDatum for Arc<T> {
    fn as_datum(&self) -> Datum<'_> {
        (**self).as_datum()
    }
}

impl<T: AsDatum + ?Sized> AsDatum for Rc<T> {
    fn as_datum(&self) -> Datum<'_> {
        (**self).as_datum()
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<T: AsDatum> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn get(&self, index: usize) -> Option<Datum<'_>> {
        self.as_slice().get(index).map(AsDatum::as_datum)
    }
}

impl<T: AsDatum, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<Datum<'_>> {
        self.as_slice().get(index).map(AsDatum::as_datum)
    }
}

impl<T: AsDatum> Sequence for VecDeque<T> {
    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn get(&self, index: usize) -> Option<Datum<'_>> {
        VecDeque::get(self, index).map(AsDatum::as_datum)
    }
}

impl<T: AsDatum> AsDatum for Vec<T> {
    fn as_datum(&self) -> Datum<'_> {
        Datum::Seq(self)
    }
}

impl<T: AsDatum, const N: usize> AsDatum for [T; N] {
    fn as_datum(&self) -> Datum<'_> {
        Datum::Seq(self)
    }
}

impl<T: AsDatum> AsDatum for VecDeque<T> {
    fn as_datum(&self) -> Datum<'_> {
        Datum::Seq(self)
    }
}

// ---------------------------------------------------------------------------
// Mappings
// ---------------------------------------------------------------------------

impl<K, V, S> Mapping for HashMap<K, V, S>
where
    K: MapKey + AsDatum + Eq + Hash,
    V: AsDatum,
    S: BuildHasher,
{
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn get(&self, key: &Datum<'_>) -> Option<Datum<'_>> {
        let key = K::from_datum(key)?;
        HashMap::get(self, &key).map(AsDatum::as_datum)
    }

    fn entries(&self) -> Vec<(Datum<'_>, Datum<'_>)> {
        self.iter().map(|(k, v)| (k.as_datum(), v.as_datum())).collect()
    }
}

impl<K, V> Mapping for BTreeMap<K, V>
where
    K: MapKey + AsDatum + Ord,
    V: AsDatum,
{
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &Datum<'_>) -> Option<Datum<'_>> {
        let key = K::from_datum(key)?;
        BTreeMap::get(self, &key).map(AsDatum::as_datum)
    }

    fn entries(&self) -> Vec<(Datum<'_>, Datum<'_>)> {
        self.iter().map(|(k, v)| (k.as_datum(), v.as_datum())).collect()
    }
}

impl<K, V, S> AsDatum for HashMap<K, V, S>
where
    K: MapKey + AsDatum + Eq + Hash,
    V: AsDatum,
    S: BuildHasher,
{
    fn as_datum(&self) -> Datum<'_> {
        Datum::Map(self)
    }
}

impl<K, V> AsDatum for BTreeMap<K, V>
where
    K: MapKey + AsDatum + Ord,
    V: AsDatum,
{
    fn as_datum(&self) -> Datum<'_> {
        Datum::Map(self)
    }
}

// ---------------------------------------------------------------------------
// MapKey
// ---------------------------------------------------------------------------

impl MapKey for String {
    fn from_datum(key: &Datum<'_>) -> Option<Self> {
        key.as_str().map(str::to_string)
    }
}

impl MapKey for char {
    fn from_datum(key: &Datum<'_>) -> Option<Self> {
        let mut chars = key.as_str()?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl MapKey for bool {
    fn from_datum(key: &Datum<'_>) -> Option<Self> {
        key.as_bool()
    }
}

macro_rules! integer_key {
    ($($t:ty),* $(,)?) => {
        $(
            impl MapKey for $t {
                fn from_datum(key: &Datum<'_>) -> Option<Self> {
                    let n = key.as_number()?;
                    if n.fract() != 0.0 || !n.is_finite() {
                        return None;
                    }
                    <$t>::try_from(n as i128).ok()
                }
            }
        )*
    };
}

integer_key!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

// ---------------------------------------------------------------------------
// JSON documents
// ---------------------------------------------------------------------------

#[cfg(feature = "json")]
mod json {
    use super::{AsDatum, Datum, Mapping};

    impl AsDatum for serde_json::Value {
        fn as_datum(&self) -> Datum<'_> {
            match self {
                serde_json::Value::Null => Datum::Nil,
                serde_json::Value::Bool(b) => Datum::Bool(*b),
                serde_json::Value::Number(n) => n.as_f64().map_or(Datum::Nil, Datum::Number),
                serde_json::Value::String(s) => Datum::str(s),
                serde_json::Value::Array(items) => Datum::Seq(items),
                serde_json::Value::Object(map) => Datum::Map(map),
            }
        }
    }

    impl Mapping for serde_json::Map<String, serde_json::Value> {
        fn len(&self) -> usize {
            serde_json::Map::len(self)
        }

        fn get(&self, key: &Datum<'_>) -> Option<Datum<'_>> {
            serde_json::Map::get(self, key.as_str()?).map(AsDatum::as_datum)
        }

        fn entries(&self) -> Vec<(Datum<'_>, Datum<'_>)> {
            self.iter().map(|(k, v)| (Datum::str(k), v.as_datum())).collect()
        }
    }
}
