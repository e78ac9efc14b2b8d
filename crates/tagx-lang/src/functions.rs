//! Process-wide registry of named single-argument predicates.
//!
//! Names are bound when an expression is parsed, so every registration must
//! happen before the first compilation that mentions the name. Register at
//! start-up; registering while other threads compile is not guaranteed to be
//! observed by those compilations.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, RwLock};

use thiserror::Error;

use crate::parse_utils::is_word;
use crate::value::Datum;

/// Names handled by the parser itself; they cannot be registered.
pub(crate) const BUILTINS: &[&str] = &["len", "regexp", "sprintf", "in", "range"];

type PredicateFn = dyn for<'a> Fn(&Datum<'a>) -> bool + Send + Sync;

/// A registered predicate, shared by every expression that names it.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> Fn(&Datum<'a>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, arg: &Datum<'_>) -> bool {
        (self.0)(arg)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("function {name:?} is already registered")]
    AlreadyRegistered { name: String },
    #[error("function name {name:?} is reserved for a built-in")]
    Reserved { name: String },
    #[error("invalid function name {name:?}")]
    InvalidName { name: String },
}

static REGISTRY: LazyLock<RwLock<HashMap<String, Predicate>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register `predicate` under `name`.
///
/// Fails with [`RegisterError::AlreadyRegistered`] when the name is taken,
/// unless `force` is set, in which case the previous predicate is replaced
/// for compilations that happen afterwards.
pub fn register_function<F>(name: &str, predicate: F, force: bool) -> Result<(), RegisterError>
where
    F: for<'a> Fn(&Datum<'a>) -> bool + Send + Sync + 'static,
{
    if !is_word(name) || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(RegisterError::InvalidName {
            name: name.to_string(),
        });
    }
    if BUILTINS.contains(&name) || matches!(name, "true" | "false" | "nil") {
        return Err(RegisterError::Reserved {
            name: name.to_string(),
        });
    }
    let mut registry = REGISTRY.write().expect("function registry lock poisoned");
    if !force && registry.contains_key(name) {
        return Err(RegisterError::AlreadyRegistered {
            name: name.to_string(),
        });
    }
    registry.insert(name.to_string(), Predicate::new(predicate));
    Ok(())
}

pub fn is_registered(name: &str) -> bool {
    REGISTRY
        .read()
        .expect("function registry lock poisoned")
        .contains_key(name)
}

pub(crate) fn lookup(name: &str) -> Option<Predicate> {
    REGISTRY
        .read()
        .expect("function registry lock poisoned")
        .get(name)
        .cloned()
}
