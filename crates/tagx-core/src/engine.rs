use std::any::{Any, TypeId};
use std::sync::Arc;

use tagx_config::EngineConfig;
use tagx_config::engine::DEFAULT_TAG;
use tagx_lang::{Datum, Value};

use crate::cache::ProgramCache;
use crate::error::CoreResult;
use crate::program::{ExprHandler, Program};
use crate::record::Record;

/// Compiles record annotations under one tag key and caches the programs.
///
/// Shareable across threads; every method takes `&self`.
pub struct Engine {
    tag: String,
    cache: ProgramCache,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_TAG)
    }
}

impl Engine {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            cache: ProgramCache::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.tag.clone())
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn cache(&self) -> &ProgramCache {
        &self.cache
    }

    /// Compiled program for `T`, compiled on first use.
    pub fn compile<T: Record>(&self) -> CoreResult<Arc<Program>> {
        self.cache
            .get_or_compile(TypeId::of::<T>(), || Program::compile::<T>(&self.tag))
    }

    /// Pair `instance` with its type's program.
    pub fn bind<'i, T: Record>(&self, instance: &'i T) -> CoreResult<Bound<'i>> {
        Ok(Bound {
            program: self.compile::<T>()?,
            instance,
        })
    }
}

/// An instance bound to its compiled program.
pub struct Bound<'i> {
    program: Arc<Program>,
    instance: &'i dyn Any,
}

impl<'i> Bound<'i> {
    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    /// Evaluate the expression at `selector`; `Nil` when none is compiled.
    pub fn eval(&self, selector: &str) -> Value {
        self.program.eval_dyn(self.instance, selector)
    }

    /// Visit compiled expressions in declaration order until `visitor`
    /// returns `false`.
    pub fn range<F>(&self, visitor: F)
    where
        F: FnMut(&ExprHandler<'_>) -> bool,
    {
        self.program.range_dyn(self.instance, visitor)
    }

    /// Live value of the field at `path`.
    pub fn field(&self, path: &str) -> Option<Datum<'i>> {
        self.program.field(self.instance, path)
    }

    /// Every compiled expression's selector with its value.
    pub fn eval_all(&self) -> Vec<(String, Value)> {
        let mut out = Vec::with_capacity(self.program.len());
        self.range(|handler| {
            out.push((handler.selector().to_string(), handler.eval()));
            true
        });
        out
    }
}
