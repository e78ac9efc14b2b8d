#[macro_use]
mod log_macros;

pub mod cache;
pub mod engine;
pub mod error;
pub mod program;
pub mod record;
pub mod validate;


pub use cache::ProgramCache;
pub use engine::{Bound, Engine};
pub use error::{CoreError, CoreReason, CoreResult};
pub use program::{ExprHandler, FieldDescriptor, Program};
pub use record::{FieldSpec, Record, Schema};
pub use validate::{Report, Validator, Violation};

pub use tagx_config::ValidateMode;
pub use tagx_lang::{AsDatum, Datum, Value};

use orion_error::StructError;

/// Register a process-wide predicate usable as `name(...)` in annotations.
///
/// Call during start-up, before compiling any type whose annotations name
/// it; compilations already published keep the predicate they bound.
pub fn register_function<F>(name: &str, predicate: F, force: bool) -> CoreResult<()>
where
    F: for<'a> Fn(&Datum<'a>) -> bool + Send + Sync + 'static,
{
    tagx_lang::register_function(name, predicate, force)
        .map_err(|e| StructError::from(CoreReason::Registry).with_detail(e.to_string()))?;
    tx_debug!(compile, function = name, force, "function registered");
    Ok(())
}
