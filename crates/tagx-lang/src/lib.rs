pub mod ast;
mod error;
pub mod eval;
mod functions;
pub mod parse_utils;
pub mod parser;
pub mod scan;
mod value;

pub use ast::{BinOp, Expression, Func, Node, Selector, SelectorKind};
pub use error::CompileError;
pub use eval::{CurrentScope, Scope, truthy};
pub use functions::{Predicate, RegisterError, is_registered, register_function};
pub use parser::{DEFAULT_NAME, NamedExpr, parse_annotation, parse_expression};
pub use value::{AsDatum, Datum, MapKey, Mapping, Sequence, Value};
