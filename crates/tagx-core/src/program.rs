//! Field Registry: the compiled, immutable expression table of one record
//! type.

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};

use orion_error::StructError;
use tagx_lang::parse_utils::is_word;
use tagx_lang::{DEFAULT_NAME, Datum, Expression, Scope, Value, parse_annotation};

use crate::error::{CoreReason, CoreResult};
use crate::record::{FieldSpec, Getter, Record, RecordGetter, Schema, compose, compose_record};

// ---------------------------------------------------------------------------
// Compiled pieces
// ---------------------------------------------------------------------------

/// One addressable field of a record type, nested fields included.
pub struct FieldDescriptor {
    path: String,
    getter: Getter,
    exprs: Vec<CompiledExpr>,
}

impl FieldDescriptor {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn has_exprs(&self) -> bool {
        !self.exprs.is_empty()
    }

    pub fn expr_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.exprs
            .iter()
            .map(|e| e.name.as_deref().unwrap_or(DEFAULT_NAME))
    }
}

struct CompiledExpr {
    name: Option<String>,
    selector: String,
    expr: Expression,
    /// Field index per selector slot, fixed at compile time.
    refs: Vec<usize>,
}

/// Scope of one expression evaluated against one instance.
struct FieldScope<'p> {
    program: &'p Program,
    field: usize,
    compiled: &'p CompiledExpr,
    instance: &'p dyn Any,
}

impl FieldScope<'_> {
    fn get(&self, index: Option<usize>) -> Datum<'_> {
        match index {
            Some(idx) => (self.program.fields[idx].getter)(self.instance),
            None => Datum::Nil,
        }
    }
}

impl Scope for FieldScope<'_> {
    fn field(&self, path: Option<&str>) -> Datum<'_> {
        let index = match path {
            None => Some(self.field),
            Some(path) => self
                .compiled
                .expr
                .field_paths()
                .iter()
                .position(|p| *p == path)
                .and_then(|slot| self.compiled.refs.get(slot).copied()),
        };
        self.get(index)
    }

    fn field_at(&self, slot: usize, _path: &str) -> Datum<'_> {
        self.get(self.compiled.refs.get(slot).copied())
    }
}

// ---------------------------------------------------------------------------
// Program
// ---------------------------------------------------------------------------

/// Compiled expressions of one record type. Immutable once built.
pub struct Program {
    type_id: TypeId,
    type_name: &'static str,
    fields: Vec<FieldDescriptor>,
    by_path: HashMap<String, usize>,
    by_selector: HashMap<String, (usize, usize)>,
    /// `(field, expr)` pairs in declaration order.
    order: Vec<(usize, usize)>,
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.len())
            .field("exprs", &self.order.len())
            .finish()
    }
}

impl Program {
    /// Walk `T`'s schema and compile every annotation stored under `tag`.
    ///
    /// Needs type metadata only, never an instance.
    pub fn compile<T: Record>(tag: &str) -> CoreResult<Program> {
        let type_name = type_name::<T>();
        let mut walker = Flattener {
            tag,
            root: type_name,
            stack: vec![TypeId::of::<T>()],
            out: Vec::new(),
        };
        walker.walk(Schema::<T>::collect(), "", None)?;
        let flat = walker.out;

        let by_path: HashMap<String, usize> = flat
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.path.clone(), idx))
            .collect();

        let mut fields = Vec::with_capacity(flat.len());
        let mut by_selector = HashMap::new();
        let mut order = Vec::new();
        for (field_idx, flat_field) in flat.into_iter().enumerate() {
            let exprs = match &flat_field.annotation {
                Some(src) => compile_field(type_name, &flat_field, src, &by_path)?,
                None => Vec::new(),
            };
            for (expr_idx, expr) in exprs.iter().enumerate() {
                by_selector.insert(expr.selector.clone(), (field_idx, expr_idx));
                order.push((field_idx, expr_idx));
            }
            fields.push(FieldDescriptor {
                path: flat_field.path,
                getter: flat_field.getter,
                exprs,
            });
        }

        tx_debug!(
            compile,
            ty = type_name,
            fields = fields.len(),
            exprs = order.len(),
            "program compiled"
        );
        Ok(Program {
            type_id: TypeId::of::<T>(),
            type_name,
            fields,
            by_path,
            by_selector,
            order,
        })
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Number of compiled expressions.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selectors of every compiled expression, in declaration order.
    pub fn selectors(&self) -> impl Iterator<Item = &str> + '_ {
        self.order
            .iter()
            .map(|&(f, e)| self.fields[f].exprs[e].selector.as_str())
    }

    /// Evaluate the expression addressed by `selector` (`path`, `path@` or
    /// `path@name`). Unknown selectors and instances of another type yield
    /// `Nil`.
    pub fn eval<T: Any>(&self, instance: &T, selector: &str) -> Value {
        self.eval_dyn(instance, selector)
    }

    pub(crate) fn eval_dyn(&self, instance: &dyn Any, selector: &str) -> Value {
        match self.lookup(selector) {
            Some((field, expr)) => self.eval_at(instance, field, expr),
            None => {
                tx_trace!(eval, ty = self.type_name, selector, "no compiled expression");
                Value::Nil
            }
        }
    }

    /// Visit every compiled expression in declaration order until `visitor`
    /// returns `false`.
    pub fn range<'p, T, F>(&'p self, instance: &'p T, visitor: F)
    where
        T: Any,
        F: FnMut(&ExprHandler<'p>) -> bool,
    {
        self.range_dyn(instance, visitor)
    }

    pub(crate) fn range_dyn<'p, F>(&'p self, instance: &'p dyn Any, mut visitor: F)
    where
        F: FnMut(&ExprHandler<'p>) -> bool,
    {
        for &(field, expr) in &self.order {
            let handler = ExprHandler {
                program: self,
                instance,
                field,
                expr,
            };
            if !visitor(&handler) {
                break;
            }
        }
    }

    /// Live value of the field at `path`, `None` when no such field exists.
    pub fn field<'i>(&self, instance: &'i dyn Any, path: &str) -> Option<Datum<'i>> {
        let idx = *self.by_path.get(path)?;
        Some((self.fields[idx].getter)(instance))
    }

    fn lookup(&self, selector: &str) -> Option<(usize, usize)> {
        let key = selector.strip_suffix('@').unwrap_or(selector);
        self.by_selector.get(key).copied()
    }

    fn eval_at(&self, instance: &dyn Any, field: usize, expr: usize) -> Value {
        if instance.type_id() != self.type_id {
            return Value::Nil;
        }
        let compiled = &self.fields[field].exprs[expr];
        let scope = FieldScope {
            program: self,
            field,
            compiled,
            instance,
        };
        compiled.expr.eval_value(&scope)
    }
}

// ---------------------------------------------------------------------------
// ExprHandler
// ---------------------------------------------------------------------------

/// One compiled expression during [`Program::range`]; evaluation is lazy.
pub struct ExprHandler<'p> {
    program: &'p Program,
    instance: &'p dyn Any,
    field: usize,
    expr: usize,
}

impl<'p> ExprHandler<'p> {
    pub fn selector(&self) -> &'p str {
        &self.program.fields[self.field].exprs[self.expr].selector
    }

    pub fn field_path(&self) -> &'p str {
        &self.program.fields[self.field].path
    }

    /// Expression name; `None` for the default expression.
    pub fn name(&self) -> Option<&'p str> {
        self.program.fields[self.field].exprs[self.expr].name.as_deref()
    }

    pub fn source(&self) -> &'p str {
        self.program.fields[self.field].exprs[self.expr].expr.source()
    }

    pub fn eval(&self) -> Value {
        self.program.eval_at(self.instance, self.field, self.expr)
    }

    /// Evaluate a sibling expression on the same field.
    pub fn eval_named(&self, name: &str) -> Value {
        let selector = format!("{}@{name}", self.field_path());
        self.program.eval_dyn(self.instance, &selector)
    }
}

// ---------------------------------------------------------------------------
// Compilation helpers
// ---------------------------------------------------------------------------

struct FlatField {
    path: String,
    /// Path of the record declaring the field; empty for the root.
    owner: String,
    getter: Getter,
    annotation: Option<String>,
}

/// Depth-first walk of a record type and its nested records.
struct Flattener<'t> {
    tag: &'t str,
    root: &'static str,
    /// Record types on the current path; a nested record whose type is
    /// already here is kept as a field but not expanded again.
    stack: Vec<TypeId>,
    out: Vec<FlatField>,
}

impl Flattener<'_> {
    fn walk(
        &mut self,
        specs: Vec<FieldSpec>,
        prefix: &str,
        via: Option<&RecordGetter>,
    ) -> CoreResult<()> {
        let mut seen = HashSet::new();
        for spec in specs {
            if !is_word(&spec.name) {
                return Err(StructError::from(CoreReason::Schema)
                    .with_detail(format!("{}: invalid field name {:?}", self.root, spec.name)));
            }
            if !seen.insert(spec.name.clone()) {
                return Err(StructError::from(CoreReason::Schema).with_detail(format!(
                    "{}: duplicate field {:?} in {}",
                    self.root,
                    spec.name,
                    if prefix.is_empty() { "<root>" } else { prefix }
                )));
            }
            let path = join(prefix, &spec.name);
            let getter = match via {
                Some(outer) => compose(outer, &spec.getter),
                None => spec.getter.clone(),
            };
            self.out.push(FlatField {
                path: path.clone(),
                owner: prefix.to_string(),
                getter,
                annotation: spec.annotation(self.tag).map(str::to_string),
            });

            let Some(nested) = &spec.nested else {
                continue;
            };
            if self.stack.contains(&nested.type_id) {
                tx_trace!(compile, ty = nested.type_name, path = %path, "recursive record not expanded");
                continue;
            }
            let reach = match via {
                Some(outer) => compose_record(outer, &nested.get),
                None => nested.get.clone(),
            };
            self.stack.push(nested.type_id);
            let result = self.walk((nested.expand)(), &path, Some(&reach));
            self.stack.pop();
            result?;
        }
        Ok(())
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

/// Parse one field's annotation and resolve every `(path)$` it names.
fn compile_field(
    root: &'static str,
    field: &FlatField,
    src: &str,
    by_path: &HashMap<String, usize>,
) -> CoreResult<Vec<CompiledExpr>> {
    let compile_err = |detail: String| {
        tx_warn!(compile, ty = root, field = %field.path, error = %detail, "annotation rejected");
        StructError::from(CoreReason::Compile).with_detail(format!("{root}.{}: {detail}", field.path))
    };

    let named = parse_annotation(src).map_err(|e| compile_err(e.to_string()))?;
    let mut exprs = Vec::with_capacity(named.len());
    for n in named {
        let mut refs = Vec::new();
        for path in n.expr.field_paths() {
            let idx = resolve(&field.owner, path, by_path)
                .ok_or_else(|| compile_err(format!("unknown field {path:?}")))?;
            refs.push(idx);
        }
        let selector = match &n.name {
            Some(name) => format!("{}@{name}", field.path),
            None => field.path.clone(),
        };
        exprs.push(CompiledExpr {
            name: n.name,
            selector,
            expr: n.expr,
            refs,
        });
    }
    Ok(exprs)
}

/// Sibling paths first, then absolute paths from the root record.
fn resolve(owner: &str, path: &str, by_path: &HashMap<String, usize>) -> Option<usize> {
    if !owner.is_empty()
        && let Some(idx) = by_path.get(&join(owner, path))
    {
        return Some(*idx);
    }
    by_path.get(path).copied()
}
