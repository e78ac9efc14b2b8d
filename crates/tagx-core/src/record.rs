//! Record types describe their fields once; the description replaces runtime
//! reflection.
//!
//! ```ignore
//! struct Login { user: String, tries: u32 }
//!
//! impl Record for Login {
//!     fn describe(s: &mut Schema<Self>) {
//!         s.field("user", |l| l.user.as_datum()).tag("vd", "len($)>0");
//!         s.field("tries", |l| l.tries.as_datum()).tag("vd", "{@:$<5}{msg:'locked'}");
//!     }
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

use tagx_lang::Datum;

/// A record type whose fields can carry annotations.
pub trait Record: Any + Sized {
    fn describe(schema: &mut Schema<Self>);
}

/// Type-erased field accessor.
pub(crate) type Getter = Arc<dyn for<'a> Fn(&'a dyn Any) -> Datum<'a> + Send + Sync>;

/// Type-erased accessor of a nested record.
pub(crate) type RecordGetter =
    Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;

/// Pins a closure to the higher-ranked signature of [`Getter`].
fn erase<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Datum<'a>,
{
    f
}

fn erase_record<F>(f: F) -> F
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any>,
{
    f
}

/// Nested record reached through a field.
pub(crate) struct Nested {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub get: RecordGetter,
    pub expand: fn() -> Vec<FieldSpec>,
}

/// One declared field: name, accessor, annotations by tag key.
pub struct FieldSpec {
    pub(crate) name: String,
    pub(crate) getter: Getter,
    pub(crate) nested: Option<Nested>,
    pub(crate) tags: Vec<(String, String)>,
}

impl FieldSpec {
    /// Attach `annotation` under `key`, replacing an earlier one for the
    /// same key.
    pub fn tag(&mut self, key: &str, annotation: &str) -> &mut Self {
        match self.tags.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = annotation.to_string(),
            None => self.tags.push((key.to_string(), annotation.to_string())),
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn annotation(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Field list of one record type, filled by [`Record::describe`].
pub struct Schema<T> {
    fields: Vec<FieldSpec>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Record> Schema<T> {
    pub(crate) fn collect() -> Vec<FieldSpec> {
        let mut schema = Schema {
            fields: Vec::new(),
            _record: PhantomData,
        };
        T::describe(&mut schema);
        schema.fields
    }

    /// Declare a leaf field read through `get`.
    pub fn field<F>(&mut self, name: &str, get: F) -> &mut FieldSpec
    where
        F: for<'a> Fn(&'a T) -> Datum<'a> + Send + Sync + 'static,
    {
        let getter = erase(move |any: &dyn Any| match any.downcast_ref::<T>() {
            Some(record) => get(record),
            None => Datum::Nil,
        });
        self.push(FieldSpec {
            name: name.to_string(),
            getter: Arc::new(getter),
            nested: None,
            tags: Vec::new(),
        })
    }

    /// Declare a nested record; its fields become addressable as `name.field`.
    /// `get` returns `None` when the nested record is absent.
    pub fn record<U, F>(&mut self, name: &str, get: F) -> &mut FieldSpec
    where
        U: Record,
        F: for<'a> Fn(&'a T) -> Option<&'a U> + Send + Sync + 'static,
    {
        let get = erase_record(move |any: &dyn Any| {
            any.downcast_ref::<T>()
                .and_then(|record| get(record))
                .map(|nested| nested as &dyn Any)
        });
        let get: RecordGetter = Arc::new(get);
        let inner = Arc::clone(&get);
        let getter = erase(move |any: &dyn Any| match inner(any) {
            Some(nested) => Datum::Record(nested),
            None => Datum::Nil,
        });
        self.push(FieldSpec {
            name: name.to_string(),
            getter: Arc::new(getter),
            nested: Some(Nested {
                type_id: TypeId::of::<U>(),
                type_name: type_name::<U>(),
                get,
                expand: Schema::<U>::collect,
            }),
            tags: Vec::new(),
        })
    }

    fn push(&mut self, spec: FieldSpec) -> &mut FieldSpec {
        self.fields.push(spec);
        let last = self.fields.len() - 1;
        &mut self.fields[last]
    }
}

/// Compose a nested record's field accessor with the accessor of the record
/// itself.
pub(crate) fn compose(outer: &RecordGetter, inner: &Getter) -> Getter {
    let outer = Arc::clone(outer);
    let inner = Arc::clone(inner);
    Arc::new(erase(move |any: &dyn Any| match outer(any) {
        Some(nested) => inner(nested),
        None => Datum::Nil,
    }))
}

/// Same as [`compose`] for a nested record's own nested records.
pub(crate) fn compose_record(outer: &RecordGetter, inner: &RecordGetter) -> RecordGetter {
    let outer = Arc::clone(outer);
    let inner = Arc::clone(inner);
    Arc::new(erase_record(move |any: &dyn Any| outer(any).and_then(|n| inner(n))))
}
