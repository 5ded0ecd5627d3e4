//! Declarative shape descriptions.
//!
//! A shape lists its fields by name together with typed accessor and mutator
//! closures. The table built from that list stands in for runtime
//! reflection: it is built once per type, cached process-wide, and read
//! through the object-safe [`Record`] trait.
//!
//! # Field categories
//!
//! | Builder method       | Field type         | Copy behaviour                  |
//! |----------------------|--------------------|---------------------------------|
//! | `value`              | `V`                | clone                           |
//! | `nullable`           | `Option<V>`        | clone, `None` is absent         |
//! | `sequence`           | `C: Sequence`      | rebuild, elements cloned        |
//! | `optional_sequence`  | `Option<C>`        | rebuild, `None` is absent       |
//! | `record`             | `R: Shape`         | recurse                         |
//! | `optional_record`    | `Option<R>`        | recurse, default-created        |
//! | `boxed_record`       | `Option<Box<R>>`   | recurse, default-created        |
//! | `computed`           | any `V`            | read-only, never written        |

use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Serialize, Serializer};

use crate::error::AssignError;
use crate::value::{FieldValue, ValueRef};

/// A type the mapper can read from and write into.
///
/// Implementors declare their fields once; the declaration order is the
/// order in which the copier visits them.
pub trait Shape: Default + 'static {
    fn describe(shape: &mut ShapeBuilder<Self>);
}

/// Runtime identity of a Rust type, with its name for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for TypeInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}

/// How the copier treats a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// String-like, primitive or other value copied by clone.
    Value,
    /// Ordered collection rebuilt from the source elements.
    Sequence,
    /// Nested shape copied recursively.
    Record,
}

/// Name, category and access flags of one declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Value type for values, element type for sequences, shape for records.
    pub value_type: TypeInfo,
    /// The field can hold no value (`Option`).
    pub nullable: bool,
    pub readable: bool,
    pub writable: bool,
}

impl FieldDescriptor {
    fn new<V: ?Sized + 'static>(name: &'static str, kind: FieldKind, nullable: bool) -> Self {
        Self {
            name,
            kind,
            value_type: TypeInfo::of::<V>(),
            nullable,
            readable: true,
            writable: true,
        }
    }
}

/// The field table of one shape.
#[derive(Debug)]
pub struct Layout {
    shape: TypeInfo,
    fields: Vec<FieldDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl Layout {
    pub fn shape(&self) -> TypeInfo {
        self.shape
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Index of the field called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.position(name).map(|index| &self.fields[index])
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Object-safe view over any [`Shape`].
///
/// Field indices refer to [`Layout::fields`].
pub trait Record: Any {
    fn layout(&self) -> Arc<Layout>;

    fn read_field(&self, index: usize) -> Option<FieldValue<'_>>;

    fn write_field(&mut self, index: usize, value: FieldValue<'_>) -> Result<(), AssignError>;

    /// Mutable access to a nested record field.
    ///
    /// An optional record that holds nothing is first filled with a default
    /// instance. Returns `None` when the field is not a record.
    fn record_field_mut(&mut self, index: usize) -> Option<&mut dyn Record>;
}

impl<T: Shape> Record for T {
    fn layout(&self) -> Arc<Layout> {
        Arc::clone(&table::<T>().layout)
    }

    fn read_field(&self, index: usize) -> Option<FieldValue<'_>> {
        let table = table::<T>();
        table.access.get(index).map(|access| access.read(self))
    }

    fn write_field(&mut self, index: usize, value: FieldValue<'_>) -> Result<(), AssignError> {
        let table = table::<T>();
        match table.access.get(index) {
            Some(access) => access.write(self, value),
            None => Err(AssignError::UnknownField(index)),
        }
    }

    fn record_field_mut(&mut self, index: usize) -> Option<&mut dyn Record> {
        let table = table::<T>();
        table.access.get(index)?.record_mut(self)
    }
}

/// Ordered collection usable as a sequence field.
pub trait Sequence: Default + 'static {
    type Element: Clone + 'static;

    fn elements(&self) -> impl Iterator<Item = &Self::Element>;

    fn from_elements(elements: Vec<Self::Element>) -> Self;
}

impl<E: Clone + 'static> Sequence for Vec<E> {
    type Element = E;

    fn elements(&self) -> impl Iterator<Item = &E> {
        self.iter()
    }

    fn from_elements(elements: Vec<E>) -> Self {
        elements
    }
}

impl<E: Clone + 'static> Sequence for VecDeque<E> {
    type Element = E;

    fn elements(&self) -> impl Iterator<Item = &E> {
        self.iter()
    }

    fn from_elements(elements: Vec<E>) -> Self {
        elements.into()
    }
}

/// Collects the field declarations of a shape.
pub struct ShapeBuilder<T> {
    fields: Vec<FieldDescriptor>,
    access: Vec<Box<dyn FieldAccess<T>>>,
}

impl<T: Shape> ShapeBuilder<T> {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            access: Vec::new(),
        }
    }

    /// Declares a string-like or primitive field.
    pub fn value<V, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        V: Clone + Default + 'static,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<V>(name, FieldKind::Value, false),
            ValueField::<G, M, V> {
                get,
                get_mut,
                _value: PhantomData,
            },
        )
    }

    /// Declares an `Option` field; `None` reads as absent.
    pub fn nullable<V, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        V: Clone + 'static,
        G: Fn(&T) -> &Option<V> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<V> + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<V>(name, FieldKind::Value, true),
            NullableField::<G, M, V> {
                get,
                get_mut,
                _value: PhantomData,
            },
        )
    }

    /// Declares an ordered collection field.
    pub fn sequence<C, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        C: Sequence,
        G: Fn(&T) -> &C + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<C::Element>(name, FieldKind::Sequence, false),
            SequenceField::<G, M, C> {
                get,
                get_mut,
                _sequence: PhantomData,
            },
        )
    }

    /// Declares an optional ordered collection field.
    pub fn optional_sequence<C, G, M>(
        &mut self,
        name: &'static str,
        get: G,
        get_mut: M,
    ) -> &mut Self
    where
        C: Sequence,
        G: Fn(&T) -> &Option<C> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<C> + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<C::Element>(name, FieldKind::Sequence, true),
            OptionalSequenceField::<G, M, C> {
                get,
                get_mut,
                _sequence: PhantomData,
            },
        )
    }

    /// Declares a nested shape field.
    pub fn record<R, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        R: Shape,
        G: Fn(&T) -> &R + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut R + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<R>(name, FieldKind::Record, false),
            RecordField::<G, M, R> {
                get,
                get_mut,
                _record: PhantomData,
            },
        )
    }

    /// Declares an optional nested shape field.
    pub fn optional_record<R, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        R: Shape,
        G: Fn(&T) -> &Option<R> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<R> + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<R>(name, FieldKind::Record, true),
            OptionalRecordField::<G, M, R> {
                get,
                get_mut,
                _record: PhantomData,
            },
        )
    }

    /// Declares an optional boxed shape field, for self-referential shapes.
    pub fn boxed_record<R, G, M>(&mut self, name: &'static str, get: G, get_mut: M) -> &mut Self
    where
        R: Shape,
        G: Fn(&T) -> &Option<Box<R>> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<Box<R>> + Send + Sync + 'static,
    {
        self.push(
            FieldDescriptor::new::<R>(name, FieldKind::Record, true),
            BoxedRecordField::<G, M, R> {
                get,
                get_mut,
                _record: PhantomData,
            },
        )
    }

    /// Declares a read-only field derived from the rest of the value.
    pub fn computed<V, F>(&mut self, name: &'static str, compute: F) -> &mut Self
    where
        V: 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        let mut descriptor = FieldDescriptor::new::<V>(name, FieldKind::Value, false);
        descriptor.writable = false;
        self.push(
            descriptor,
            ComputedField::<F, V> {
                compute,
                _value: PhantomData,
            },
        )
    }

    /// Hides a declared field from the read side of a copy.
    pub fn write_only(&mut self, name: &'static str) -> &mut Self {
        self.set_flags(name, |field| field.readable = false)
    }

    /// Hides a declared field from the write side of a copy.
    pub fn read_only(&mut self, name: &'static str) -> &mut Self {
        self.set_flags(name, |field| field.writable = false)
    }

    fn set_flags(
        &mut self,
        name: &'static str,
        update: impl FnOnce(&mut FieldDescriptor),
    ) -> &mut Self {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => update(field),
            None => tracing::warn!(
                shape = type_name::<T>(),
                field = name,
                "Access flags set on undeclared field"
            ),
        }
        self
    }

    fn push(
        &mut self,
        descriptor: FieldDescriptor,
        access: impl FieldAccess<T> + 'static,
    ) -> &mut Self {
        if self.fields.iter().any(|field| field.name == descriptor.name) {
            tracing::warn!(
                shape = type_name::<T>(),
                field = descriptor.name,
                "Duplicate field declaration ignored"
            );
            return self;
        }
        self.fields.push(descriptor);
        self.access.push(Box::new(access));
        self
    }

    fn build(self) -> ShapeTable<T> {
        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name, position))
            .collect();
        ShapeTable {
            layout: Arc::new(Layout {
                shape: TypeInfo::of::<T>(),
                fields: self.fields,
                index,
            }),
            access: self.access,
        }
    }
}

/// Returns the cached field table of `T`, building it on first use.
pub fn layout_of<T: Shape>() -> Arc<Layout> {
    Arc::clone(&table::<T>().layout)
}

struct ShapeTable<T> {
    layout: Arc<Layout>,
    access: Vec<Box<dyn FieldAccess<T>>>,
}

type TableCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static TABLES: OnceLock<TableCache> = OnceLock::new();

fn table<T: Shape>() -> Arc<ShapeTable<T>> {
    let cache = TABLES.get_or_init(Default::default);
    let cached = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&TypeId::of::<T>())
        .cloned();
    if let Some(table) = cached.and_then(|table| table.downcast::<ShapeTable<T>>().ok()) {
        return table;
    }

    // Built outside the lock: `describe` is user code.
    let mut builder = ShapeBuilder::new();
    T::describe(&mut builder);
    let built = Arc::new(builder.build());
    tracing::debug!(
        shape = type_name::<T>(),
        fields = built.layout.len(),
        "Built shape table"
    );

    let stored = cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>)
        .clone();
    stored.downcast::<ShapeTable<T>>().unwrap_or(built)
}

/// Typed accessor and mutator pair behind one field.
trait FieldAccess<T>: Send + Sync {
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a>;

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError>;

    fn record_mut<'a>(&self, _target: &'a mut T) -> Option<&'a mut dyn Record> {
        None
    }
}

fn downcast_value<V: Clone + 'static>(value: &dyn Any) -> Result<V, AssignError> {
    value
        .downcast_ref::<V>()
        .cloned()
        .ok_or_else(AssignError::incompatible::<V>)
}

fn rebuild_sequence<C: Sequence>(items: &[&dyn Any]) -> Result<C, AssignError> {
    let elements = items
        .iter()
        .map(|item| downcast_value::<C::Element>(*item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(C::from_elements(elements))
}

struct ValueField<G, M, V> {
    get: G,
    get_mut: M,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, G, M> FieldAccess<T> for ValueField<G, M, V>
where
    V: Clone + Default + 'static,
    G: Fn(&T) -> &V + Send + Sync,
    M: Fn(&mut T) -> &mut V + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        FieldValue::Value(ValueRef::Borrowed((self.get)(target) as &dyn Any))
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        let slot = (self.get_mut)(target);
        match value {
            FieldValue::Absent => *slot = V::default(),
            FieldValue::Value(value) => *slot = downcast_value::<V>(value.as_any())?,
            FieldValue::Sequence(_) | FieldValue::Record(_) => {
                return Err(AssignError::incompatible::<V>());
            }
        }
        Ok(())
    }
}

struct NullableField<G, M, V> {
    get: G,
    get_mut: M,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, G, M> FieldAccess<T> for NullableField<G, M, V>
where
    V: Clone + 'static,
    G: Fn(&T) -> &Option<V> + Send + Sync,
    M: Fn(&mut T) -> &mut Option<V> + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        match (self.get)(target) {
            Some(value) => FieldValue::Value(ValueRef::Borrowed(value as &dyn Any)),
            None => FieldValue::Absent,
        }
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        let slot = (self.get_mut)(target);
        match value {
            FieldValue::Absent => *slot = None,
            FieldValue::Value(value) => *slot = Some(downcast_value::<V>(value.as_any())?),
            FieldValue::Sequence(_) | FieldValue::Record(_) => {
                return Err(AssignError::incompatible::<V>());
            }
        }
        Ok(())
    }
}

struct SequenceField<G, M, C> {
    get: G,
    get_mut: M,
    _sequence: PhantomData<fn() -> C>,
}

impl<T, C, G, M> FieldAccess<T> for SequenceField<G, M, C>
where
    C: Sequence,
    G: Fn(&T) -> &C + Send + Sync,
    M: Fn(&mut T) -> &mut C + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        let items = (self.get)(target)
            .elements()
            .map(|element| element as &dyn Any)
            .collect();
        FieldValue::Sequence(items)
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        let rebuilt = match value {
            FieldValue::Absent => C::default(),
            FieldValue::Sequence(items) => rebuild_sequence::<C>(&items)?,
            FieldValue::Value(_) | FieldValue::Record(_) => {
                return Err(AssignError::incompatible::<C>());
            }
        };
        *(self.get_mut)(target) = rebuilt;
        Ok(())
    }
}

struct OptionalSequenceField<G, M, C> {
    get: G,
    get_mut: M,
    _sequence: PhantomData<fn() -> C>,
}

impl<T, C, G, M> FieldAccess<T> for OptionalSequenceField<G, M, C>
where
    C: Sequence,
    G: Fn(&T) -> &Option<C> + Send + Sync,
    M: Fn(&mut T) -> &mut Option<C> + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        match (self.get)(target) {
            Some(sequence) => FieldValue::Sequence(
                sequence
                    .elements()
                    .map(|element| element as &dyn Any)
                    .collect(),
            ),
            None => FieldValue::Absent,
        }
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        let rebuilt = match value {
            FieldValue::Absent => None,
            FieldValue::Sequence(items) => Some(rebuild_sequence::<C>(&items)?),
            FieldValue::Value(_) | FieldValue::Record(_) => {
                return Err(AssignError::incompatible::<C>());
            }
        };
        *(self.get_mut)(target) = rebuilt;
        Ok(())
    }
}

struct RecordField<G, M, R> {
    get: G,
    get_mut: M,
    _record: PhantomData<fn() -> R>,
}

impl<T, R, G, M> FieldAccess<T> for RecordField<G, M, R>
where
    R: Shape,
    G: Fn(&T) -> &R + Send + Sync,
    M: Fn(&mut T) -> &mut R + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        FieldValue::Record((self.get)(target) as &dyn Record)
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        match value {
            FieldValue::Absent => {
                *(self.get_mut)(target) = R::default();
                Ok(())
            }
            // Nested records are filled through `record_mut`, never assigned.
            FieldValue::Value(_) | FieldValue::Sequence(_) | FieldValue::Record(_) => {
                Err(AssignError::incompatible::<R>())
            }
        }
    }

    fn record_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut dyn Record> {
        Some((self.get_mut)(target) as &mut dyn Record)
    }
}

struct OptionalRecordField<G, M, R> {
    get: G,
    get_mut: M,
    _record: PhantomData<fn() -> R>,
}

impl<T, R, G, M> FieldAccess<T> for OptionalRecordField<G, M, R>
where
    R: Shape,
    G: Fn(&T) -> &Option<R> + Send + Sync,
    M: Fn(&mut T) -> &mut Option<R> + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        match (self.get)(target) {
            Some(record) => FieldValue::Record(record as &dyn Record),
            None => FieldValue::Absent,
        }
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        match value {
            FieldValue::Absent => {
                *(self.get_mut)(target) = None;
                Ok(())
            }
            FieldValue::Value(_) | FieldValue::Sequence(_) | FieldValue::Record(_) => {
                Err(AssignError::incompatible::<R>())
            }
        }
    }

    fn record_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut dyn Record> {
        let record = (self.get_mut)(target).get_or_insert_with(R::default);
        Some(record as &mut dyn Record)
    }
}

struct BoxedRecordField<G, M, R> {
    get: G,
    get_mut: M,
    _record: PhantomData<fn() -> R>,
}

impl<T, R, G, M> FieldAccess<T> for BoxedRecordField<G, M, R>
where
    R: Shape,
    G: Fn(&T) -> &Option<Box<R>> + Send + Sync,
    M: Fn(&mut T) -> &mut Option<Box<R>> + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        match (self.get)(target).as_deref() {
            Some(record) => FieldValue::Record(record as &dyn Record),
            None => FieldValue::Absent,
        }
    }

    fn write(&self, target: &mut T, value: FieldValue<'_>) -> Result<(), AssignError> {
        match value {
            FieldValue::Absent => {
                *(self.get_mut)(target) = None;
                Ok(())
            }
            FieldValue::Value(_) | FieldValue::Sequence(_) | FieldValue::Record(_) => {
                Err(AssignError::incompatible::<R>())
            }
        }
    }

    fn record_mut<'a>(&self, target: &'a mut T) -> Option<&'a mut dyn Record> {
        let boxed = (self.get_mut)(target).get_or_insert_with(Box::default);
        Some(&mut **boxed as &mut dyn Record)
    }
}

struct ComputedField<F, V> {
    compute: F,
    _value: PhantomData<fn() -> V>,
}

impl<T, V, F> FieldAccess<T> for ComputedField<F, V>
where
    V: 'static,
    F: Fn(&T) -> V + Send + Sync,
{
    fn read<'a>(&self, target: &'a T) -> FieldValue<'a> {
        FieldValue::Value(ValueRef::Owned(Box::new((self.compute)(target))))
    }

    fn write(&self, _target: &mut T, _value: FieldValue<'_>) -> Result<(), AssignError> {
        Err(AssignError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Address {
        city: String,
    }

    impl Shape for Address {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape.value("city", |a| &a.city, |a| &mut a.city);
        }
    }

    #[derive(Debug, Default)]
    struct Person {
        first: String,
        last: String,
        age: Option<u32>,
        tags: Vec<String>,
        home: Address,
        work: Option<Address>,
    }

    impl Shape for Person {
        fn describe(shape: &mut ShapeBuilder<Self>) {
            shape
                .value("first", |p| &p.first, |p| &mut p.first)
                .value("last", |p| &p.last, |p| &mut p.last)
                .nullable("age", |p| &p.age, |p| &mut p.age)
                .sequence("tags", |p| &p.tags, |p| &mut p.tags)
                .record("home", |p| &p.home, |p| &mut p.home)
                .optional_record("work", |p| &p.work, |p| &mut p.work)
                .computed("full_name", |p| format!("{} {}", p.first, p.last))
                .read_only("last");
        }
    }

    fn position(layout: &Layout, name: &str) -> usize {
        layout.position(name).expect("declared field")
    }

    #[test]
    fn layout_lists_fields_in_declaration_order() {
        let layout = layout_of::<Person>();
        let names: Vec<_> = layout.fields().iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["first", "last", "age", "tags", "home", "work", "full_name"]
        );
        assert_eq!(layout.shape(), TypeInfo::of::<Person>());
    }

    #[test]
    fn descriptors_carry_kind_and_flags() {
        let layout = layout_of::<Person>();

        let age = layout.field("age").expect("age");
        assert_eq!(age.kind, FieldKind::Value);
        assert_eq!(age.value_type, TypeInfo::of::<u32>());
        assert!(age.nullable);

        let tags = layout.field("tags").expect("tags");
        assert_eq!(tags.kind, FieldKind::Sequence);
        assert_eq!(tags.value_type, TypeInfo::of::<String>());

        let work = layout.field("work").expect("work");
        assert_eq!(work.kind, FieldKind::Record);
        assert_eq!(work.value_type, TypeInfo::of::<Address>());

        let last = layout.field("last").expect("last");
        assert!(last.readable);
        assert!(!last.writable);

        let full_name = layout.field("full_name").expect("full_name");
        assert!(!full_name.writable);
    }

    #[test]
    fn layout_is_cached() {
        assert!(Arc::ptr_eq(&layout_of::<Address>(), &layout_of::<Address>()));
    }

    #[test]
    fn reads_values_through_record_view() {
        let person = Person {
            first: "Ann".to_string(),
            age: Some(41),
            ..Default::default()
        };
        let layout = person.layout();

        let first = person.read_field(position(&layout, "first")).expect("first");
        let FieldValue::Value(value) = first else {
            panic!("expected a value for first");
        };
        assert_eq!(value.as_any().downcast_ref::<String>(), Some(&"Ann".to_string()));

        let computed = person
            .read_field(position(&layout, "full_name"))
            .expect("full_name");
        let FieldValue::Value(value) = computed else {
            panic!("expected a value for full_name");
        };
        assert_eq!(
            value.as_any().downcast_ref::<String>(),
            Some(&"Ann ".to_string())
        );

        let work = person.read_field(position(&layout, "work")).expect("work");
        assert!(work.is_absent());
    }

    #[test]
    fn absent_resets_plain_fields_and_clears_optional_ones() {
        let mut person = Person {
            first: "Ann".to_string(),
            age: Some(41),
            tags: vec!["a".to_string()],
            ..Default::default()
        };
        let layout = person.layout();

        for name in ["first", "age", "tags"] {
            person
                .write_field(position(&layout, name), FieldValue::Absent)
                .expect("write absent");
        }

        assert_eq!(person.first, "");
        assert_eq!(person.age, None);
        assert!(person.tags.is_empty());
    }

    #[test]
    fn wrong_value_type_is_rejected() {
        let mut person = Person::default();
        let layout = person.layout();
        let number = 7_i64;

        let err = person
            .write_field(
                position(&layout, "first"),
                FieldValue::Value(ValueRef::Borrowed(&number)),
            )
            .unwrap_err();
        assert_eq!(
            err,
            AssignError::Incompatible {
                expected: type_name::<String>()
            }
        );
        assert_eq!(person.first, "");
    }

    #[test]
    fn computed_fields_refuse_writes() {
        let mut person = Person::default();
        let layout = person.layout();
        let err = person
            .write_field(position(&layout, "full_name"), FieldValue::Absent)
            .unwrap_err();
        assert_eq!(err, AssignError::ReadOnly);
    }

    #[test]
    fn optional_record_is_created_on_demand() {
        let mut person = Person::default();
        let layout = person.layout();

        let work = person
            .record_field_mut(position(&layout, "work"))
            .expect("record field");
        let city = work.layout().position("city").expect("city");
        let value = "Oslo".to_string();
        work.write_field(city, FieldValue::Value(ValueRef::Borrowed(&value)))
            .expect("write city");

        assert_eq!(
            person.work,
            Some(Address {
                city: "Oslo".to_string()
            })
        );
        assert!(person.record_field_mut(position(&layout, "first")).is_none());
    }

    #[test]
    fn unknown_index_is_reported() {
        let mut address = Address::default();
        assert!(address.read_field(9).is_none());
        assert_eq!(
            address.write_field(9, FieldValue::Absent).unwrap_err(),
            AssignError::UnknownField(9)
        );
    }
}
