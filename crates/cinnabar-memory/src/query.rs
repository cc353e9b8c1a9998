//! Filter/sort compilation for the in-memory backend.
//!
//! The backend-native filter value is a boxed predicate over a stored row;
//! the native sort value is a boxed comparator. Queries assemble both by
//! calling back into [`PredicateBuilder`] / [`ComparatorBuilder`], which is
//! the only place in this crate that interprets query primitives.

use std::cmp::Ordering;
use std::marker::PhantomData;

use cinnabar_core::query::{
    DeltaFilterBuilder, DeltaSortBuilder, FilterCombinator, LeaseFilterBuilder, LeaseSortBuilder,
    MessageFilterBuilder, MessageSortBuilder, RecordFilterBuilder, RecordSortBuilder,
    SortCombinator, TagFilterBuilder, TagSortBuilder,
};
use cinnabar_core::types::{Id, Lease, Pointer, Tag, TimeStamp, VersionNumber};

/// A stored row every filter/sort primitive can see.
pub trait Row {
    fn entity(&self) -> Pointer;
    fn type_name(&self) -> &str;
    fn payload(&self) -> &serde_json::Value;
}

/// A row carrying its commit envelope.
pub trait MessageRow: Row {
    fn transaction_id(&self) -> Id;
    fn timestamp(&self) -> TimeStamp;
}

/// A row holding a lease.
pub trait LeaseRow: Row {
    fn lease(&self) -> &Lease;
}

/// A row holding a tag.
pub trait TagRow: Row {
    fn tag(&self) -> &Tag;
}

/// Backend-native filter: a predicate over a stored row.
pub struct Predicate<R>(Box<dyn Fn(&R) -> bool + Send + Sync>);

impl<R> Predicate<R> {
    fn new(f: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn matches(&self, row: &R) -> bool {
        (self.0)(row)
    }
}

/// Backend-native sort: a comparator over stored rows.
pub struct Comparator<R>(Box<dyn Fn(&R, &R) -> Ordering + Send + Sync>);

impl<R> Comparator<R> {
    fn new(f: impl Fn(&R, &R) -> Ordering + Send + Sync + 'static) -> Self {
        Self(Box::new(f))
    }

    pub fn compare(&self, a: &R, b: &R) -> Ordering {
        (self.0)(a, b)
    }
}

/// Filter builder for any row type.
pub struct PredicateBuilder<R>(PhantomData<fn(&R)>);

impl<R> Default for PredicateBuilder<R> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

/// Sort builder for any row type.
pub struct ComparatorBuilder<R>(PhantomData<fn(&R)>);

impl<R> Default for ComparatorBuilder<R> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<R: Row + 'static> FilterCombinator for PredicateBuilder<R> {
    type Filter = Predicate<R>;

    fn and(&self, filters: Vec<Predicate<R>>) -> Predicate<R> {
        Predicate::new(move |row: &R| filters.iter().all(|f| f.matches(row)))
    }

    fn or(&self, filters: Vec<Predicate<R>>) -> Predicate<R> {
        Predicate::new(move |row: &R| filters.iter().any(|f| f.matches(row)))
    }

    fn not(&self, filter: Predicate<R>) -> Predicate<R> {
        Predicate::new(move |row: &R| !filter.matches(row))
    }
}

impl<R: Row + 'static> RecordFilterBuilder for PredicateBuilder<R> {
    fn entity_id_in(&self, entity_ids: &[Id]) -> Predicate<R> {
        let ids = entity_ids.to_vec();
        Predicate::new(move |row: &R| ids.contains(&row.entity().id))
    }

    fn version_eq(&self, version: VersionNumber) -> Predicate<R> {
        Predicate::new(move |row: &R| row.entity().version == version)
    }

    fn version_gte(&self, version: VersionNumber) -> Predicate<R> {
        Predicate::new(move |row: &R| row.entity().version >= version)
    }

    fn version_lte(&self, version: VersionNumber) -> Predicate<R> {
        Predicate::new(move |row: &R| row.entity().version <= version)
    }

    fn type_is(&self, type_name: &str) -> Predicate<R> {
        let name = type_name.to_string();
        Predicate::new(move |row: &R| row.type_name() == name)
    }

    fn property_matches(&self, path: &str, value: &serde_json::Value) -> Predicate<R> {
        let path = path.to_string();
        let value = value.clone();
        Predicate::new(move |row: &R| row.payload().pointer(&path) == Some(&value))
    }
}

impl<R: Row + 'static> DeltaFilterBuilder for PredicateBuilder<R> {}

impl<R: MessageRow + 'static> MessageFilterBuilder for PredicateBuilder<R> {
    fn transaction_id_in(&self, transaction_ids: &[Id]) -> Predicate<R> {
        let ids = transaction_ids.to_vec();
        Predicate::new(move |row: &R| ids.contains(&row.transaction_id()))
    }

    fn timestamp_gte(&self, timestamp: TimeStamp) -> Predicate<R> {
        Predicate::new(move |row: &R| row.timestamp() >= timestamp)
    }

    fn timestamp_lte(&self, timestamp: TimeStamp) -> Predicate<R> {
        Predicate::new(move |row: &R| row.timestamp() <= timestamp)
    }
}

impl<R: LeaseRow + 'static> LeaseFilterBuilder for PredicateBuilder<R> {
    fn lease_matches(&self, lease: &Lease) -> Predicate<R> {
        let lease = lease.clone();
        Predicate::new(move |row: &R| *row.lease() == lease)
    }
}

impl<R: TagRow + 'static> TagFilterBuilder for PredicateBuilder<R> {
    fn tag_matches(&self, tag: &Tag) -> Predicate<R> {
        let tag = tag.clone();
        Predicate::new(move |row: &R| *row.tag() == tag)
    }
}

fn directed(ascending: bool, ordering: Ordering) -> Ordering {
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

/// Total order over optional JSON values: missing < null < bool < number <
/// string < array < object.
fn json_cmp(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    use serde_json::Value;

    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => {
                let a = a.as_f64().unwrap_or(f64::NAN);
                let b = b.as_f64().unwrap_or(f64::NAN);
                a.total_cmp(&b)
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            _ => a.to_string().cmp(&b.to_string()),
        }),
    }
}

impl<R: Row + 'static> SortCombinator for ComparatorBuilder<R> {
    type Sort = Comparator<R>;

    fn combine(&self, sorts: Vec<Comparator<R>>) -> Comparator<R> {
        Comparator::new(move |a: &R, b: &R| {
            for sort in &sorts {
                let ordering = sort.compare(a, b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        })
    }
}

impl<R: Row + 'static> RecordSortBuilder for ComparatorBuilder<R> {
    fn entity_id(&self, ascending: bool) -> Comparator<R> {
        Comparator::new(move |a: &R, b: &R| directed(ascending, a.entity().id.cmp(&b.entity().id)))
    }

    fn version(&self, ascending: bool) -> Comparator<R> {
        Comparator::new(move |a: &R, b: &R| {
            directed(ascending, a.entity().version.cmp(&b.entity().version))
        })
    }

    fn type_name(&self, ascending: bool) -> Comparator<R> {
        Comparator::new(move |a: &R, b: &R| directed(ascending, a.type_name().cmp(b.type_name())))
    }

    fn property(&self, path: &str, ascending: bool) -> Comparator<R> {
        let path = path.to_string();
        Comparator::new(move |a: &R, b: &R| {
            directed(
                ascending,
                json_cmp(a.payload().pointer(&path), b.payload().pointer(&path)),
            )
        })
    }
}

impl<R: Row + 'static> DeltaSortBuilder for ComparatorBuilder<R> {}
impl<R: Row + 'static> MessageSortBuilder for ComparatorBuilder<R> {}
impl<R: Row + 'static> LeaseSortBuilder for ComparatorBuilder<R> {}
impl<R: Row + 'static> TagSortBuilder for ComparatorBuilder<R> {}
