//! Modifier wrappers that compose over an existing query.
//!
//! Wrappers are transparent: compiling a modified query against any backend
//! builder yields exactly the filter/sort a hand-written equivalent query
//! would yield for that backend.

use crate::query::filter::{
    DeltaFilterBuilder, LeaseFilterBuilder, MessageFilterBuilder, TagFilterBuilder,
};
use crate::query::sort::{
    DeltaSortBuilder, LeaseSortBuilder, MessageSortBuilder, Reversed, TagSortBuilder,
};
use crate::query::{DeltaQuery, LeaseQuery, MessageQuery, TagQuery};

/// Negate a query's filter; sort and pagination pass through.
#[derive(Debug, Clone)]
pub struct Invert<Q>(pub Q);

/// Flip every ascending flag in a query's sort; filter and pagination pass
/// through. A query with no explicit sort stays that way (the adapter default
/// is not the wrapper's to reverse).
#[derive(Debug, Clone)]
pub struct Reverse<Q>(pub Q);

/// Override a query's pagination bounds; filter and sort pass through.
#[derive(Debug, Clone)]
pub struct Repaginate<Q> {
    pub query: Q,
    pub skip: Option<u64>,
    pub take: Option<u64>,
}

impl<Q> Repaginate<Q> {
    pub fn new(query: Q, skip: Option<u64>, take: Option<u64>) -> Self {
        Self { query, skip, take }
    }
}

macro_rules! impl_modifiers {
    ($query:ident, $filter_builder:ident, $sort_builder:ident) => {
        impl<Q: $query> $query for Invert<Q> {
            fn compile_filter<B: $filter_builder>(&self, builder: &B) -> B::Filter {
                builder.not(self.0.compile_filter(builder))
            }

            fn compile_sort<B: $sort_builder>(&self, builder: &B) -> Option<B::Sort> {
                self.0.compile_sort(builder)
            }

            fn skip(&self) -> Option<u64> {
                self.0.skip()
            }

            fn take(&self) -> Option<u64> {
                self.0.take()
            }
        }

        impl<Q: $query> $query for Reverse<Q> {
            fn compile_filter<B: $filter_builder>(&self, builder: &B) -> B::Filter {
                self.0.compile_filter(builder)
            }

            fn compile_sort<B: $sort_builder>(&self, builder: &B) -> Option<B::Sort> {
                self.0.compile_sort(&Reversed(builder))
            }

            fn skip(&self) -> Option<u64> {
                self.0.skip()
            }

            fn take(&self) -> Option<u64> {
                self.0.take()
            }
        }

        impl<Q: $query> $query for Repaginate<Q> {
            fn compile_filter<B: $filter_builder>(&self, builder: &B) -> B::Filter {
                self.query.compile_filter(builder)
            }

            fn compile_sort<B: $sort_builder>(&self, builder: &B) -> Option<B::Sort> {
                self.query.compile_sort(builder)
            }

            fn skip(&self) -> Option<u64> {
                self.skip
            }

            fn take(&self) -> Option<u64> {
                self.take
            }
        }
    };
}

impl_modifiers!(DeltaQuery, DeltaFilterBuilder, DeltaSortBuilder);
impl_modifiers!(MessageQuery, MessageFilterBuilder, MessageSortBuilder);
impl_modifiers!(LeaseQuery, LeaseFilterBuilder, LeaseSortBuilder);
impl_modifiers!(TagQuery, TagFilterBuilder, TagSortBuilder);
