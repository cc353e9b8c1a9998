//! Backend-independent query descriptions over the four recorded data
//! facets: deltas, messages (deltas with their commit envelope), leases and
//! tags.
//!
//! A query holds only logical shape. Compilation is double dispatch: the
//! backend hands the query its filter/sort builder, and the query calls back
//! into the builder's primitives to assemble a backend-native value. Modifier
//! wrappers ([`Invert`], [`Reverse`], [`Repaginate`]) compose over any
//! existing query without re-implementing it and compile to exactly what a
//! hand-written equivalent would.

pub mod filter;
pub mod modifier;
pub mod sort;
pub mod standard;

pub use filter::{
    DeltaFilterBuilder, FilterCombinator, LeaseFilterBuilder, MessageFilterBuilder,
    RecordFilterBuilder, TagFilterBuilder,
};
pub use modifier::{Invert, Repaginate, Reverse};
pub use sort::{
    DeltaSortBuilder, LeaseSortBuilder, MessageSortBuilder, RecordSortBuilder, Reversed,
    SortCombinator, TagSortBuilder,
};
pub use standard::{
    DeltasForEntity, DeltasOfType, MatchingLeases, MatchingTags, MessagesInTransaction,
};

/// Query over recorded deltas.
pub trait DeltaQuery: Send + Sync {
    fn compile_filter<B: DeltaFilterBuilder>(&self, builder: &B) -> B::Filter;

    /// `None` means no explicit order; the adapter's default applies.
    fn compile_sort<B: DeltaSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        let _ = builder;
        None
    }

    fn skip(&self) -> Option<u64> {
        None
    }

    fn take(&self) -> Option<u64> {
        None
    }
}

/// Query over recorded messages.
pub trait MessageQuery: Send + Sync {
    fn compile_filter<B: MessageFilterBuilder>(&self, builder: &B) -> B::Filter;

    fn compile_sort<B: MessageSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        let _ = builder;
        None
    }

    fn skip(&self) -> Option<u64> {
        None
    }

    fn take(&self) -> Option<u64> {
        None
    }
}

/// Query over currently-held leases.
pub trait LeaseQuery: Send + Sync {
    fn compile_filter<B: LeaseFilterBuilder>(&self, builder: &B) -> B::Filter;

    fn compile_sort<B: LeaseSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        let _ = builder;
        None
    }

    fn skip(&self) -> Option<u64> {
        None
    }

    fn take(&self) -> Option<u64> {
        None
    }
}

/// Query over currently-held tags.
pub trait TagQuery: Send + Sync {
    fn compile_filter<B: TagFilterBuilder>(&self, builder: &B) -> B::Filter;

    fn compile_sort<B: TagSortBuilder>(&self, builder: &B) -> Option<B::Sort> {
        let _ = builder;
        None
    }

    fn skip(&self) -> Option<u64> {
        None
    }

    fn take(&self) -> Option<u64> {
        None
    }
}
