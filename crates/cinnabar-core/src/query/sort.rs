//! Backend sort-builder interfaces and the ascending-flip decorator.

/// Combining multiple sort keys into one backend-native ordering.
pub trait SortCombinator {
    /// The backend-native sort value.
    type Sort;

    /// Lexicographic combination: earlier entries take precedence.
    fn combine(&self, sorts: Vec<Self::Sort>) -> Self::Sort;
}

/// Primitive orderings over any recorded row.
pub trait RecordSortBuilder: SortCombinator {
    fn entity_id(&self, ascending: bool) -> Self::Sort;
    fn version(&self, ascending: bool) -> Self::Sort;
    fn type_name(&self, ascending: bool) -> Self::Sort;
    fn property(&self, path: &str, ascending: bool) -> Self::Sort;
}

/// Sort builder for the delta facet.
pub trait DeltaSortBuilder: RecordSortBuilder {}

/// Sort builder for the message facet.
pub trait MessageSortBuilder: RecordSortBuilder {}

/// Sort builder for the lease facet.
pub trait LeaseSortBuilder: RecordSortBuilder {}

/// Sort builder for the tag facet.
pub trait TagSortBuilder: RecordSortBuilder {}

/// Decorator that flips every `ascending` flag before delegating.
///
/// `Reverse` query wrappers compile their inner query against this, so any
/// query's descending variant compiles to exactly what a hand-written
/// equivalent would produce on the same backend.
pub struct Reversed<'a, B: ?Sized>(pub &'a B);

impl<B: SortCombinator + ?Sized> SortCombinator for Reversed<'_, B> {
    type Sort = B::Sort;

    fn combine(&self, sorts: Vec<Self::Sort>) -> Self::Sort {
        self.0.combine(sorts)
    }
}

impl<B: RecordSortBuilder + ?Sized> RecordSortBuilder for Reversed<'_, B> {
    fn entity_id(&self, ascending: bool) -> Self::Sort {
        self.0.entity_id(!ascending)
    }

    fn version(&self, ascending: bool) -> Self::Sort {
        self.0.version(!ascending)
    }

    fn type_name(&self, ascending: bool) -> Self::Sort {
        self.0.type_name(!ascending)
    }

    fn property(&self, path: &str, ascending: bool) -> Self::Sort {
        self.0.property(path, !ascending)
    }
}

impl<B: DeltaSortBuilder + ?Sized> DeltaSortBuilder for Reversed<'_, B> {}
impl<B: MessageSortBuilder + ?Sized> MessageSortBuilder for Reversed<'_, B> {}
impl<B: LeaseSortBuilder + ?Sized> LeaseSortBuilder for Reversed<'_, B> {}
impl<B: TagSortBuilder + ?Sized> TagSortBuilder for Reversed<'_, B> {}
