use super::EntityMetadata;

/// Aggregate root contract.
///
/// Instance accessors plus the static naming used to derive table and
/// route names for the aggregate.
pub trait AggregateRoot {
    type Id;

    fn id(&self) -> Self::Id;

    fn code(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Aggregate index in the system (e.g. "a001")
    fn aggregate_index() -> &'static str;

    /// Collection name (e.g. "student")
    fn collection_name() -> &'static str;

    /// Full system name, used as the DB table name (e.g. "a001_student")
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
