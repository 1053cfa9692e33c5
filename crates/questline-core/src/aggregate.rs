//! Persistent aggregate abstraction.

use crate::entity::ReferenceResolver;

/// Trait for aggregate roots persisted as versioned records and restored in
/// two phases.
///
/// Phase one ([`PersistentAggregate::from_record`]) rebuilds every raw field
/// and stores entity handles verbatim. Phase two
/// ([`PersistentAggregate::resolve_references`]) checks those handles against
/// the live registry and replaces the dangling ones with `None`. Phase two
/// never fails.
pub trait PersistentAggregate: Sized {
    /// Serializable record type.
    type Record;

    /// Current record layout version.
    const RECORD_VERSION: u32;

    /// Captures the aggregate as a record.
    fn to_record(&self) -> Self::Record;

    /// Phase one: rebuilds the aggregate from a record.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the record is from an
    /// unsupported layout version.
    fn from_record(record: Self::Record) -> Result<Self, crate::error::DomainError>;

    /// Phase two: resolves entity handles against the live registry.
    fn resolve_references(&mut self, resolver: &mut ReferenceResolver<'_>);
}
