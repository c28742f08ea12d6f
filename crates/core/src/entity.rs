//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Stores key records by this identity, so it must stay stable for the lifetime
/// of the record.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
