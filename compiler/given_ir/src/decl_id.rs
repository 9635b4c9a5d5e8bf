//! Declaration identity.

use std::fmt;

/// Identity of one collected injectable declaration.
///
/// Assigned by the declaration-collection collaborator; unique within a
/// compilation unit. Derived declarations (substituted generics, add-on
/// expansions) keep the id of the declaration they came from, which is what
/// cycle detection and diagnostics key on.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct DeclId(u32);

impl DeclId {
    /// Shared by declarations the resolver makes up itself (lambda
    /// parameters). Never handed out by declaration collection.
    pub const SYNTHETIC: DeclId = DeclId(u32::MAX);

    /// Create a declaration id.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        DeclId(raw)
    }

    /// Get the raw value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeclId({})", self.0)
    }
}
