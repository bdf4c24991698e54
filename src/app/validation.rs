//! Shared validation mode
//!
//! Admission and delivery run the same validation functions. `Validation`
//! tells them which ledger view to read and how much to check.

/// How much of a method's validation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Parameter sanity only; nothing whose outcome can change between
    /// admission and delivery
    Stateless,
    /// Everything, including existence, duplicates and quorum state
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// Read the committed view (`true`) or the working view (`false`)
    pub committed: bool,
    pub scope: Scope,
}

impl Validation {
    /// Admission: committed view, stateless checks.
    pub const ADMISSION: Validation = Validation {
        committed: true,
        scope: Scope::Stateless,
    };

    /// Delivery: working view, full checks.
    pub const DELIVERY: Validation = Validation {
        committed: false,
        scope: Scope::Full,
    };

    pub fn is_full(&self) -> bool {
        self.scope == Scope::Full
    }
}
