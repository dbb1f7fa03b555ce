//! Configuration options for the PC/SC card service

/// Scope of the resource-manager context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Context visible to the current user only
    User,
    /// Context of the system-wide card service (default)
    #[default]
    System,
}

impl From<Scope> for pcsc::Scope {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::User => Self::User,
            Scope::System => Self::System,
        }
    }
}

/// Configuration options for the PC/SC card service
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcscConfig {
    /// Scope used when establishing contexts
    pub scope: Scope,
}

impl PcscConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the context scope
    pub const fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}
