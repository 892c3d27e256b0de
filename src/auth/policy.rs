use serde::Serialize;
use std::fmt;

use crate::auth::{AuthError, Identity};
use crate::config::PolicyConfig;
use crate::database::models::Role;

/// Named permission checked before an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// List or search any hierarchy level.
    Read,
    /// Create, update or delete hierarchy entities and accounts.
    StructuralWrite,
    /// Step an item or variant quantity by a delta.
    AdjustQuantity,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Read => "Read",
            Capability::StructuralWrite => "StructuralWrite",
            Capability::AdjustQuantity => "AdjustQuantity",
        };
        f.write_str(name)
    }
}

/// Decides whether a verified identity holds a capability.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy {
    quantity_requires_manager: bool,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self { quantity_requires_manager: true }
    }
}

impl AccessPolicy {
    pub fn new(quantity_requires_manager: bool) -> Self {
        Self { quantity_requires_manager }
    }

    pub fn from_config(policy: &PolicyConfig) -> Self {
        Self::new(policy.quantity_requires_manager)
    }

    /// Minimum role for a capability, `None` when any identity qualifies.
    pub fn required_role(&self, capability: Capability) -> Option<Role> {
        match capability {
            Capability::Read => None,
            Capability::StructuralWrite => Some(Role::Manager),
            Capability::AdjustQuantity if self.quantity_requires_manager => Some(Role::Manager),
            Capability::AdjustQuantity => None,
        }
    }

    pub fn authorize(&self, identity: &Identity, capability: Capability) -> Result<(), AuthError> {
        match self.required_role(capability) {
            Some(Role::Manager) if identity.role != Role::Manager => {
                tracing::warn!(
                    "Denied {} to '{}' (id {}) with role {}",
                    capability,
                    identity.username,
                    identity.subject_id,
                    identity.role
                );
                Err(AuthError::InsufficientRole { role: identity.role, capability })
            }
            _ => Ok(()),
        }
    }
}
