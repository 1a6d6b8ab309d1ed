// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Authorization checks for marketplace operations.
//!
//! Two rules cover every protected write:
//!
//! | Check | Used for |
//! |-------|----------|
//! | [`require_role`] | Seller-only product and shop operations |
//! | [`require_owner`] | Product edits, cart item edits, order reads |

use std::fmt;

use crate::Role;

/// Operation kind for policy checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyOperation {
    /// Create a new entity.
    Create,
    /// Read/find an entity.
    Read,
    /// Update an existing entity.
    Update,
    /// Delete an entity.
    Delete,
    /// List entities.
    List
}

impl PolicyOperation {
    /// Lower-case verb used in messages.
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "view",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::List => "list"
        }
    }
}

/// Authorization denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The actor's role is not among those allowed.
    RoleRequired {
        /// Roles that would have been accepted.
        allowed:   &'static [Role],
        /// Attempted operation.
        operation: PolicyOperation,
        /// Plural resource name, e.g. `"products"`.
        resource:  &'static str
    },
    /// The actor does not own the target entity.
    NotOwner {
        /// Attempted operation.
        operation: PolicyOperation,
        /// Singular resource name, e.g. `"product"`.
        resource:  &'static str
    }
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoleRequired {
                allowed,
                operation,
                resource
            } => {
                let roles = allowed
                    .iter()
                    .map(|r| format!("{}s", r.as_str().to_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" and ");
                write!(f, "Only {roles} can {} {resource}", operation.verb())
            }
            Self::NotOwner {
                operation,
                resource
            } => write!(f, "You cannot {} this {resource}", operation.verb())
        }
    }
}

impl std::error::Error for PolicyError {}

/// Allow the operation only when `actual` is one of `allowed`.
///
/// ```rust
/// use haven_core::{Role, policy::{PolicyOperation, require_role}};
///
/// assert!(require_role(Role::Seller, &[Role::Seller], PolicyOperation::Create, "products").is_ok());
/// assert!(require_role(Role::Buyer, &[Role::Seller], PolicyOperation::Create, "products").is_err());
/// ```
pub fn require_role(
    actual: Role,
    allowed: &'static [Role],
    operation: PolicyOperation,
    resource: &'static str
) -> Result<(), PolicyError> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(PolicyError::RoleRequired {
            allowed,
            operation,
            resource
        })
    }
}

/// Allow the operation only when `actor` is `owner`.
pub fn require_owner<T>(
    owner: &T,
    actor: &T,
    operation: PolicyOperation,
    resource: &'static str
) -> Result<(), PolicyError>
where
    T: PartialEq + ?Sized
{
    if owner == actor {
        Ok(())
    } else {
        Err(PolicyError::NotOwner {
            operation,
            resource
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_check_passes_for_allowed_role() {
        let res = require_role(
            Role::Admin,
            &[Role::Seller, Role::Admin],
            PolicyOperation::Create,
            "categories"
        );
        assert!(res.is_ok());
    }

    #[test]
    fn role_check_message_names_roles() {
        let err = require_role(
            Role::Buyer,
            &[Role::Seller],
            PolicyOperation::Create,
            "products"
        )
        .unwrap_err();
        assert!(matches!(err, PolicyError::RoleRequired { .. }));
        assert_eq!(err.to_string(), "Only sellers can create products");

        let err = require_role(
            Role::Buyer,
            &[Role::Seller, Role::Admin],
            PolicyOperation::Create,
            "categories"
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Only sellers and admins can create categories");
    }

    #[test]
    fn owner_check() {
        assert!(require_owner("a", "a", PolicyOperation::Update, "product").is_ok());
        let err = require_owner("a", "b", PolicyOperation::Delete, "product").unwrap_err();
        assert!(matches!(err, PolicyError::NotOwner { .. }));
        assert_eq!(err.to_string(), "You cannot delete this product");
    }
}
