// app/src/services/policy.rs

//! Authorization rules keyed on the user's role.

use crate::models::user::{Role, User};
use serde::Serialize;

pub fn has_admin_privileges(user: &User) -> bool {
  user.role == Role::Admin
}

pub fn can_delete_products(user: &User) -> bool {
  has_admin_privileges(user)
}

/// What the client UI may offer the current user.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Permissions {
  pub can_delete: bool,
  pub role: &'static str,
  pub is_admin: bool,
}

impl Permissions {
  pub fn for_user(user: &User) -> Self {
    Self {
      can_delete: can_delete_products(user),
      role: user.role.display_name(),
      is_admin: has_admin_privileges(user),
    }
  }
}
