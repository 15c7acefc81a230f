//! Authorization predicates gating writes on resources.
//!
//! Every predicate is a pure function of the caller's [`Identity`], the HTTP
//! method and, for object-level checks, the [`ObjectAccess`] the target
//! declares. Predicates never fail: a capability the object does not declare
//! simply does not match.
//!
//! Resource handlers group predicates into a [`Policy`] and call
//! [`Policy::check`] before doing anything, then [`Policy::check_object`]
//! once the target object is loaded:
//!
//! ```
//! use axum::http::Method;
//! use lawyer_office_api::auth::Identity;
//! use lawyer_office_api::permissions::{ObjectAccess, OwnerOrReadOnly, Policy};
//!
//! let policy = Policy::new().with(OwnerOrReadOnly);
//! let note = ObjectAccess::new().with_owner(Some(1));
//!
//! let owner = Identity::user(1, "alice", false);
//! let other = Identity::user(2, "bob", false);
//!
//! assert!(policy.check_object(&owner, &Method::PUT, &note).is_ok());
//! assert!(policy.check_object(&other, &Method::PUT, &note).is_err());
//! assert!(policy.check_object(&other, &Method::GET, &note).is_ok());
//! ```

use axum::http::Method;
use tracing::debug;

use crate::auth::{Identity, UserId};
use crate::error::AppError;

/// GET, HEAD and OPTIONS never mutate state
pub fn is_safe_method(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD || method == Method::OPTIONS
}

/// Whether an object declares an identity attribute, and its value if so
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Capability {
    #[default]
    Absent,
    Present(Option<UserId>),
}

impl Capability {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    /// True only when declared, set, and equal to the caller's id
    fn refers_to(&self, identity: &Identity) -> bool {
        match (self, identity.id()) {
            (Self::Present(Some(user)), Some(caller)) => *user == caller,
            _ => false,
        }
    }
}

/// The `owner` / `assigned_to` attributes a resource instance exposes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectAccess {
    pub owner: Capability,
    pub assigned_to: Capability,
}

impl ObjectAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: Option<UserId>) -> Self {
        self.owner = Capability::Present(owner);
        self
    }

    pub fn with_assigned_to(mut self, assigned_to: Option<UserId>) -> Self {
        self.assigned_to = Capability::Present(assigned_to);
        self
    }
}

/// Resource types that can be checked at object level
pub trait AccessSubject {
    fn access(&self) -> ObjectAccess;
}

impl AccessSubject for ObjectAccess {
    fn access(&self) -> ObjectAccess {
        *self
    }
}

/// A single authorization predicate
///
/// Both checks allow by default so a predicate only overrides the phase it
/// cares about.
pub trait Permission: Send + Sync {
    fn name(&self) -> &'static str;

    fn has_permission(&self, _identity: &Identity, _method: &Method) -> bool {
        true
    }

    fn has_object_permission(
        &self,
        _identity: &Identity,
        _method: &Method,
        _object: &ObjectAccess,
    ) -> bool {
        true
    }
}

/// Everyone, including anonymous callers
pub struct AllowAny;

impl Permission for AllowAny {
    fn name(&self) -> &'static str {
        "AllowAny"
    }
}

/// Any authenticated caller
pub struct IsAuthenticated;

impl Permission for IsAuthenticated {
    fn name(&self) -> &'static str {
        "IsAuthenticated"
    }

    fn has_permission(&self, identity: &Identity, _method: &Method) -> bool {
        identity.is_authenticated()
    }
}

/// Reads for everyone, writes for staff
pub struct AdminOrReadOnly;

impl Permission for AdminOrReadOnly {
    fn name(&self) -> &'static str {
        "AdminOrReadOnly"
    }

    fn has_permission(&self, identity: &Identity, method: &Method) -> bool {
        if is_safe_method(method) {
            return true;
        }
        identity.is_authenticated() && identity.is_staff()
    }
}

/// Reads for everyone, writes for the object's owner
///
/// Only attach to resources that declare an owner; objects without one are
/// never writable through this predicate.
pub struct OwnerOrReadOnly;

impl Permission for OwnerOrReadOnly {
    fn name(&self) -> &'static str {
        "OwnerOrReadOnly"
    }

    fn has_object_permission(
        &self,
        identity: &Identity,
        method: &Method,
        object: &ObjectAccess,
    ) -> bool {
        if is_safe_method(method) {
            return true;
        }
        object.owner.refers_to(identity)
    }
}

/// Staff, or the user the object is assigned to (falling back to its owner)
///
/// No safe-method shortcut: reads are gated too. Precedence is staff, then
/// `assigned_to` when declared, then `owner` only when `assigned_to` is not
/// declared, else deny.
pub struct AssignedOrAdmin;

impl Permission for AssignedOrAdmin {
    fn name(&self) -> &'static str {
        "AssignedOrAdmin"
    }

    fn has_object_permission(
        &self,
        identity: &Identity,
        _method: &Method,
        object: &ObjectAccess,
    ) -> bool {
        if identity.is_staff() {
            return true;
        }
        if object.assigned_to.is_present() {
            return object.assigned_to.refers_to(identity);
        }
        if object.owner.is_present() {
            return object.owner.refers_to(identity);
        }
        false
    }
}

/// Ordered list of predicates guarding one resource type
#[derive(Default)]
pub struct Policy {
    permissions: Vec<Box<dyn Permission>>,
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, permission: impl Permission + 'static) -> Self {
        self.permissions.push(Box::new(permission));
        self
    }

    /// Request-level check, run before the handler touches any object
    pub fn check(&self, identity: &Identity, method: &Method) -> Result<(), AppError> {
        match self
            .permissions
            .iter()
            .find(|p| !p.has_permission(identity, method))
        {
            Some(denied) => Err(deny(denied.name(), identity, method)),
            None => Ok(()),
        }
    }

    /// Object-level check against a loaded instance
    pub fn check_object(
        &self,
        identity: &Identity,
        method: &Method,
        subject: &dyn AccessSubject,
    ) -> Result<(), AppError> {
        let object = subject.access();
        match self
            .permissions
            .iter()
            .find(|p| !p.has_object_permission(identity, method, &object))
        {
            Some(denied) => Err(deny(denied.name(), identity, method)),
            None => Ok(()),
        }
    }
}

fn deny(permission: &'static str, identity: &Identity, method: &Method) -> AppError {
    debug!(
        permission = permission,
        user = %identity,
        method = %method,
        "Permission denied"
    );

    if identity.is_authenticated() {
        AppError::Forbidden("You do not have permission to perform this action.".to_string())
    } else {
        AppError::Unauthorized("Authentication credentials were not provided.".to_string())
    }
}
