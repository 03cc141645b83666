//! `aidflow-auth`: pure authorization boundary.
//!
//! Identity is an external collaborator; this crate only models the claims it
//! hands us and the `(role, operation)` policy table. Decoupled from HTTP and
//! storage.

pub mod authorize;
pub mod claims;
pub mod operation;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, Grant, Subject, allowed_operations, authorize, grant};
pub use claims::{JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use operation::Operation;
pub use principal::Principal;
pub use roles::Role;
