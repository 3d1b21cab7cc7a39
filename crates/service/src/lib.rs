//! Service layer holding the authentication decision pipeline and its
//! collaborators.
//! - Separates business logic from data access behind store traits.
//! - Reuses entity definitions in the `models` crate via thin adapters.
//! - Provides clear error types and documented interfaces.

pub mod anomaly;
pub mod auth;
pub mod primes;
