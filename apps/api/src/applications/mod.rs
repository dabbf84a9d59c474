// Job applications: idempotent registration and the per-job counter.

pub mod handlers;
pub mod registrar;
pub mod store;

pub use registrar::{ApplicationRegistrar, ApplyError};
pub use store::PgApplicationStore;
