// Canonical profile: pure reconciliation plus its repository.

pub mod handlers;
pub mod reconcile;
pub mod store;

pub use reconcile::merge;
pub use store::{PgProfileStore, ProfileStore};
