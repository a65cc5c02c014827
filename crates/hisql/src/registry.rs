//! Registration of derived entities.
//!
//! `#[derive(Entity)]` submits an [`EntityRegistration`] for every entity type, so a
//! host can validate all declarations at startup instead of at first use.
//!
//! ```ignore
//! let problems = hisql::registry::check_registered();
//! for err in &problems {
//!     tracing::error!("{err}");
//! }
//! ```

use crate::entity::{EntityDescriptor, MetadataResolver};
use crate::error::OrmError;

/// Registration entry for one entity type.
pub struct EntityRegistration {
    pub descriptor: fn() -> &'static EntityDescriptor,
}

inventory::collect!(EntityRegistration);

/// Descriptors of every registered entity type.
pub fn registered() -> impl Iterator<Item = &'static EntityDescriptor> {
    inventory::iter::<EntityRegistration>
        .into_iter()
        .map(|r| (r.descriptor)())
}

/// Look up a registered entity by Rust type name.
pub fn find(type_name: &str) -> Option<&'static EntityDescriptor> {
    registered().find(|d| d.type_name == type_name)
}

/// Resolve every registered entity and return the declaration errors found.
pub fn check_registered() -> Vec<OrmError> {
    let resolver = MetadataResolver::default();
    let mut errors = Vec::new();
    let mut checked = 0usize;
    for desc in registered() {
        checked += 1;
        if let Err(err) = resolver.resolve(desc) {
            errors.push(err);
        }
    }
    tracing::debug!(
        target: "hisql.meta",
        checked,
        failed = errors.len(),
        "checked registered entities"
    );
    errors
}
