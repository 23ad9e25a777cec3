//! Entity records passed into the graph builder

pub mod brand;
pub mod company;
pub mod relationship;

pub use brand::Brand;
pub use company::Company;
pub use relationship::Relationship;

use serde::{Deserialize, Deserializer};

/// Enrichment output frequently carries `null` where a list is expected;
/// treat it as the empty default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
