//! Company record, keyed by `name`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::brand::Brand;
use super::null_as_default;

/// Metadata key holding free-form relations
pub const META_RELATIONS: &str = "relations";
/// Metadata key holding investor names
pub const META_INVESTORS: &str = "investors";

/// An enriched organization record.
///
/// `name` is the natural key and must be non-empty. List fields keep input
/// order and are not deduplicated. `meta` is an open map for additional
/// signals such as `relations`, `investors` and `other_socials`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cnpjs: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brands: Vec<Brand>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<String>,
    /// Name of the parent holding / economic group
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Company {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brands.push(brand);
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Raw relation entries, if `meta["relations"]` is a list
    pub fn relation_entries(&self) -> &[Value] {
        self.meta_list(META_RELATIONS)
    }

    /// Raw investor entries, if `meta["investors"]` is a list
    pub fn investor_entries(&self) -> &[Value] {
        self.meta_list(META_INVESTORS)
    }

    fn meta_list(&self, key: &str) -> &[Value] {
        match self.meta.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }
}
