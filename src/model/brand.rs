//! Brand / subsidiary record

use serde::{Deserialize, Serialize};

use super::null_as_default;

/// A brand operated by a company. Only introduced through `Company::brands`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    /// Natural key
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cnpjs: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub products: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_company: Option<String>,
}

impl Brand {
    pub fn new(name: impl Into<String>) -> Self {
        Brand {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_cnpjs<I, S>(mut self, cnpjs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cnpjs = cnpjs.into_iter().map(Into::into).collect();
        self
    }
}
