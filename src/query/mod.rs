//! Statement layer: validated identifiers, parameterized statements and the
//! executors that run them.
//!
//! Values always travel as parameters. The only identifiers spliced into
//! statement text are the closed `NodeLabel` set and validated
//! `RelationType`s.

pub mod embedded;
pub mod executor;
pub mod identifier;
pub mod remote;
pub mod retry;
pub mod statement;

pub use embedded::EmbeddedExecutor;
pub use executor::QueryExecutor;
pub use identifier::{IdentifierError, RelationRules, RelationType, MAX_RELATION_TYPE_LEN};
pub use remote::HttpExecutor;
pub use retry::RetryingExecutor;
pub use statement::{CompanyProperties, RelationEdge, Statement};
