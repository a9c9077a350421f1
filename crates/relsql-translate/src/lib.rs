//! relsql SQL translator
//!
//! Lowers a relational query tree (`relsql_ir::Query`) into a single SQL
//! command plus the per-column metadata the execution layer needs to read
//! its results back.
//!
//! ```
//! use relsql_ir::{ColumnDef, Projection, Query, RelExpr, ScalarExpr, ScalarKind};
//!
//! let query = Query::new(RelExpr::project(
//!     RelExpr::source("X", vec![ColumnDef::new("A", ScalarKind::Int32)]),
//!     vec![Projection::Expr(ScalarExpr::property("X", "A"))],
//! ));
//! let command = relsql_translate::translate(&query).unwrap();
//! assert_eq!(command.sql, "SELECT \"X\".\"A\" AS \"A\" FROM \"X\" AS \"X\"");
//! ```

use relsql_ir::Query;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

mod error;
mod finalize;
mod literal;
pub mod node;
mod registry;
mod resolver;
pub mod sql;
mod translator;

pub use error::TranslateError;
pub use finalize::{OutputColumnInfo, TranslatedCommand};
pub use literal::{render_literal, typed_null};
pub use node::ColumnReference;
pub use relsql_ir::ResultTypeOverride;

use finalize::CommandFinalizer;
use translator::TranslationContext;

/// Naming knobs for generated identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateOptions {
    /// Prefix of generated derived-table aliases (`t0`, `t1`, ...)
    pub derived_table_prefix: String,
    /// Separator between a colliding column name and its numeric suffix
    pub suffix_separator: String,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            derived_table_prefix: "t".to_string(),
            suffix_separator: "_".to_string(),
        }
    }
}

/// Stateless translator; every call works on its own private context.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    options: TranslateOptions,
}

impl Translator {
    pub fn new(options: TranslateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TranslateOptions {
        &self.options
    }

    /// Translate a query tree into SQL text and result metadata.
    pub fn translate(&self, query: &Query) -> Result<TranslatedCommand, TranslateError> {
        let mut ctx = TranslationContext::new(&self.options, query);

        let result = ctx
            .translate_root(&query.root)
            .and_then(|root| CommandFinalizer::new(&ctx.nodes).finalize(root));

        match &result {
            Ok(command) => info!(
                columns = command.columns.len(),
                blocks = ctx.nodes.iter().filter(|(_, n)| n.is_query()).count(),
                "translated query"
            ),
            Err(e) => error!(error = %e, "query tree violates translation contract"),
        }
        result
    }
}

/// Translate with default options.
pub fn translate(query: &Query) -> Result<TranslatedCommand, TranslateError> {
    Translator::default().translate(query)
}
