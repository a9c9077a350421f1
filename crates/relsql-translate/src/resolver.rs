//! Reference resolution
//!
//! Turns `variable.property` into a column reference that is valid in the
//! block consuming it. When the owning node sits below one or more derived
//! tables, each of those tables gets a (hidden) output column re-exposing
//! the value, and the returned reference points at the outermost one.
//!
//! Resolution is memoized per node through `columns_to_project`: asking for
//! the same `(alias, column)` at the same node always yields the same output
//! name, so repeated uses of one logical column never fragment.

use relsql_ir::ScalarKind;
use tracing::{debug, trace};

use crate::error::TranslateError;
use crate::node::{ColumnReference, NodeId, NodeKind, OutputColumn};
use crate::sql::SqlExpr;
use crate::translator::TranslationContext;

impl TranslationContext<'_> {
    /// Resolve `variable.property` against the current consuming block.
    pub(crate) fn resolve_property(
        &mut self,
        variable: &str,
        property: &str,
    ) -> Result<ColumnReference, TranslateError> {
        let owner = self.bindings.lookup(variable)?;
        let kind = self.column_kind(owner, variable, property)?;
        self.check_scope(owner, variable)?;

        let mut from = self.nodes.get(owner).top_name.clone();
        let mut name = property.to_string();
        let mut cursor = Some(owner);

        while let Some(id) = cursor {
            let entries = self.nodes.get(id).selects.clone();
            for entry in entries {
                if self.current.contains(&entry.active) {
                    continue;
                }
                let source = ColumnReference::new(from, name.clone());
                name = self.project_column(entry.active, source, &name, kind)?;
                from = entry.as_name;
            }
            cursor = self.nodes.get(id).join_parent;
        }

        Ok(ColumnReference::new(from, name))
    }

    /// Resolve a bare variable through its owner's value column.
    pub(crate) fn resolve_variable(&mut self, variable: &str) -> Result<ColumnReference, TranslateError> {
        let owner = self.bindings.lookup(variable)?;
        let column = self.value_column(owner, variable)?;
        self.resolve_property(variable, &column)
    }

    pub(crate) fn property_kind(&self, variable: &str, property: &str) -> Result<ScalarKind, TranslateError> {
        let owner = self.bindings.lookup(variable)?;
        self.column_kind(owner, variable, property)
    }

    pub(crate) fn value_column(&self, owner: NodeId, variable: &str) -> Result<String, TranslateError> {
        let node = self.nodes.get(owner);
        let column = match &node.kind {
            NodeKind::Table { value_column, .. } => value_column.clone(),
            NodeKind::Query { .. } => match node.declared_outputs() {
                [only] => Some(only.alias.clone()),
                _ => None,
            },
        };
        column.ok_or_else(|| TranslateError::NoValueColumn(variable.to_string()))
    }

    /// Memoized registration of `source` in `block`'s SELECT list.
    pub(crate) fn project_column(
        &mut self,
        block: NodeId,
        source: ColumnReference,
        requested: &str,
        kind: ScalarKind,
    ) -> Result<String, TranslateError> {
        if let Some(alias) = self.nodes.get(block).columns_to_project.get(&source) {
            trace!(block = %block, column = %alias, "reused projected column");
            return Ok(alias.clone());
        }

        let alias = self.reserve_output_name(block, requested);
        let node = self.nodes.get_mut(block);
        node.columns_to_project.insert(source.clone(), alias.clone());
        node.outputs.push(OutputColumn {
            expr: SqlExpr::Column(source),
            alias: alias.clone(),
            kind,
        });
        debug!(block = %block, via = %node.top_name, column = %alias, "projected column");
        Ok(alias)
    }

    fn column_kind(&self, owner: NodeId, variable: &str, property: &str) -> Result<ScalarKind, TranslateError> {
        let node = self.nodes.get(owner);
        let kind = match &node.kind {
            NodeKind::Table { columns, .. } => columns.iter().find(|c| c.name == property).map(|c| c.kind),
            NodeKind::Query { .. } => node.output(property).map(|o| o.kind),
        };
        kind.ok_or_else(|| TranslateError::UnknownColumn {
            variable: variable.to_string(),
            column: property.to_string(),
        })
    }

    // The consuming block must sit on the owner's chain; anything else would
    // need a lateral reference into a sibling subquery.
    fn check_scope(&self, owner: NodeId, variable: &str) -> Result<(), TranslateError> {
        let reachable = self
            .current
            .last()
            .is_some_and(|consumer| self.nodes.chain(owner).any(|id| id == *consumer));
        if reachable {
            Ok(())
        } else {
            Err(TranslateError::OutOfScope(variable.to_string()))
        }
    }
}
