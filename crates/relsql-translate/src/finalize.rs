//! Command finalizer: SQL text plus per-column execution metadata

use relsql_ir::{JoinKind, ResultTypeOverride, ScalarKind};
use serde::{Deserialize, Serialize};

use crate::error::TranslateError;
use crate::node::{FromItem, NodeArena, NodeId, NodeKind};
use crate::sql::{quote_identifier, SqlExpr};

/// Final output column as the execution layer sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputColumnInfo {
    pub name: String,
    pub kind: ScalarKind,
}

/// SQL text and the sideband metadata needed to read its results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedCommand {
    pub sql: String,
    pub columns: Vec<OutputColumnInfo>,
    /// One flag per output column: fetch as raw, untyped text.
    pub unknown_result_types: Vec<bool>,
    /// Per-column kind overrides; absent unless at least one column needs one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type_overrides: Option<Vec<Option<ResultTypeOverride>>>,
}

pub(crate) struct CommandFinalizer<'a> {
    nodes: &'a NodeArena,
}

impl<'a> CommandFinalizer<'a> {
    pub(crate) fn new(nodes: &'a NodeArena) -> Self {
        Self { nodes }
    }

    pub(crate) fn finalize(&self, root: NodeId) -> Result<TranslatedCommand, TranslateError> {
        let node = self.nodes.get(root);
        match (&node.kind, node.join_parent) {
            (NodeKind::Query { .. }, None) => {}
            (NodeKind::Query { .. }, Some(_)) => {
                return Err(TranslateError::RootNotProjection("nested Project"))
            }
            (NodeKind::Table { .. }, _) => return Err(TranslateError::RootNotProjection("Source")),
        }

        let mut sql = String::new();
        self.write_block(root, &mut sql);

        let columns: Vec<OutputColumnInfo> = node
            .outputs
            .iter()
            .map(|o| OutputColumnInfo {
                name: o.alias.clone(),
                kind: o.kind,
            })
            .collect();

        let unknown_result_types = columns.iter().map(|c| c.kind.is_textual()).collect();

        let overrides: Vec<Option<ResultTypeOverride>> =
            columns.iter().map(|c| c.kind.result_override()).collect();
        let result_type_overrides = if overrides.iter().any(Option::is_some) {
            Some(overrides)
        } else {
            None
        };

        Ok(TranslatedCommand {
            sql,
            columns,
            unknown_result_types,
            result_type_overrides,
        })
    }

    fn write_block(&self, id: NodeId, sql: &mut String) {
        let node = self.nodes.get(id);

        sql.push_str("SELECT ");
        for (i, output) in node.outputs.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            output.expr.write_sql(sql);
            sql.push_str(" AS ");
            sql.push_str(&quote_identifier(&output.alias));
        }

        if let NodeKind::Query { from, conditions } = &node.kind {
            if let Some(from) = from {
                sql.push_str(" FROM ");
                self.write_from(from, sql);
            }
            if let Some(condition) = SqlExpr::conjunction(conditions.clone()) {
                sql.push_str(" WHERE ");
                condition.write_sql(sql);
            }
        }
    }

    fn write_from(&self, item: &FromItem, sql: &mut String) {
        match item {
            FromItem::Table { table, alias } => {
                sql.push_str(&quote_identifier(table));
                sql.push_str(" AS ");
                sql.push_str(&quote_identifier(alias));
            }
            FromItem::Derived(id) => {
                sql.push('(');
                self.write_block(*id, sql);
                sql.push_str(") AS ");
                sql.push_str(&quote_identifier(&self.nodes.get(*id).top_name));
            }
            FromItem::Join {
                kind,
                left,
                right,
                on,
            } => {
                self.write_from(left, sql);
                sql.push_str(match kind {
                    JoinKind::Inner => " INNER JOIN ",
                    JoinKind::Left => " LEFT JOIN ",
                    JoinKind::Cross => " CROSS JOIN ",
                });
                if matches!(**right, FromItem::Join { .. }) {
                    sql.push('(');
                    self.write_from(right, sql);
                    sql.push(')');
                } else {
                    self.write_from(right, sql);
                }
                if let Some(on) = on {
                    sql.push_str(" ON ");
                    on.write_sql(sql);
                }
            }
        }
    }
}
