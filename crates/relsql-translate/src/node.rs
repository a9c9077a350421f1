//! Relational nodes and the per-translation arena they live in

use relsql_ir::{ColumnDef, JoinKind, ScalarKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::sql::SqlExpr;

/// Index of a node in the translation arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A column as seen from one relation alias: `"variable"."name"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnReference {
    pub variable: String,
    pub name: String,
}

impl ColumnReference {
    pub fn new(variable: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            name: name.into(),
        }
    }
}

/// One consumer branch feeding a node into the block above it.
///
/// `active` is the consuming query block; `as_name` is the alias the
/// consumer is itself known by one level further up, which is where a
/// re-exposed column becomes visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectEntry {
    pub active: NodeId,
    pub as_name: String,
}

/// Column in a query block's SELECT list
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub expr: SqlExpr,
    pub alias: String,
    pub kind: ScalarKind,
}

/// Row source in a FROM clause
#[derive(Debug, Clone, PartialEq)]
pub enum FromItem {
    Table {
        table: String,
        alias: String,
    },
    /// Subquery rendered from the referenced query block
    Derived(NodeId),
    Join {
        kind: JoinKind,
        left: Box<FromItem>,
        right: Box<FromItem>,
        on: Option<SqlExpr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Base table; exposes its declared columns physically.
    Table {
        table: String,
        columns: Vec<ColumnDef>,
        value_column: Option<String>,
    },
    /// SELECT block produced by a projection.
    Query {
        from: Option<FromItem>,
        conditions: Vec<SqlExpr>,
    },
}

/// One named row source in the emitted SQL
#[derive(Debug, Clone, PartialEq)]
pub struct RelationalNode {
    pub top_name: String,
    pub kind: NodeKind,
    pub selects: Vec<SelectEntry>,
    pub join_parent: Option<NodeId>,
    pub columns_to_project: HashMap<ColumnReference, String>,
    pub projected_names: HashSet<String>,
    /// SELECT list, in registration order. Always empty for tables.
    pub outputs: Vec<OutputColumn>,
    /// Leading `outputs` produced by the projection list itself; anything
    /// after them is a hidden column threaded through for an enclosing block.
    pub declared: usize,
}

impl RelationalNode {
    pub fn is_query(&self) -> bool {
        matches!(self.kind, NodeKind::Query { .. })
    }

    /// Columns the projection list declares, excluding hidden ones.
    pub fn declared_outputs(&self) -> &[OutputColumn] {
        &self.outputs[..self.declared.min(self.outputs.len())]
    }

    /// Declared output column named `alias`
    pub fn output(&self, alias: &str) -> Option<&OutputColumn> {
        self.declared_outputs().iter().find(|o| o.alias == alias)
    }
}

/// Arena owning every node of one translation
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<RelationalNode>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node fed into `parent`, recording the consumer branch.
    pub fn push(&mut self, top_name: String, kind: NodeKind, parent: Option<NodeId>) -> NodeId {
        let selects = parent
            .map(|p| {
                vec![SelectEntry {
                    active: p,
                    as_name: self.get(p).top_name.clone(),
                }]
            })
            .unwrap_or_default();

        let id = NodeId(self.nodes.len());
        self.nodes.push(RelationalNode {
            top_name,
            kind,
            selects,
            join_parent: parent,
            columns_to_project: HashMap::new(),
            projected_names: HashSet::new(),
            outputs: Vec::new(),
            declared: 0,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> &RelationalNode {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut RelationalNode {
        &mut self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &RelationalNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// `id` followed by every node on its `join_parent` chain
    pub fn chain(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |current| self.get(*current).join_parent)
    }
}
