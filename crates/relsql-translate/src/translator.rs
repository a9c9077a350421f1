//! Translation rules: one per relational and scalar node kind

use relsql_ir::{BinOp, JoinKind, Projection, Query, RelExpr, ScalarExpr, ScalarKind, UnOp};
use std::collections::HashSet;
use tracing::debug;

use crate::error::TranslateError;
use crate::literal::render_literal;
use crate::node::{FromItem, NodeArena, NodeId, NodeKind, OutputColumn};
use crate::registry::VariableBindings;
use crate::sql::SqlExpr;
use crate::TranslateOptions;

/// Translated scalar expression together with its scalar kind
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TypedExpr {
    pub sql: SqlExpr,
    pub kind: ScalarKind,
}

/// Scratch state owned by a single translation call
pub(crate) struct TranslationContext<'o> {
    options: &'o TranslateOptions,
    pub(crate) nodes: NodeArena,
    pub(crate) bindings: VariableBindings,
    /// Query blocks whose clauses are being translated, outermost first.
    pub(crate) current: Vec<NodeId>,
    relation_aliases: HashSet<String>,
    next_suffix: u64,
    next_derived: u64,
}

impl<'o> TranslationContext<'o> {
    pub(crate) fn new(options: &'o TranslateOptions, query: &Query) -> Self {
        // Generated subquery aliases must never shadow a declared variable,
        // including ones declared later in the walk.
        let relation_aliases = query
            .root
            .declared_variables()
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            options,
            nodes: NodeArena::new(),
            bindings: VariableBindings::new(),
            current: Vec::new(),
            relation_aliases,
            next_suffix: 1,
            next_derived: 0,
        }
    }

    pub(crate) fn translate_root(&mut self, root: &RelExpr) -> Result<NodeId, TranslateError> {
        match root {
            RelExpr::Project {
                input,
                projections,
                variable,
            } => self.translate_project(input, projections, variable.as_deref(), None),
            other => Err(TranslateError::RootNotProjection(other.op_name())),
        }
    }

    fn translate_project(
        &mut self,
        input: &RelExpr,
        projections: &[Projection],
        variable: Option<&str>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TranslateError> {
        if projections.is_empty() {
            return Err(TranslateError::EmptyProjection);
        }

        let top_name = match variable {
            Some(v) => v.to_string(),
            None => self.fresh_relation_alias(),
        };
        let id = self.nodes.push(
            top_name,
            NodeKind::Query {
                from: None,
                conditions: Vec::new(),
            },
            parent,
        );
        debug!(block = %id, alias = %self.nodes.get(id).top_name, "opened query block");

        self.current.push(id);
        let mut conditions = Vec::new();
        let from = self.translate_from(input, id, &mut conditions)?;
        self.nodes.get_mut(id).kind = NodeKind::Query {
            from: Some(from),
            conditions,
        };
        for projection in projections {
            self.translate_projection(id, projection)?;
        }
        let node = self.nodes.get_mut(id);
        node.declared = node.outputs.len();
        self.current.pop();

        if let Some(variable) = variable {
            self.bindings.bind(variable, id)?;
        }
        Ok(id)
    }

    /// Fold a relational subtree into the FROM clause of `block`.
    ///
    /// Filter conditions are pushed onto `conditions`, which is the block's
    /// WHERE list, or the ON list of an enclosing LEFT JOIN's right side.
    fn translate_from(
        &mut self,
        rel: &RelExpr,
        block: NodeId,
        conditions: &mut Vec<SqlExpr>,
    ) -> Result<FromItem, TranslateError> {
        match rel {
            RelExpr::Source {
                table,
                variable,
                columns,
                value_column,
            } => {
                let id = self.nodes.push(
                    variable.clone(),
                    NodeKind::Table {
                        table: table.clone(),
                        columns: columns.clone(),
                        value_column: value_column.clone(),
                    },
                    Some(block),
                );
                self.bindings.bind(variable, id)?;
                Ok(FromItem::Table {
                    table: table.clone(),
                    alias: variable.clone(),
                })
            }
            RelExpr::Filter { input, condition } => {
                let item = self.translate_from(input, block, conditions)?;
                conditions.push(self.translate_condition(condition)?);
                Ok(item)
            }
            RelExpr::Join {
                left,
                right,
                kind,
                on,
            } => self.translate_join(left, right, *kind, on.as_ref(), block, conditions),
            RelExpr::Project {
                input,
                projections,
                variable,
            } => {
                let child = self.translate_project(input, projections, variable.as_deref(), Some(block))?;
                Ok(FromItem::Derived(child))
            }
        }
    }

    fn translate_join(
        &mut self,
        left: &RelExpr,
        right: &RelExpr,
        kind: JoinKind,
        on: Option<&ScalarExpr>,
        block: NodeId,
        conditions: &mut Vec<SqlExpr>,
    ) -> Result<FromItem, TranslateError> {
        match (kind, on) {
            (JoinKind::Cross, Some(_)) => {
                return Err(TranslateError::InvalidJoin(
                    "cross join cannot carry an ON condition".to_string(),
                ))
            }
            (JoinKind::Inner | JoinKind::Left, None) => {
                return Err(TranslateError::InvalidJoin(format!(
                    "{:?} join requires an ON condition",
                    kind
                )))
            }
            _ => {}
        }

        let left_item = self.translate_from(left, block, conditions)?;

        // Filters under the right side of an outer join restrict the join,
        // not the result, so they belong in its ON clause.
        let mut side_conditions = Vec::new();
        let right_item = match kind {
            JoinKind::Left => self.translate_from(right, block, &mut side_conditions)?,
            JoinKind::Inner | JoinKind::Cross => self.translate_from(right, block, conditions)?,
        };

        let on = match on {
            Some(condition) => {
                let mut all = vec![self.translate_condition(condition)?];
                all.extend(side_conditions);
                SqlExpr::conjunction(all)
            }
            None => None,
        };

        Ok(FromItem::Join {
            kind,
            left: Box::new(left_item),
            right: Box::new(right_item),
            on,
        })
    }

    fn translate_condition(&mut self, condition: &ScalarExpr) -> Result<SqlExpr, TranslateError> {
        let typed = self.translate_scalar(condition)?;
        if typed.kind != ScalarKind::Bool {
            return Err(TranslateError::TypeMismatch(format!(
                "condition must be BOOLEAN, found {}",
                typed.kind
            )));
        }
        Ok(typed.sql)
    }

    /// Every explicit projection yields its own output column.
    ///
    /// A plain column also seeds the block's memo, so hidden columns threaded
    /// through later reuse it instead of duplicating it.
    fn translate_projection(&mut self, block: NodeId, projection: &Projection) -> Result<(), TranslateError> {
        let typed = self.translate_scalar(projection.expr())?;

        let requested = match projection.alias() {
            Some(alias) => alias.to_string(),
            None => self.natural_name(projection.expr())?,
        };
        let alias = self.reserve_output_name(block, &requested);

        let node = self.nodes.get_mut(block);
        if let SqlExpr::Column(reference) = &typed.sql {
            node.columns_to_project
                .entry(reference.clone())
                .or_insert_with(|| alias.clone());
        }
        node.outputs.push(OutputColumn {
            expr: typed.sql,
            alias,
            kind: typed.kind,
        });
        Ok(())
    }

    /// Output name an unaliased projection asks for.
    fn natural_name(&self, expr: &ScalarExpr) -> Result<String, TranslateError> {
        match expr {
            ScalarExpr::Property { name, .. } => Ok(name.clone()),
            ScalarExpr::Variable { name } => {
                let owner = self.bindings.lookup(name)?;
                self.value_column(owner, name)
            }
            _ => Ok("expr".to_string()),
        }
    }

    pub(crate) fn translate_scalar(&mut self, expr: &ScalarExpr) -> Result<TypedExpr, TranslateError> {
        match expr {
            ScalarExpr::Literal { value, kind } => Ok(TypedExpr {
                sql: render_literal(value, *kind)?,
                kind: *kind,
            }),
            ScalarExpr::Property { target, name } => {
                let variable = originating_variable(target)?;
                let kind = self.property_kind(variable, name)?;
                let reference = self.resolve_property(variable, name)?;
                Ok(TypedExpr {
                    sql: SqlExpr::Column(reference),
                    kind,
                })
            }
            ScalarExpr::Variable { name } => {
                let owner = self.bindings.lookup(name)?;
                let column = self.value_column(owner, name)?;
                let kind = self.property_kind(name, &column)?;
                let reference = self.resolve_variable(name)?;
                Ok(TypedExpr {
                    sql: SqlExpr::Column(reference),
                    kind,
                })
            }
            ScalarExpr::BinaryOp { op, left, right } => {
                let left = self.translate_scalar(left)?;
                let right = self.translate_scalar(right)?;
                let kind = binary_kind(*op, left.kind, right.kind)?;
                Ok(TypedExpr {
                    sql: SqlExpr::Binary {
                        op: *op,
                        left: Box::new(left.sql),
                        right: Box::new(right.sql),
                    },
                    kind,
                })
            }
            ScalarExpr::UnaryOp { op, expr } => {
                let operand = self.translate_scalar(expr)?;
                let kind = unary_kind(*op, operand.kind)?;
                Ok(TypedExpr {
                    sql: SqlExpr::Unary {
                        op: *op,
                        expr: Box::new(operand.sql),
                    },
                    kind,
                })
            }
        }
    }

    /// Reserve a unique output name at `node`, suffixing on collision.
    pub(crate) fn reserve_output_name(&mut self, node: NodeId, requested: &str) -> String {
        let mut candidate = requested.to_string();
        while self.nodes.get(node).projected_names.contains(&candidate) {
            candidate = format!("{}{}{}", requested, self.options.suffix_separator, self.next_suffix);
            self.next_suffix += 1;
        }
        if candidate != requested {
            debug!(block = %node, requested, alias = %candidate, "renamed colliding output column");
        }
        self.nodes.get_mut(node).projected_names.insert(candidate.clone());
        candidate
    }

    fn fresh_relation_alias(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", self.options.derived_table_prefix, self.next_derived);
            self.next_derived += 1;
            if self.relation_aliases.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Innermost variable of a property chain
pub(crate) fn originating_variable(target: &ScalarExpr) -> Result<&str, TranslateError> {
    match target {
        ScalarExpr::Variable { name } => Ok(name),
        ScalarExpr::Property { target, .. } => originating_variable(target),
        _ => Err(TranslateError::UnrootedProperty),
    }
}

fn binary_kind(op: BinOp, left: ScalarKind, right: ScalarKind) -> Result<ScalarKind, TranslateError> {
    let mismatch = || {
        TranslateError::TypeMismatch(format!(
            "cannot apply {:?} to {} and {}",
            op, left, right
        ))
    };

    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => {
            left.promote(right).ok_or_else(mismatch)
        }
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            if comparable(left, right) {
                Ok(ScalarKind::Bool)
            } else {
                Err(mismatch())
            }
        }
        BinOp::And | BinOp::Or => {
            if left == ScalarKind::Bool && right == ScalarKind::Bool {
                Ok(ScalarKind::Bool)
            } else {
                Err(mismatch())
            }
        }
        BinOp::Like | BinOp::ILike => {
            if left.is_textual() && right.is_textual() {
                Ok(ScalarKind::Bool)
            } else {
                Err(mismatch())
            }
        }
        BinOp::Concat => {
            if left.is_textual() && right.is_textual() {
                Ok(ScalarKind::String)
            } else {
                Err(mismatch())
            }
        }
    }
}

fn comparable(left: ScalarKind, right: ScalarKind) -> bool {
    let temporal = |k: ScalarKind| {
        matches!(k, ScalarKind::Date | ScalarKind::Timestamp | ScalarKind::TimestampTz)
    };
    left == right
        || (left.is_numeric() && right.is_numeric())
        || (left.is_textual() && right.is_textual())
        || (temporal(left) && temporal(right))
}

fn unary_kind(op: UnOp, operand: ScalarKind) -> Result<ScalarKind, TranslateError> {
    match op {
        UnOp::Not if operand == ScalarKind::Bool => Ok(ScalarKind::Bool),
        UnOp::Neg if operand.is_numeric() => Ok(operand),
        UnOp::IsNull => Ok(ScalarKind::Bool),
        _ => Err(TranslateError::TypeMismatch(format!(
            "cannot apply {:?} to {}",
            op, operand
        ))),
    }
}
