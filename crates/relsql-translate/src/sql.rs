//! SQL expression AST and its textual rendering

use relsql_ir::{BinOp, UnOp};

use crate::node::ColumnReference;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column(ColumnReference),
    /// Literal already rendered to SQL text (`42`, `'abc'`, `TRUE`)
    Literal(String),
    Null,
    Cast {
        expr: Box<SqlExpr>,
        sql_type: String,
    },
    Binary {
        op: BinOp,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    Unary {
        op: UnOp,
        expr: Box<SqlExpr>,
    },
}

impl SqlExpr {
    pub fn cast(expr: SqlExpr, sql_type: impl Into<String>) -> Self {
        SqlExpr::Cast {
            expr: Box::new(expr),
            sql_type: sql_type.into(),
        }
    }

    /// AND together a list of conditions; `None` when the list is empty.
    pub fn conjunction(conditions: Vec<SqlExpr>) -> Option<SqlExpr> {
        conditions.into_iter().reduce(|acc, next| SqlExpr::Binary {
            op: BinOp::And,
            left: Box::new(acc),
            right: Box::new(next),
        })
    }

    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        self.write_sql(&mut sql);
        sql
    }

    pub fn write_sql(&self, sql: &mut String) {
        match self {
            SqlExpr::Column(reference) => {
                sql.push_str(&qualified_column(&reference.variable, &reference.name));
            }
            SqlExpr::Literal(text) => sql.push_str(text),
            SqlExpr::Null => sql.push_str("NULL"),
            SqlExpr::Cast { expr, sql_type } => {
                sql.push_str("CAST(");
                expr.write_sql(sql);
                sql.push_str(" AS ");
                sql.push_str(sql_type);
                sql.push(')');
            }
            SqlExpr::Binary { op, left, right } => {
                left.write_operand(sql);
                sql.push(' ');
                sql.push_str(binary_operator(*op));
                sql.push(' ');
                right.write_operand(sql);
            }
            SqlExpr::Unary { op, expr } => match op {
                UnOp::Not => {
                    sql.push_str("NOT ");
                    expr.write_operand(sql);
                }
                UnOp::Neg => {
                    sql.push('-');
                    expr.write_operand(sql);
                }
                UnOp::IsNull => {
                    expr.write_operand(sql);
                    sql.push_str(" IS NULL");
                }
            },
        }
    }

    // Operators nested inside another operator are always parenthesized, and
    // so are negative literals, so `-` never doubles into a comment.
    fn write_operand(&self, sql: &mut String) {
        let wrap = match self {
            SqlExpr::Binary { .. } | SqlExpr::Unary { .. } => true,
            SqlExpr::Literal(text) => text.starts_with('-'),
            _ => false,
        };
        if wrap {
            sql.push('(');
            self.write_sql(sql);
            sql.push(')');
        } else {
            self.write_sql(sql);
        }
    }
}

pub fn binary_operator(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "=",
        BinOp::Ne => "<>",
        BinOp::Lt => "<",
        BinOp::Le => "<=",
        BinOp::Gt => ">",
        BinOp::Ge => ">=",
        BinOp::And => "AND",
        BinOp::Or => "OR",
        BinOp::Like => "LIKE",
        BinOp::ILike => "ILIKE",
        BinOp::Concat => "||",
    }
}

/// Quote an identifier, doubling embedded quotes.
///
/// # Examples
/// ```
/// use relsql_translate::sql::quote_identifier;
/// assert_eq!(quote_identifier("A"), "\"A\"");
/// assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal, doubling embedded single quotes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Format a qualified column reference: "alias"."column"
pub fn qualified_column(table_alias: &str, column_name: &str) -> String {
    format!("{}.{}", quote_identifier(table_alias), quote_identifier(column_name))
}
