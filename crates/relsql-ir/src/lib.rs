//! relsql Intermediate Representation (IR)
//!
//! The abstract relational query tree handed to the SQL translator.
//! All types are deterministically serializable so trees can be supplied
//! as JSON and fingerprinted for caching.

use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};

mod types;
pub use types::*;

/// Top-level query: a relational tree whose root is expected to be a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub root: RelExpr,
}

impl Query {
    pub fn new(root: RelExpr) -> Self {
        Self { root }
    }

    /// Calculate fingerprint (SHA-256) for deterministic caching
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("IR should always serialize");
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Relational operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum RelExpr {
    Project {
        input: Box<RelExpr>,
        projections: Vec<Projection>,
        /// Range variable bound to this projection's output, visible to
        /// enclosing operators only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
    },
    Filter {
        input: Box<RelExpr>,
        condition: ScalarExpr,
    },
    Join {
        left: Box<RelExpr>,
        right: Box<RelExpr>,
        kind: JoinKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        on: Option<ScalarExpr>,
    },
    Source {
        table: String,
        variable: String,
        columns: Vec<ColumnDef>,
        /// Column a bare reference to `variable` stands for.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_column: Option<String>,
    },
}

impl RelExpr {
    /// Shorthand for a table source whose variable shares the table name.
    pub fn source(table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        let table = table.into();
        RelExpr::Source {
            variable: table.clone(),
            table,
            columns,
            value_column: None,
        }
    }

    pub fn project(input: RelExpr, projections: Vec<Projection>) -> Self {
        RelExpr::Project {
            input: Box::new(input),
            projections,
            variable: None,
        }
    }

    pub fn filter(input: RelExpr, condition: ScalarExpr) -> Self {
        RelExpr::Filter {
            input: Box::new(input),
            condition,
        }
    }

    pub fn cross_join(left: RelExpr, right: RelExpr) -> Self {
        RelExpr::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind: JoinKind::Cross,
            on: None,
        }
    }

    pub fn join(kind: JoinKind, left: RelExpr, right: RelExpr, on: ScalarExpr) -> Self {
        RelExpr::Join {
            left: Box::new(left),
            right: Box::new(right),
            kind,
            on: Some(on),
        }
    }

    /// Operator name, used in diagnostics
    pub fn op_name(&self) -> &'static str {
        match self {
            RelExpr::Project { .. } => "Project",
            RelExpr::Filter { .. } => "Filter",
            RelExpr::Join { .. } => "Join",
            RelExpr::Source { .. } => "Source",
        }
    }

    /// Every range variable declared in this subtree, in declaration order.
    pub fn declared_variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RelExpr::Project { input, variable, .. } => {
                input.collect_variables(out);
                if let Some(v) = variable {
                    out.push(v);
                }
            }
            RelExpr::Filter { input, .. } => input.collect_variables(out),
            RelExpr::Join { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            RelExpr::Source { variable, .. } => out.push(variable),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Projection {
    Aliased { expr: ScalarExpr, alias: String },
    Expr(ScalarExpr),
}

impl Projection {
    pub fn expr(&self) -> &ScalarExpr {
        match self {
            Projection::Expr(expr) => expr,
            Projection::Aliased { expr, .. } => expr,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Projection::Expr(_) => None,
            Projection::Aliased { alias, .. } => Some(alias),
        }
    }
}

/// Scalar expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScalarExpr {
    Literal { value: Value, kind: ScalarKind },
    Property { target: Box<ScalarExpr>, name: String },
    Variable { name: String },
    BinaryOp { op: BinOp, left: Box<ScalarExpr>, right: Box<ScalarExpr> },
    UnaryOp { op: UnOp, expr: Box<ScalarExpr> },
}

impl ScalarExpr {
    /// `variable.name`
    pub fn property(variable: impl Into<String>, name: impl Into<String>) -> Self {
        ScalarExpr::Property {
            target: Box::new(ScalarExpr::variable(variable)),
            name: name.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        ScalarExpr::Variable { name: name.into() }
    }

    pub fn literal(value: Value, kind: ScalarKind) -> Self {
        ScalarExpr::Literal { value, kind }
    }

    pub fn null(kind: ScalarKind) -> Self {
        ScalarExpr::Literal {
            value: Value::Null,
            kind,
        }
    }

    pub fn binary(op: BinOp, left: ScalarExpr, right: ScalarExpr) -> Self {
        ScalarExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add, Sub, Mul, Div, Mod,
    // Comparison
    Eq, Ne, Lt, Le, Gt, Ge,
    // Logical
    And, Or,
    // String
    Like, ILike, Concat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg,
    Not,
    IsNull,
}

/// Literal payloads. Temporal, UUID, JSON and interval values travel as
/// strings and are interpreted through the literal's declared kind.
///
/// JSON has no NaN or infinity, so non-finite floats are written as the
/// strings `"NaN"`, `"Infinity"` and `"-Infinity"`. They read back as
/// `Value::String`, which float kinds accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(#[serde(serialize_with = "serialize_float")] f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    /// Wire spelling of a non-finite float; `None` for finite values.
    pub fn non_finite_name(value: f64) -> Option<&'static str> {
        if value.is_nan() {
            Some("NaN")
        } else if value == f64::INFINITY {
            Some("Infinity")
        } else if value == f64::NEG_INFINITY {
            Some("-Infinity")
        } else {
            None
        }
    }

    pub fn parse_non_finite(text: &str) -> Option<f64> {
        match text {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        }
    }
}

fn serialize_float<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    match Value::non_finite_name(*value) {
        Some(name) => serializer.serialize_str(name),
        None => serializer.serialize_f64(*value),
    }
}
