//! End-to-end tests: query tree → SQL text + result metadata
//!
//! Run with: cargo test --package relsql-translate --test translation

use relsql_ir::{BinOp, ColumnDef, JoinKind, Projection, Query, RelExpr, ScalarExpr, ScalarKind, Value};
use relsql_translate::{
    translate, ResultTypeOverride, TranslateError, TranslateOptions, TranslatedCommand, Translator,
};

fn table(name: &str, columns: &[(&str, ScalarKind)]) -> RelExpr {
    RelExpr::source(
        name,
        columns.iter().map(|(c, k)| ColumnDef::new(*c, *k)).collect(),
    )
}

fn col(variable: &str, name: &str) -> Projection {
    Projection::Expr(ScalarExpr::property(variable, name))
}

fn text(value: &str) -> ScalarExpr {
    ScalarExpr::literal(Value::String(value.to_string()), ScalarKind::String)
}

fn eq(left: ScalarExpr, right: ScalarExpr) -> ScalarExpr {
    ScalarExpr::binary(BinOp::Eq, left, right)
}

/// Project(CrossJoin(X, Y), [X.A, Y.A])
fn cross_join_query() -> Query {
    Query::new(RelExpr::project(
        RelExpr::cross_join(
            table("X", &[("A", ScalarKind::Int32)]),
            table("Y", &[("A", ScalarKind::Int32)]),
        ),
        vec![col("X", "A"), col("Y", "A")],
    ))
}

#[test]
fn test_cross_join_end_to_end() {
    let command = translate(&cross_join_query()).expect("Translation should succeed");

    assert_eq!(
        command.sql,
        r#"SELECT "X"."A" AS "A", "Y"."A" AS "A_1" FROM "X" AS "X" CROSS JOIN "Y" AS "Y""#
    );
    assert_eq!(command.unknown_result_types, vec![false, false]);
    assert_eq!(command.result_type_overrides, None);

    let names: Vec<&str> = command.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "A_1"]);
}

#[test]
fn test_renamed_column_reused_by_enclosing_filter() {
    // The outer filter and projection both read Y.A, which the inner block
    // already exposes as "A_1"; no second copy is registered.
    let query = Query::new(RelExpr::project(
        RelExpr::filter(
            RelExpr::project(
                RelExpr::cross_join(
                    table("X", &[("A", ScalarKind::String)]),
                    table("Y", &[("A", ScalarKind::String)]),
                ),
                vec![col("X", "A"), col("Y", "A")],
            ),
            eq(ScalarExpr::property("Y", "A"), text("v")),
        ),
        vec![col("Y", "A")],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        concat!(
            r#"SELECT "t1"."A_1" AS "A" "#,
            r#"FROM (SELECT "X"."A" AS "A", "Y"."A" AS "A_1" FROM "X" AS "X" CROSS JOIN "Y" AS "Y") AS "t1" "#,
            r#"WHERE "t1"."A_1" = 'v'"#
        )
    );
    assert_eq!(command.unknown_result_types, vec![true]);
}

#[test]
fn test_hidden_column_threaded_through_every_level() {
    let query = Query::new(RelExpr::project(
        RelExpr::project(
            RelExpr::project(
                table("X", &[("A", ScalarKind::Int64), ("B", ScalarKind::Int64)]),
                vec![col("X", "A")],
            ),
            vec![col("X", "A")],
        ),
        vec![col("X", "A"), col("X", "B")],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        concat!(
            r#"SELECT "t1"."A" AS "A", "t1"."B" AS "B" FROM ("#,
            r#"SELECT "t2"."A" AS "A", "t2"."B" AS "B" FROM ("#,
            r#"SELECT "X"."A" AS "A", "X"."B" AS "B" FROM "X" AS "X""#,
            r#") AS "t2") AS "t1""#
        )
    );
}

#[test]
fn test_named_subquery_is_referenced_by_its_variable() {
    let query = Query::new(RelExpr::project(
        RelExpr::cross_join(
            RelExpr::Project {
                input: Box::new(table("X", &[("A", ScalarKind::Int32)])),
                projections: vec![col("X", "A")],
                variable: Some("sub".to_string()),
            },
            table("Y", &[("B", ScalarKind::Int32)]),
        ),
        vec![col("sub", "A"), col("Y", "B")],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        concat!(
            r#"SELECT "sub"."A" AS "A", "Y"."B" AS "B" "#,
            r#"FROM (SELECT "X"."A" AS "A" FROM "X" AS "X") AS "sub" CROSS JOIN "Y" AS "Y""#
        )
    );
}

#[test]
fn test_named_block_value_independent_of_reference_order() {
    let named = |projections: Vec<Projection>| {
        Query::new(RelExpr::project(
            RelExpr::Project {
                input: Box::new(table("X", &[("A", ScalarKind::Int32), ("B", ScalarKind::Int32)])),
                projections: vec![col("X", "A")],
                variable: Some("v".to_string()),
            },
            projections,
        ))
    };
    let bare_v = || Projection::Expr(ScalarExpr::variable("v"));

    let v_first = translate(&named(vec![bare_v(), col("X", "B")])).unwrap();
    let v_last = translate(&named(vec![col("X", "B"), bare_v()])).unwrap();

    assert_eq!(
        v_last.sql,
        concat!(
            r#"SELECT "v"."B" AS "B", "v"."A" AS "A" "#,
            r#"FROM (SELECT "X"."A" AS "A", "X"."B" AS "B" FROM "X" AS "X") AS "v""#
        )
    );
    assert_eq!(v_first.columns.len(), 2);
    assert_eq!(v_last.columns.len(), 2);
}

#[test]
fn test_every_explicit_projection_yields_a_column() {
    let twice = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::String)]),
        vec![col("X", "A"), col("X", "A")],
    ));
    let command = translate(&twice).unwrap();
    assert_eq!(
        command.sql,
        r#"SELECT "X"."A" AS "A", "X"."A" AS "A_1" FROM "X" AS "X""#
    );
    assert_eq!(command.unknown_result_types, vec![true, true]);

    let aliased_first = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::String)]),
        vec![
            Projection::Aliased {
                expr: ScalarExpr::property("X", "A"),
                alias: "Z".to_string(),
            },
            col("X", "A"),
        ],
    ));
    let command = translate(&aliased_first).unwrap();
    assert_eq!(
        command.sql,
        r#"SELECT "X"."A" AS "Z", "X"."A" AS "A" FROM "X" AS "X""#
    );
    let names: Vec<&str> = command.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Z", "A"]);
    assert_eq!(command.unknown_result_types.len(), 2);
}

#[test]
fn test_left_join_filter_moves_into_on_clause() {
    let query = Query::new(RelExpr::project(
        RelExpr::join(
            JoinKind::Left,
            table("X", &[("id", ScalarKind::Int64), ("A", ScalarKind::String)]),
            RelExpr::filter(
                table("Y", &[("id", ScalarKind::Int64), ("B", ScalarKind::String)]),
                eq(ScalarExpr::property("Y", "B"), text("b")),
            ),
            eq(ScalarExpr::property("X", "id"), ScalarExpr::property("Y", "id")),
        ),
        vec![col("X", "A"), col("Y", "B")],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        concat!(
            r#"SELECT "X"."A" AS "A", "Y"."B" AS "B" "#,
            r#"FROM "X" AS "X" LEFT JOIN "Y" AS "Y" "#,
            r#"ON ("X"."id" = "Y"."id") AND ("Y"."B" = 'b')"#
        )
    );
    assert!(!command.sql.contains("WHERE"));
}

#[test]
fn test_inner_join_filter_stays_in_where() {
    let query = Query::new(RelExpr::project(
        RelExpr::join(
            JoinKind::Inner,
            table("X", &[("id", ScalarKind::Int64)]),
            RelExpr::filter(
                table("Y", &[("id", ScalarKind::Int64), ("B", ScalarKind::String)]),
                eq(ScalarExpr::property("Y", "B"), text("b")),
            ),
            eq(ScalarExpr::property("X", "id"), ScalarExpr::property("Y", "id")),
        ),
        vec![col("Y", "B")],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        concat!(
            r#"SELECT "Y"."B" AS "B" "#,
            r#"FROM "X" AS "X" INNER JOIN "Y" AS "Y" ON "X"."id" = "Y"."id" "#,
            r#"WHERE "Y"."B" = 'b'"#
        )
    );
}

#[test]
fn test_null_literals_keep_their_kind() {
    let query = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::Int32)]),
        vec![
            col("X", "A"),
            Projection::Aliased {
                expr: ScalarExpr::null(ScalarKind::Int32),
                alias: "n".to_string(),
            },
            Projection::Aliased {
                expr: ScalarExpr::null(ScalarKind::String),
                alias: "s".to_string(),
            },
        ],
    ));

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        r#"SELECT "X"."A" AS "A", CAST(NULL AS INTEGER) AS "n", CAST(NULL AS VARCHAR) AS "s" FROM "X" AS "X""#
    );
    assert_eq!(command.columns[1].kind, ScalarKind::Int32);
    assert_eq!(command.unknown_result_types, vec![false, false, true]);
}

#[test]
fn test_metadata_shape() {
    let single = |kind: ScalarKind| -> TranslatedCommand {
        translate(&Query::new(RelExpr::project(
            table("X", &[("c", kind)]),
            vec![col("X", "c")],
        )))
        .unwrap()
    };

    let int = single(ScalarKind::Int32);
    assert_eq!(int.unknown_result_types, vec![false]);
    assert_eq!(int.result_type_overrides, None);
    let json = serde_json::to_value(&int).unwrap();
    assert!(json.get("result_type_overrides").is_none());

    let string = single(ScalarKind::String);
    assert_eq!(string.unknown_result_types, vec![true]);
    assert_eq!(string.result_type_overrides, None);

    let tiny = single(ScalarKind::Int8);
    assert_eq!(tiny.unknown_result_types, vec![false]);
    assert_eq!(
        tiny.result_type_overrides,
        Some(vec![Some(ResultTypeOverride::SignedByte)])
    );
    let json = serde_json::to_value(&tiny).unwrap();
    assert_eq!(json["result_type_overrides"].as_array().map(Vec::len), Some(1));
}

#[test]
fn test_top_level_filter_is_rejected() {
    let query = Query::new(RelExpr::filter(
        table("X", &[("A", ScalarKind::Bool)]),
        ScalarExpr::property("X", "A"),
    ));

    assert_eq!(translate(&query), Err(TranslateError::RootNotProjection("Filter")));
}

#[test]
fn test_contract_violations() {
    let unbound = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::Int32)]),
        vec![col("Z", "A")],
    ));
    assert_eq!(
        translate(&unbound),
        Err(TranslateError::UnboundVariable("Z".to_string()))
    );

    let duplicate = Query::new(RelExpr::project(
        RelExpr::cross_join(
            table("X", &[("A", ScalarKind::Int32)]),
            table("X", &[("A", ScalarKind::Int32)]),
        ),
        vec![col("X", "A")],
    ));
    assert_eq!(
        translate(&duplicate),
        Err(TranslateError::DuplicateVariable("X".to_string()))
    );

    let unknown = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::Int32)]),
        vec![col("X", "missing")],
    ));
    assert!(matches!(
        translate(&unknown),
        Err(TranslateError::UnknownColumn { .. })
    ));

    let empty = Query::new(RelExpr::project(table("X", &[("A", ScalarKind::Int32)]), vec![]));
    assert_eq!(translate(&empty), Err(TranslateError::EmptyProjection));
}

#[test]
fn test_custom_naming_options() {
    let translator = Translator::new(TranslateOptions {
        derived_table_prefix: "d".to_string(),
        suffix_separator: "__".to_string(),
    });

    let nested = Query::new(RelExpr::project(
        RelExpr::project(table("X", &[("A", ScalarKind::Int32)]), vec![col("X", "A")]),
        vec![col("X", "A")],
    ));
    assert_eq!(
        translator.translate(&nested).unwrap().sql,
        r#"SELECT "d1"."A" AS "A" FROM (SELECT "X"."A" AS "A" FROM "X" AS "X") AS "d1""#
    );

    let names: Vec<String> = translator
        .translate(&cross_join_query())
        .unwrap()
        .columns
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["A", "A__1"]);
}

#[test]
fn test_translation_is_deterministic() {
    let query = cross_join_query();
    let translator = Translator::default();

    let first = translator.translate(&query).unwrap();
    let second = translator.translate(&query).unwrap();
    assert_eq!(first, second);

    let (translator, query) = (&translator, &query);
    let from_threads: Vec<TranslatedCommand> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(move || translator.translate(query).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    for command in from_threads {
        assert_eq!(command, first);
    }
}

#[test]
fn test_non_finite_literal_survives_json_input() {
    let query = Query::new(RelExpr::project(
        table("X", &[("A", ScalarKind::Int32)]),
        vec![Projection::Aliased {
            expr: ScalarExpr::literal(Value::Float(f64::NAN), ScalarKind::Float64),
            alias: "n".to_string(),
        }],
    ));
    let parsed: Query = serde_json::from_str(&serde_json::to_string(&query).unwrap()).unwrap();

    let direct = translate(&query).unwrap();
    let round_tripped = translate(&parsed).unwrap();

    assert_eq!(
        direct.sql,
        r#"SELECT CAST('NaN' AS DOUBLE) AS "n" FROM "X" AS "X""#
    );
    assert_eq!(round_tripped, direct);
    assert_eq!(query.fingerprint(), parsed.fingerprint());
}

#[test]
fn test_query_from_json() {
    let json = r#"{
        "root": {
            "op": "Project",
            "input": {
                "op": "Source",
                "table": "events",
                "variable": "e",
                "columns": [
                    {"name": "at", "kind": "TimestampTz"},
                    {"name": "level", "kind": "Int8"}
                ]
            },
            "projections": [
                {"type": "Property", "target": {"type": "Variable", "name": "e"}, "name": "at"},
                {"expr": {"type": "Property", "target": {"type": "Variable", "name": "e"}, "name": "level"}, "alias": "lvl"}
            ]
        }
    }"#;
    let query: Query = serde_json::from_str(json).unwrap();

    let command = translate(&query).unwrap();

    assert_eq!(
        command.sql,
        r#"SELECT "e"."at" AS "at", "e"."level" AS "lvl" FROM "events" AS "e""#
    );
    assert_eq!(
        command.result_type_overrides,
        Some(vec![
            Some(ResultTypeOverride::TimestampWithTimeZone),
            Some(ResultTypeOverride::SignedByte),
        ])
    );
}
