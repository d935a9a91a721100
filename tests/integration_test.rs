// Integration tests for Decoder + Encoder
//
// These tests decode complete filter documents, check the typed tree, and
// verify that encoding reproduces the original document.

use cql2_filter::{
    decode, encode, And, Array, ArrayComparison, ArrayOp, BoundingBox, CaseInsensitive,
    Comparison, ComparisonOp, DecodeError, Decoder, DecoderConfig, ErrorKind, Expression, Filter,
    Function, Interval, IsNull, Like, Not, Operand, Or, Property, SpatialOp, TemporalComparison,
    TemporalOp,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{json, Value};

/// Decode `doc`, re-encode it, and require the output to be JSON-equal.
fn round_trip(doc: Value) -> Expression {
    let expr = decode(&doc.to_string()).unwrap_or_else(|e| panic!("decoding {}: {}", doc, e));
    let encoded: Value = serde_json::from_str(&encode(&expr).unwrap()).unwrap();
    assert_eq!(encoded, doc);
    expr
}

fn decode_err(doc: Value) -> DecodeError {
    decode(&doc.to_string()).expect_err("expected decoding to fail")
}

#[test]
fn test_logical_documents() {
    let expr = round_trip(json!({"op": "not", "args": [true]}));
    assert_eq!(
        expr,
        Expression::Not(Not {
            arg: Operand::new(true)
        })
    );

    let expr = round_trip(json!({"op": "and", "args": [true, false]}));
    assert_eq!(
        expr,
        Expression::And(And::new(Operand::new(true), Operand::new(false)))
    );

    round_trip(json!({"op": "or", "args": [false, true]}));
    round_trip(json!({
        "op": "or",
        "args": [true, {"op": "and", "args": [true, false]}]
    }));
    round_trip(json!({"op": "and", "args": [true, false, true, false]}));
}

#[test]
fn test_comparison_documents() {
    let expr = round_trip(json!({"op": "=", "args": [{"property": "city"}, "Pleasantville"]}));
    assert_eq!(
        expr,
        Expression::Comparison(Comparison::new(
            ComparisonOp::Equals,
            Operand::new(Property::new("city")),
            Operand::new("Pleasantville"),
        ))
    );

    round_trip(json!({"op": "<", "args": [{"property": "population"}, 123456]}));
    round_trip(json!({"op": "=", "args": [{"property": "sunny"}, true]}));
    round_trip(json!({"op": ">", "args": [{"property": "income"}, 100000.5]}));
    round_trip(json!({"op": "<>", "args": [{"property": "news"}, false]}));
    round_trip(json!({"op": ">=", "args": [{"property": "recreation"}, {"property": "work"}]}));
    round_trip(json!({"op": "<=", "args": [{"property": "depth"}, -12]}));
    round_trip(json!({"op": "between", "args": [{"property": "depth"}, 100, 150]}));
    round_trip(json!({"op": "isNull", "args": [{"property": "geometry"}]}));
    round_trip(json!({"op": "in", "args": [{"property": "cityName"}, ["Toronto", "Frankfurt", "Tokyo"]]}));
}

#[test]
fn test_exponent_numbers_decode_to_the_same_tree() {
    let a = decode(r#"{"op": ">", "args": [{"property": "income"}, 1e5]}"#).unwrap();
    let b = decode(r#"{"op": ">", "args": [{"property": "income"}, 100000]}"#).unwrap();
    assert_eq!(a, b);
    assert_eq!(encode(&a).unwrap(), r#"{"op":">","args":[{"property":"income"},100000]}"#);
}

#[test]
fn test_character_documents() {
    round_trip(json!({"op": "=", "args": ["foo", "bar"]}));

    let expr = round_trip(json!({
        "op": "=",
        "args": [{"property": "soup"}, {"op": "casei", "args": ["chicken"]}]
    }));
    let Expression::Comparison(cmp) = expr else {
        panic!("expected comparison");
    };
    assert_eq!(
        cmp.right.expression(),
        &Expression::CaseInsensitive(CaseInsensitive {
            value: Operand::new("chicken")
        })
    );

    round_trip(json!({
        "op": "=",
        "args": [{"property": "soup"}, {"op": "accenti", "args": ["Chícken"]}]
    }));

    let expr = round_trip(json!({
        "op": "like",
        "args": [
            {"op": "casei", "args": [{"property": "name"}]},
            {"op": "casei", "args": ["park%"]}
        ]
    }));
    assert!(matches!(expr, Expression::Like(Like { .. })));
}

#[test]
fn test_array_documents() {
    let expr = round_trip(json!({
        "op": "a_containedBy",
        "args": [{"property": "array1"}, {"property": "array2"}]
    }));
    assert_eq!(
        expr,
        Expression::ArrayComparison(ArrayComparison {
            op: ArrayOp::ContainedBy,
            left: Operand::new(Property::new("array1")),
            right: Operand::new(Property::new("array2")),
        })
    );

    let expr = round_trip(json!({
        "op": "a_contains",
        "args": [{"property": "array"}, ["foo", 42, false]]
    }));
    let Expression::ArrayComparison(cmp) = expr else {
        panic!("expected array comparison");
    };
    assert_eq!(
        cmp.right.expression(),
        &Expression::Array(Array::new(vec![
            Operand::new("foo"),
            Operand::new(42.0),
            Operand::new(false),
        ]))
    );

    round_trip(json!({"op": "a_equals", "args": [{"property": "array"}, [{"bbox": [4, 3, 2, 1]}]]}));
    round_trip(json!({"op": "a_overlaps", "args": [{"property": "food"}, ["raddish", "turnip"]]}));
    round_trip(json!({"op": "a_equals", "args": [{"property": "matrix"}, [[1, 2], [3, 4]]]}));
}

#[test]
fn test_spatial_documents() {
    let expr = round_trip(json!({
        "op": "s_contains",
        "args": [{"bbox": [-180, -90, 180, 90]}, {"property": "geometry"}]
    }));
    let Expression::SpatialComparison(cmp) = expr else {
        panic!("expected spatial comparison");
    };
    assert_eq!(cmp.op, SpatialOp::Contains);
    assert_eq!(
        cmp.left.expression(),
        &Expression::BoundingBox(BoundingBox::Planar([-180.0, -90.0, 180.0, 90.0]))
    );

    for op in SpatialOp::ALL {
        round_trip(json!({
            "op": op.as_str(),
            "args": [
                {"property": "geometry"},
                {"type": "Point", "coordinates": [-105.1019, 40.1672]}
            ]
        }));
    }

    round_trip(json!({
        "op": "s_intersects",
        "args": [
            {"property": "geometry"},
            {"bbox": [0, 0, -10, 10, 10, 100.5]}
        ]
    }));
    round_trip(json!({
        "op": "s_within",
        "args": [
            {"property": "geometry"},
            {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Point", "coordinates": [0, 0]},
                    {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}
                ]
            }
        ]
    }));
}

#[test]
fn test_geometry_keeps_member_order() {
    let text = r#"{"op":"s_equals","args":[{"property":"geometry"},{"coordinates":[[[0,0],[1,0],[1,1],[0,0]]],"type":"Polygon"}]}"#;
    let expr = decode(text).unwrap();
    assert_eq!(encode(&expr).unwrap(), text);
}

#[test]
fn test_temporal_documents() {
    let expr = round_trip(json!({"op": "=", "args": [{"property": "date"}, {"date": "2020-01-01"}]}));
    let Expression::Comparison(cmp) = expr else {
        panic!("expected comparison");
    };
    assert_eq!(
        cmp.right.expression(),
        &Expression::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap())
    );

    let expr = round_trip(json!({
        "op": "=",
        "args": [{"property": "datetime"}, {"timestamp": "2023-02-26T23:53:29.882Z"}]
    }));
    let Expression::Comparison(cmp) = expr else {
        panic!("expected comparison");
    };
    let expected = Utc.with_ymd_and_hms(2023, 2, 26, 23, 53, 29).unwrap()
        + chrono::Duration::milliseconds(882);
    assert_eq!(cmp.right.expression(), &Expression::Timestamp(expected));

    let expr = round_trip(json!({
        "op": "t_equals",
        "args": [
            {"op": "later", "args": [{"property": "datetime"}, "1 month"]},
            {"date": "2020-01-01"}
        ]
    }));
    let Expression::TemporalComparison(cmp) = expr else {
        panic!("expected temporal comparison");
    };
    assert_eq!(
        cmp.left.expression(),
        &Expression::Function(Function::new(
            "later",
            vec![Expression::property("datetime"), Expression::string("1 month")]
        ))
    );

    for op in TemporalOp::ALL {
        round_trip(json!({
            "op": op.as_str(),
            "args": [
                {"interval": [{"property": "start0"}, {"property": "end0"}]},
                {"interval": ["2020-01-01", "2020-12-31T23:59:59Z"]}
            ]
        }));
    }
}

#[test]
fn test_timestamp_fractions_round_trip() {
    for text in [
        "2020-01-01T00:00:00.5Z",
        "2020-01-01T00:00:00.123456Z",
        "2020-01-01T00:00:00.000000001Z",
        "2020-01-01T00:00:00Z",
    ] {
        round_trip(json!({"op": "t_equals", "args": [{"property": "t"}, {"timestamp": text}]}));
        round_trip(json!({
            "op": "t_during",
            "args": [{"property": "t"}, {"interval": [text, ".."]}]
        }));
    }
}

#[test]
fn test_open_intervals() {
    let expr = round_trip(json!({
        "op": "t_during",
        "args": [{"property": "event"}, {"interval": ["..", "2021-06-30"]}]
    }));
    let end = NaiveDate::from_ymd_opt(2021, 6, 30).unwrap();
    assert_eq!(
        expr,
        Expression::TemporalComparison(TemporalComparison {
            op: TemporalOp::During,
            left: Operand::new(Property::new("event")),
            right: Operand::new(Interval::ending(Operand::new(end))),
        })
    );

    round_trip(json!({
        "op": "t_after",
        "args": [{"property": "event"}, {"interval": ["2021-01-01T00:00:00Z", ".."]}]
    }));
    round_trip(json!({
        "op": "t_intersects",
        "args": [{"property": "event"}, {"interval": [{"op": "now", "args": []}, ".."]}]
    }));

    round_trip(json!({
        "op": "t_overlaps",
        "args": [
            {"property": "event"},
            {"interval": ["2021-01-01T08:30:00.5Z", "2021-01-01T09:00:00.123456Z"]}
        ]
    }));

    let err = decode_err(json!({
        "op": "t_after",
        "args": [{"property": "event"}, {"interval": ["..", ".."]}]
    }));
    assert_eq!(err.kind(), ErrorKind::Structural);
}

#[test]
fn test_function_documents() {
    let expr = round_trip(json!({
        "op": "=",
        "args": [{"op": "testing", "args": [1, 2, 3]}, true]
    }));
    let Expression::Comparison(cmp) = expr else {
        panic!("expected comparison");
    };
    let Expression::Function(function) = cmp.left.expression() else {
        panic!("expected function");
    };
    assert_eq!(function.op, "testing");
    assert_eq!(function.args.len(), 3);

    round_trip(json!({"op": "=", "args": [{"op": "agreeable", "args": []}, false]}));

    // the nested form is not accepted
    let err = decode_err(json!({
        "op": "=",
        "args": [{"function": {"name": "agreeable"}}, false]
    }));
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn test_error_taxonomy() {
    let cases = [
        (json!(null), ErrorKind::Shape),
        (json!({"op": "between", "args": [1, 2]}), ErrorKind::Arity),
        (json!({"op": "or", "args": [true]}), ErrorKind::Arity),
        (json!({"op": "not", "args": ["yes"]}), ErrorKind::Capability),
        (json!({"op": "between", "args": [{"property": "a"}, "low", 2]}), ErrorKind::Capability),
        (json!({"op": "s_within", "args": [{"property": "a"}, {"date": "2020-01-01"}]}), ErrorKind::Capability),
        (json!({"op": "t_after", "args": [{"property": "a"}, {"bbox": [0, 0, 1, 1]}]}), ErrorKind::Capability),
        (json!({"op": "a_equals", "args": [{"property": "a"}, "x"]}), ErrorKind::Capability),
        (json!({"op": "=", "args": [{"property": "a"}, {"interval": ["2020-01-01", ".."]}]}), ErrorKind::Capability),
        (json!({"date": "01/02/2020"}), ErrorKind::Format),
        (json!({"timestamp": "2020-01-01"}), ErrorKind::Format),
        (json!({"bbox": [1, 2, 3]}), ErrorKind::Format),
        (json!({"type": "Polygon", "coordinates": "none"}), ErrorKind::Structural),
        (json!({"interval": ["2020-01-01"]}), ErrorKind::Structural),
    ];

    for (doc, kind) in cases {
        let err = decode_err(doc.clone());
        assert_eq!(err.kind(), kind, "{} -> {}", doc, err);
    }
}

#[test]
fn test_error_messages_locate_the_fault() {
    let err = decode_err(json!({
        "op": "and",
        "args": [
            true,
            {"op": "like", "args": [{"property": "name"}, 5]}
        ]
    }));
    assert_eq!(
        err.to_string(),
        "trouble decoding arg 1 for \"and\" op: expected arg 1 of \"like\" op to be a pattern expression"
    );
}

#[test]
fn test_literal_bboxes_are_spatial_only() {
    let err = decode_err(json!({"op": "=", "args": [{"property": "a"}, {"bbox": [0, 0, 1, 1]}]}));
    assert!(matches!(
        err,
        DecodeError::Capability { index: 1, .. }
    ));
}

#[test]
fn test_depth_limit_rejects_deep_documents() {
    let mut doc = json!(true);
    for _ in 0..300 {
        doc = json!({"op": "not", "args": [doc]});
    }

    let err = decode(&doc.to_string()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Depth);

    let decoder = Decoder::new(DecoderConfig { max_depth: 1000 });
    assert!(decoder.decode(&doc).is_ok());
}

#[test]
fn test_filter_documents() {
    let filter: Filter = r#"{"op": "or", "args": [{"op": "isNull", "args": [{"property": "a"}]}, false]}"#
        .parse()
        .unwrap();
    assert_eq!(
        filter.expression(),
        &Expression::Or(Or::new(
            Operand::new(IsNull::new(Property::new("a"))),
            Operand::new(false),
        ))
    );

    let err = "42".parse::<Filter>().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capability);
}

#[test]
fn test_programmatic_trees_encode_canonically() {
    let day = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
    let filter = Filter::new(
        And::new(
            Operand::new(Like {
                value: Operand::new(Property::new("name")),
                pattern: Operand::new("Main%"),
            }),
            Operand::new(TemporalComparison {
                op: TemporalOp::After,
                left: Operand::new(Property::new("updated")),
                right: Operand::new(day),
            }),
        )
        .with(Operand::new(Not {
            arg: Operand::new(false),
        })),
    );

    let json = filter.to_json_string().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&json).unwrap(),
        json!({
            "op": "and",
            "args": [
                {"op": "like", "args": [{"property": "name"}, "Main%"]},
                {"op": "t_after", "args": [{"property": "updated"}, {"date": "2021-04-01"}]},
                {"op": "not", "args": [false]}
            ]
        })
    );

    let decoded: Filter = json.parse().unwrap();
    assert_eq!(decoded, filter);
}

#[test]
fn test_decoder_config_from_file_contents() {
    let config: DecoderConfig = serde_json::from_str(r#"{"max_depth": 4}"#).unwrap();
    let decoder = Decoder::new(config);
    assert_eq!(decoder.config().max_depth, 4);

    let err = decoder
        .decode_str(r#"{"op":"not","args":[{"op":"not","args":[{"op":"not","args":[{"op":"not","args":[{"op":"not","args":[true]}]}]}]}]}"#)
        .unwrap_err();
    assert!(matches!(err, DecodeError::Operand { .. }));
    assert_eq!(err.kind(), ErrorKind::Depth);
}
