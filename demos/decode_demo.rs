// Decoder demonstration
// Decodes a few filter documents and prints the tree or the error

use cql2_filter::{Decoder, DecoderConfig, ErrorKind};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("CQL2 Filter Decoder Demo\n");
    println!("========================\n");

    let decoder = Decoder::new(DecoderConfig::default());

    let documents = [
        ("Simple comparison", r#"{"op": "=", "args": [{"property": "city"}, "Pleasantville"]}"#),
        (
            "Case-insensitive match",
            r#"{"op": "like", "args": [{"op": "casei", "args": [{"property": "name"}]}, "park%"]}"#,
        ),
        (
            "Open interval",
            r#"{"op": "t_during", "args": [{"property": "built"}, {"interval": ["..", "1950-12-31"]}]}"#,
        ),
        (
            "Extension function",
            r#"{"op": "s_intersects", "args": [{"op": "buffer", "args": [{"property": "geometry"}, 10]}, {"bbox": [0, 0, 1, 1]}]}"#,
        ),
        ("Wrong arg count", r#"{"op": "between", "args": [{"property": "depth"}, 1]}"#),
        ("Wrong operand type", r#"{"op": "and", "args": [true, {"property": "flag"}]}"#),
        ("Bad date", r#"{"op": "=", "args": [{"property": "d"}, {"date": "2020-02-30"}]}"#),
    ];

    for (i, (title, json)) in documents.iter().enumerate() {
        println!("Example {}: {}", i + 1, title);
        println!("  input:  {}", json);
        match decoder.decode_str(json) {
            Ok(expr) => {
                println!("  output: {}", expr);
                println!("  tree:   {:?}\n", expr);
            }
            Err(e) => {
                let kind = match e.kind() {
                    ErrorKind::Shape => "shape",
                    ErrorKind::Arity => "arity",
                    ErrorKind::Capability => "capability",
                    ErrorKind::Format => "format",
                    ErrorKind::Structural => "structural",
                    ErrorKind::Depth => "depth",
                    ErrorKind::Json => "json",
                };
                println!("  {} error: {}\n", kind, e);
            }
        }
    }
}
