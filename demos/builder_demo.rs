// Builder demonstration
// Constructs a filter in code and prints its canonical JSON

use chrono::NaiveDate;
use cql2_filter::{
    encoder, And, Between, BoundingBox, Filter, In, Interval, Not, Operand, Property,
    SpatialComparison, SpatialOp, TemporalComparison, TemporalOp,
};

fn main() {
    println!("CQL2 Filter Builder Demo\n");
    println!("========================\n");

    let Some(start) = NaiveDate::from_ymd_opt(2024, 1, 1) else {
        eprintln!("invalid start date");
        return;
    };

    let depth = Between {
        value: Operand::new(Property::new("depth")),
        low: Operand::new(10.0),
        high: Operand::new(250.5),
    };

    let zone = In {
        item: Operand::new(Property::new("zone")),
        list: vec![Operand::new("R1"), Operand::new("R2")],
    };

    let area = SpatialComparison {
        op: SpatialOp::Within,
        left: Operand::new(Property::new("geometry")),
        right: Operand::new(BoundingBox::Planar([-10.0, 40.0, 5.0, 52.5])),
    };

    let recent = TemporalComparison {
        op: TemporalOp::During,
        left: Operand::new(Property::new("observed")),
        right: Operand::new(Interval::starting(Operand::new(start))),
    };

    let filter = Filter::new(
        And::new(Operand::new(depth), Operand::new(zone))
            .with(Operand::new(area))
            .with(Operand::new(recent))
            .with(Operand::new(Not {
                arg: Operand::new(false),
            })),
    );

    println!("Compact:\n  {}\n", filter);

    match encoder::to_string_pretty(filter.expression()) {
        Ok(json) => println!("Pretty:\n{}\n", json),
        Err(e) => println!("  Error: {}\n", e),
    }

    match filter.to_json_string().map(|json| json.parse::<Filter>()) {
        Ok(Ok(decoded)) => println!("Round trip equal: {}", decoded == filter),
        Ok(Err(e)) => println!("  Decode error: {}", e),
        Err(e) => println!("  Encode error: {}", e),
    }
}
