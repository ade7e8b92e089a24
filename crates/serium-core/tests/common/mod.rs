//! Shared record type fixtures for the integration tests.
#![allow(dead_code)]

use anyhow::Context;
use serium_core::{FieldDescriptor as F, Record, RecordType, RecordTypeBuilder, TypeRegistry, Value};
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test output when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn add(registry: &mut TypeRegistry, builder: RecordTypeBuilder) {
    registry.register(builder.build().unwrap()).unwrap();
}

fn long(record: &Record, field: &str) -> anyhow::Result<i64> {
    record
        .get(field)?
        .as_long()
        .with_context(|| format!("{field} is not an integer"))
}

/// Types with version history: tags, migrations, nested and self-referencing
/// records, subtypes.
pub fn versioned_registry() -> TypeRegistry {
    init_tracing();
    let mut r = TypeRegistry::new();

    add(
        &mut r,
        RecordType::builder("MyClass")
            .version(5)
            .field("x", F::int())
            .field("y", F::string()),
    );
    add(
        &mut r,
        RecordType::builder("ParentClass")
            .version(7)
            .field("some_int", F::int())
            .field("nested", F::record("MyClass")),
    );
    add(&mut r, RecordType::builder("AnotherClass").field("x", F::int()));

    add(
        &mut r,
        RecordType::builder("SuperType")
            .field("super_value", F::int())
            .field("request_type", F::subtype_key("details"))
            .field("details", F::subtype_value("request_type")),
    );
    add(
        &mut r,
        RecordType::builder("SubType")
            .version(2)
            .field("x", F::int())
            .field("y", F::int()),
    );

    // A: v1 (x: int, y: long) -> v2 (x: long, y: long) -> v3 (a, doubled)
    add(
        &mut r,
        RecordType::builder("A__v1")
            .field("x", F::int())
            .field("y", F::long()),
    );
    add(
        &mut r,
        RecordType::builder("A__v2")
            .version(2)
            .field("x", F::long())
            .field("y", F::long())
            .migration(1, |old, ctx| {
                Ok(ctx.create(
                    "A__v2",
                    vec![Value::Long(long(old, "x")?), old.get("y")?.clone()],
                )?)
            }),
    );
    add(
        &mut r,
        RecordType::builder("A")
            .version(3)
            .field("a", F::long())
            .field("doubled", F::long())
            .migration(2, |old, ctx| {
                Ok(ctx.create(
                    "A",
                    vec![old.get("x")?.clone(), Value::Long(long(old, "y")? * 2)],
                )?)
            }),
    );

    add(
        &mut r,
        RecordType::builder("B")
            .field("my_value", F::int())
            .field("my_a", F::record("A")),
    );
    add(
        &mut r,
        RecordType::builder("C__v1")
            .field("val1", F::int())
            .field("my_a", F::record("A")),
    );
    add(
        &mut r,
        RecordType::builder("C")
            .version(2)
            .field("val1", F::int())
            .field("my_b", F::record("B"))
            .migration(1, |old, ctx| {
                let b = ctx.create("B", vec![Value::Int(500), old.get("my_a")?.clone()])?;
                Ok(ctx.create("C", vec![old.get("val1")?.clone(), b.into()])?)
            }),
    );

    add(
        &mut r,
        RecordType::builder("T__v1")
            .field("a", F::int())
            .field("b", F::int()),
    );
    add(
        &mut r,
        RecordType::builder("T")
            .version(2)
            .field("s1", F::string())
            .field("s2", F::string())
            .migration(1, |old, ctx| {
                Ok(ctx
                    .build("T")?
                    .set("s1", format!("a was {}", long(old, "a")?))
                    .set("s2", format!("b was {}", long(old, "b")?))
                    .build()?)
            }),
    );
    add(
        &mut r,
        RecordType::builder("TTag")
            .field("a", F::int())
            .field("b", F::int()),
    );

    add(
        &mut r,
        RecordType::builder("MyCaseClassWithList").field("l", F::list(F::record("A"))),
    );

    add(
        &mut r,
        RecordType::builder("MyTreeNode__v1")
            .field("value", F::int())
            .field("children", F::list(F::self_ref())),
    );
    add(
        &mut r,
        RecordType::builder("MyTreeNode")
            .version(2)
            .field("value", F::int())
            .field("name", F::string())
            .field("children", F::list(F::self_ref()))
            .migration(1, |old, ctx| {
                Ok(ctx.create(
                    "MyTreeNode",
                    vec![
                        old.get("value")?.clone(),
                        "noname".into(),
                        old.get("children")?.clone(),
                    ],
                )?)
            }),
    );

    add(
        &mut r,
        RecordType::builder("TwoWayMigrationData__v1")
            .field("x1", F::int())
            .field("x2", F::int())
            .migration(2, |new, ctx| {
                Ok(ctx.create(
                    "TwoWayMigrationData__v1",
                    vec![new.get("y1")?.clone(), new.get("y2")?.clone()],
                )?)
            }),
    );
    add(
        &mut r,
        RecordType::builder("TwoWayMigrationData")
            .version(2)
            .field("y1", F::int())
            .field("y2", F::int())
            .field("s", F::int())
            .migration(1, |old, ctx| {
                let sum = i32::try_from(long(old, "x1")? + long(old, "x2")?)?;
                Ok(ctx.create(
                    "TwoWayMigrationData",
                    vec![old.get("x1")?.clone(), old.get("x2")?.clone(), sum.into()],
                )?)
            }),
    );

    add(
        &mut r,
        RecordType::builder("WithDict__v1")
            .field("val", F::int())
            .field("d", F::dict(F::string(), F::any())),
    );
    add(
        &mut r,
        RecordType::builder("WithDict")
            .version(2)
            .field("val", F::int())
            .field("d", F::dict(F::string(), F::any()))
            .field("x", F::int())
            .migration(1, |old, ctx| {
                let d = old.get("d")?;
                let x = d
                    .as_dict()
                    .and_then(|entries| entries.get(&Value::from("x")))
                    .cloned()
                    .context("d has no x entry")?;
                Ok(ctx.create("WithDict", vec![old.get("val")?.clone(), d.clone(), x])?)
            }),
    );

    r.check_references().unwrap();
    r
}

/// Unversioned plain types for construction and round-trip tests.
pub fn plain_registry() -> TypeRegistry {
    init_tracing();
    let mut r = TypeRegistry::new();

    add(
        &mut r,
        RecordType::builder("A")
            .field("a", F::int())
            .field("b", F::int())
            .field("c", F::int()),
    );
    // a newer shape of A with a defaulted field
    add(
        &mut r,
        RecordType::builder("A2")
            .field("a", F::int())
            .field("b", F::int())
            .field("c", F::int())
            .field_with_default("d", F::string(), "my_new_field_default_value"),
    );
    add(
        &mut r,
        RecordType::builder("A3")
            .field("a", F::int())
            .field("b", F::int())
            .field("c", F::int())
            .field("d", F::string()),
    );
    add(
        &mut r,
        RecordType::builder("B")
            .field("a", F::string())
            .field("b", F::string()),
    );
    add(
        &mut r,
        RecordType::builder("AllNativeTypes")
            .field("b", F::boolean())
            .field("i", F::int())
            .field("f", F::float())
            .field("s", F::string())
            .field("l", F::long()),
    );
    add(
        &mut r,
        RecordType::builder("S")
            .field("myint", F::int())
            .field("a_type", F::record("A"))
            .field("b_type", F::record("B")),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassWithLists")
            .field("myint", F::int())
            .field("list_of_ints", F::list(F::int()))
            .field("list_of_Ss", F::list(F::record("S"))),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassWithDict")
            .field("myint", F::int())
            .field("mydict", F::dict(F::string(), F::record("B"))),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassWithRecursiveReference")
            .field("myint", F::int())
            .field("mystring", F::string())
            .field("child", F::self_ref()),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassWithRecursiveRefInList")
            .field("value", F::int())
            .field("children", F::list(F::self_ref())),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassWithUUID").field("u", F::uuid()),
    );
    add(&mut r, RecordType::builder("Loose").field("x", F::any()));
    add(
        &mut r,
        RecordType::builder("Event")
            .field("at", F::timestamp())
            .field("on", F::date())
            .field("counts", F::dict(F::int(), F::long())),
    );

    add(
        &mut r,
        RecordType::builder("CaseClassSubType1")
            .field("subtype1_field1", F::int())
            .field("subtype1_field2", F::int()),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassSubType2")
            .field("subtype2_field1", F::int())
            .field("subtype2_field2", F::int()),
    );
    add(
        &mut r,
        RecordType::builder("CaseClassSuperType")
            .field("submessage_type", F::subtype_key("details"))
            .field("details", F::subtype_value("submessage_type")),
    );

    r.check_references().unwrap();
    r
}

pub fn ints(values: &[i32]) -> Vec<Value> {
    values.iter().map(|v| Value::Int(*v)).collect()
}
