//! Fields whose record type is named by a sibling field.

mod common;

use serde_json::json;
use serium_core::{
    DeserializationContext, Record, SeriumEnv, SeriumError, TypeRegistry, Value, WireMap,
    cc_from_dict, cc_from_json_str, cc_to_dict, cc_to_json_str,
};

fn sub1(registry: &TypeRegistry, f1: i32, f2: i32) -> Record {
    registry
        .create("CaseClassSubType1", common::ints(&[f1, f2]))
        .unwrap()
}

fn sub2(registry: &TypeRegistry, f1: i32, f2: i32) -> Record {
    registry
        .create("CaseClassSubType2", common::ints(&[f1, f2]))
        .unwrap()
}

fn super_type(registry: &TypeRegistry, key: &str, details: Record) -> Result<Record, SeriumError> {
    registry.create("CaseClassSuperType", vec![key.into(), details.into()])
}

fn wire(value: serde_json::Value) -> WireMap {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("not an object: {other}"),
    }
}

#[test]
fn test_subtype_round_trip() {
    let registry = common::plain_registry();
    let first = super_type(&registry, "CaseClassSubType1", sub1(&registry, 1, 2)).unwrap();
    let second = super_type(&registry, "CaseClassSubType2", sub2(&registry, 3, 4)).unwrap();

    assert_eq!(
        serde_json::Value::Object(cc_to_dict(&first).unwrap()),
        json!({
            "submessage_type": "CaseClassSubType1",
            "details": {
                "subtype1_field1": 1,
                "subtype1_field2": 2,
                "_ccvt": "CaseClassSubType1/1"
            },
            "_ccvt": "CaseClassSuperType/1"
        })
    );

    for record in [first, second] {
        let text = cc_to_json_str(&record).unwrap();
        assert_eq!(
            cc_from_json_str(&registry, &text, "CaseClassSuperType").unwrap(),
            record
        );
    }
}

#[test]
fn test_subtype_creation_checks_the_named_type() {
    let registry = common::plain_registry();

    let err = super_type(&registry, "CaseClassSubType2", sub1(&registry, 1, 2)).unwrap_err();
    assert!(matches!(err, SeriumError::UnexpectedFieldType { field, .. } if field == "details"));

    let err = super_type(&registry, "NoSuchType", sub1(&registry, 1, 2)).unwrap_err();
    assert!(matches!(err, SeriumError::SubtypeNotFound { name, .. } if name == "NoSuchType"));
}

#[test]
fn test_untagged_subtype_with_relaxed_context() {
    let registry = common::plain_registry();
    let env = SeriumEnv::default().with_deserialization(
        DeserializationContext::default().with_fail_on_unversioned_data(false),
    );
    let data = wire(json!({
        "submessage_type": "CaseClassSubType1",
        "details": {"subtype1_field1": 1, "subtype1_field2": 2}
    }));

    let got = env.cc_from_dict(&registry, data, "CaseClassSuperType").unwrap();
    assert_eq!(
        got,
        super_type(&registry, "CaseClassSubType1", sub1(&registry, 1, 2)).unwrap()
    );
}

#[test]
fn test_subtype_tag_must_match_key() {
    let registry = common::plain_registry();
    let data = wire(json!({
        "submessage_type": "CaseClassSubType1",
        "details": {
            "subtype2_field1": 1,
            "subtype2_field2": 2,
            "_ccvt": "CaseClassSubType2/1"
        },
        "_ccvt": "CaseClassSuperType/1"
    }));

    let err = cc_from_dict(&registry, data, "CaseClassSuperType").unwrap_err();
    assert!(matches!(err, SeriumError::IncompatibleTypes { .. }));
}

#[test]
fn test_unknown_subtype_name_on_wire() {
    let registry = common::plain_registry();
    let data = wire(json!({
        "submessage_type": "CaseClassSubType3",
        "details": {"subtype3_field1": 1, "_ccvt": "CaseClassSubType3/1"},
        "_ccvt": "CaseClassSuperType/1"
    }));

    let err = cc_from_dict(&registry, data, "CaseClassSuperType").unwrap_err();
    assert!(
        matches!(err, SeriumError::SubtypeNotFound { name, key_field } if name == "CaseClassSubType3" && key_field == "submessage_type")
    );
}

#[test]
fn test_missing_and_empty_subtype_values() {
    let registry = common::plain_registry();

    let missing = wire(json!({
        "submessage_type": "CaseClassSubType1",
        "_ccvt": "CaseClassSuperType/1"
    }));
    let err = cc_from_dict(&registry, missing, "CaseClassSuperType").unwrap_err();
    assert!(matches!(err, SeriumError::Creation(_)));

    let empty = wire(json!({
        "submessage_type": "CaseClassSubType1",
        "details": {},
        "_ccvt": "CaseClassSuperType/1"
    }));
    let err = cc_from_dict(&registry, empty, "CaseClassSuperType").unwrap_err();
    assert!(matches!(err, SeriumError::MissingVersionData { .. }));
}

#[test]
fn test_null_subtype_value() {
    let registry = common::plain_registry();
    let data = || {
        wire(json!({
            "submessage_type": "CaseClassSubType1",
            "details": null,
            "_ccvt": "CaseClassSuperType/1"
        }))
    };

    let got = cc_from_dict(&registry, data(), "CaseClassSuperType").unwrap();
    assert!(got.get("details").unwrap().is_null());

    let strict = SeriumEnv::default().with_deserialization(
        DeserializationContext::default().with_fail_on_null_subtypes(true),
    );
    let err = strict
        .cc_from_dict(&registry, data(), "CaseClassSuperType")
        .unwrap_err();
    assert!(matches!(err, SeriumError::SubtypeCannotBeNull { field } if field == "details"));
}

#[test]
fn test_versioned_subtype() {
    let registry = common::versioned_registry();
    let sub = registry
        .create("SubType", vec![Value::Int(1), Value::Int(2)])
        .unwrap();
    let sup = registry
        .create("SuperType", vec![Value::Int(10), "SubType".into(), sub.into()])
        .unwrap();

    let d = cc_to_dict(&sup).unwrap();
    assert_eq!(
        serde_json::Value::Object(d.clone()),
        json!({
            "super_value": 10,
            "request_type": "SubType",
            "details": {"x": 1, "y": 2, "_ccvt": "SubType/2"},
            "_ccvt": "SuperType/1"
        })
    );
    assert_eq!(cc_from_dict(&registry, d, "SuperType").unwrap(), sup);
}

#[test]
fn test_versioned_subtype_from_unknown_version() {
    let registry = common::versioned_registry();
    let data = wire(json!({
        "super_value": 10,
        "request_type": "SubType",
        "details": {"x": 1, "y": 2, "_ccvt": "SubType/5"},
        "_ccvt": "SuperType/1"
    }));

    let err = cc_from_dict(&registry, data, "SuperType").unwrap_err();
    assert!(matches!(err, SeriumError::VersionNotFound { ccvt } if ccvt.to_string() == "SubType/5"));
}
