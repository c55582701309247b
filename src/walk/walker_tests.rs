//! Integration tests for the walker engine: event ordering, separator
//! counts, composite-vs-reference dispatch, and failure semantics.

use std::rc::Rc;

use crate::error::TypewalkError;
use crate::introspect::RecordIntrospector;
use crate::model::registry::{TypeModel, STD_MODEL};
use crate::value::{EnumValue, OpaqueValue, Primitive, Record, Value};
use crate::walk::walker::{WalkConfig, WalkHandlers, WalkInfo, Walker};

fn test_model() -> TypeModel {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut model = TypeModel::new();
    model.register_from_str(STD_MODEL).unwrap();
    model
        .register_from_str(
            r#"
            namespace app {
                primitive Uuid
                enum Colour
                datatype Base {
                    composite-val id : String
                    reference-var other : Base
                }
                datatype Sub : Base {
                    composite-var id : String
                    composite-var child : Base
                    dis secret : String
                }
                datatype Holder {
                    reference-var friends : std.collections.List<Base>
                    composite-var kids : std.collections.List<Base>
                }
            }
            "#,
        )
        .unwrap();
    model.resolve_all().unwrap();
    model
}

/// Handlers that log every event name (with a detail where useful) into the
/// accumulator.
fn logging_handlers() -> WalkHandlers<(), Vec<String>> {
    fn push(mut acc: Vec<String>, event: String) -> WalkInfo<(), Vec<String>> {
        acc.push(event);
        WalkInfo::new((), acc)
    }
    WalkHandlers {
        object_begin: Box::new(|_, info, _, dt| push(info.acc, format!("objectBegin({})", dt.name))),
        object_end: Box::new(|_, info, _, dt| push(info.acc, format!("objectEnd({})", dt.name))),
        property_begin: Box::new(|_, info, p| push(info.acc, format!("propertyBegin({})", p.name))),
        property_end: Box::new(|_, info, p| push(info.acc, format!("propertyEnd({})", p.name))),
        map_begin: Box::new(|_, info, _| push(info.acc, "mapBegin".to_string())),
        map_entry_key_begin: Box::new(|_, info, _| push(info.acc, "mapEntryKeyBegin".to_string())),
        map_entry_key_end: Box::new(|_, info, _| push(info.acc, "mapEntryKeyEnd".to_string())),
        map_entry_value_begin: Box::new(|_, info, _| {
            push(info.acc, "mapEntryValueBegin".to_string())
        }),
        map_entry_value_end: Box::new(|_, info, _| push(info.acc, "mapEntryValueEnd".to_string())),
        map_separate: Box::new(|_, info, _, _| push(info.acc, "mapSeparate".to_string())),
        map_end: Box::new(|_, info, _| push(info.acc, "mapEnd".to_string())),
        coll_begin: Box::new(|_, info, _, _| push(info.acc, "collBegin".to_string())),
        coll_element_begin: Box::new(|_, info, _| push(info.acc, "collElementBegin".to_string())),
        coll_element_end: Box::new(|_, info, _| push(info.acc, "collElementEnd".to_string())),
        coll_separate: Box::new(|_, info, _, _, _| push(info.acc, "collSeparate".to_string())),
        coll_end: Box::new(|_, info, _, _| push(info.acc, "collEnd".to_string())),
        reference: Box::new(|_, info, v, _| {
            push(info.acc, format!("reference({})", v.type_name()))
        }),
        primitive: Box::new(|_, info, p, _| push(info.acc, format!("primitive({})", p.type_name()))),
        enum_value: Box::new(|_, info, e| push(info.acc, format!("enum({})", e.literal))),
        null_value: Box::new(|_, info| push(info.acc, "null".to_string())),
    }
}

fn log_walk(model: &TypeModel, value: &Value) -> Vec<String> {
    let intro = RecordIntrospector::new(model);
    let walker = Walker::new(model, &intro, logging_handlers());
    walker.walk(WalkInfo::new((), Vec::new()), value).unwrap().acc
}

#[test]
fn object_event_ordering_follows_merged_declaration_order() {
    let model = test_model();
    let base = Record::new("Base").with("id", "b1").with("other", Value::Null);
    let sub = Record::new("Sub")
        .with("id", "s1")
        .with("other", Value::Null)
        .with("child", base.into_value())
        .with("secret", "hidden");

    let events = log_walk(&model, &sub.into_value());
    assert_eq!(
        events,
        vec![
            "objectBegin(Sub)",
            // 'id' keeps the supertype's position but is Sub's property
            "propertyBegin(id)",
            "primitive(String)",
            "propertyEnd(id)",
            "propertyBegin(other)",
            "null",
            "propertyEnd(other)",
            "propertyBegin(child)",
            "objectBegin(Base)",
            "propertyBegin(id)",
            "primitive(String)",
            "propertyEnd(id)",
            "propertyBegin(other)",
            "null",
            "propertyEnd(other)",
            "objectEnd(Base)",
            "propertyEnd(child)",
            // 'secret' is ignored: no events at all
            "objectEnd(Sub)",
        ]
    );
}

#[test]
fn inheritance_override_yields_single_merged_entry() {
    let model = test_model();
    let sub = model.find_datatype_for("Sub").unwrap();
    let merged = sub.all_explicit_properties(&model).unwrap();
    let names: Vec<&str> = merged.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["id", "other", "child", "secret"]);
    // the merged 'id' is the subtype's own declaration (composite-var, not
    // identity), not the supertype's composite-val
    let id = &merged["id"];
    assert!(!id.is_identity());
    assert!(id.is_composite);
    assert_eq!(id.owner, "app.Sub");
}

#[test]
fn reference_property_emits_one_event_without_nesting() {
    let model = test_model();
    let other = Record::new("Base").with("id", "b2").with("other", Value::Null);
    let base = Record::new("Base")
        .with("id", "b1")
        .with("other", other.into_value());

    let events = log_walk(&model, &base.into_value());
    assert_eq!(
        events,
        vec![
            "objectBegin(Base)",
            "propertyBegin(id)",
            "primitive(String)",
            "propertyEnd(id)",
            "propertyBegin(other)",
            "reference(Base)",
            "propertyEnd(other)",
            "objectEnd(Base)",
        ]
    );
    assert_eq!(
        events.iter().filter(|e| e.starts_with("objectBegin")).count(),
        1
    );
}

#[test]
fn reference_property_holding_collection_walks_shape_only() {
    let model = test_model();
    let b1 = Record::new("Base").with("id", "a").with("other", Value::Null);
    let b2 = Record::new("Base").with("id", "b").with("other", Value::Null);
    let holder = Record::new("Holder")
        .with("friends", Value::List(vec![b1.into_value(), b2.into_value()]))
        .with("kids", Value::List(vec![]));

    let events = log_walk(&model, &holder.into_value());
    assert_eq!(
        events,
        vec![
            "objectBegin(Holder)",
            "propertyBegin(friends)",
            // the collection shape is enumerated ...
            "collBegin",
            "collElementBegin",
            // ... but each element is still a reference, not a nested walk
            "reference(Base)",
            "collElementEnd",
            "collSeparate",
            "collElementBegin",
            "reference(Base)",
            "collElementEnd",
            "collEnd",
            "propertyEnd(friends)",
            "propertyBegin(kids)",
            "collBegin",
            "collEnd",
            "propertyEnd(kids)",
            "objectEnd(Holder)",
        ]
    );
}

#[test]
fn composite_collection_recurses_into_elements() {
    let model = test_model();
    let b1 = Record::new("Base").with("id", "a").with("other", Value::Null);
    let holder = Record::new("Holder")
        .with("friends", Value::List(vec![]))
        .with("kids", Value::List(vec![b1.into_value()]));

    let events = log_walk(&model, &holder.into_value());
    let nested: Vec<&String> = events
        .iter()
        .filter(|e| e.starts_with("objectBegin(Base)"))
        .collect();
    assert_eq!(nested.len(), 1);
}

#[test]
fn collection_separator_counts() {
    let model = test_model();
    for n in [0usize, 1, 2, 5] {
        let items: Vec<Value> = (0..n).map(|i| Value::from(i as i64)).collect();
        let events = log_walk(&model, &Value::List(items));
        let begins = events.iter().filter(|e| *e == "collElementBegin").count();
        let ends = events.iter().filter(|e| *e == "collElementEnd").count();
        let seps = events.iter().filter(|e| *e == "collSeparate").count();
        assert_eq!(begins, n);
        assert_eq!(ends, n);
        assert_eq!(seps, n.saturating_sub(1));
    }
}

#[test]
fn map_determinism_with_stringifying_handlers() {
    let model = test_model();
    let intro = RecordIntrospector::new(&model);
    let handlers = WalkHandlers::<(), String> {
        primitive: Box::new(|_, info, p, _| {
            let rendered = match p {
                Primitive::Int(n) => n.to_string(),
                Primitive::Str(s) => format!("'{s}'"),
                other => format!("{other:?}"),
            };
            WalkInfo::new((), format!("{}{}", info.acc, rendered))
        }),
        map_begin: Box::new(|_, info, _| WalkInfo::new((), format!("{}Map {{ ", info.acc))),
        map_entry_key_begin: Box::new(|_, info, _| WalkInfo::new((), format!("{}[", info.acc))),
        map_entry_key_end: Box::new(|_, info, _| WalkInfo::new((), format!("{}]", info.acc))),
        map_entry_value_begin: Box::new(|_, info, _| {
            WalkInfo::new((), format!("{} = ", info.acc))
        }),
        map_separate: Box::new(|_, info, _, _| WalkInfo::new((), format!("{}, ", info.acc))),
        map_end: Box::new(|_, info, _| WalkInfo::new((), format!("{} }}", info.acc))),
        ..WalkHandlers::default()
    };
    let walker = Walker::new(&model, &intro, handlers);
    let map = Value::Map(vec![
        (Value::from("a"), Value::from(1i64)),
        (Value::from("b"), Value::from(2i64)),
        (Value::from("c"), Value::from(3i64)),
    ]);
    let result = walker.walk(WalkInfo::new((), String::new()), &map).unwrap();
    assert_eq!(result.acc, "Map { ['a'] = 1, ['b'] = 2, ['c'] = 3 }");
}

#[test]
fn map_under_reference_property_treats_object_keys_as_references() {
    let mut model = test_model();
    model
        .register_from_str(
            r#"
            namespace app {
                datatype Index {
                    reference-var lookup : std.collections.Map<Base, String>
                }
            }
            "#,
        )
        .unwrap();
    let base = Record::new("Base").with("id", "k").with("other", Value::Null);
    let index = Record::new("Index").with(
        "lookup",
        Value::Map(vec![(base.into_value(), Value::from("v"))]),
    );

    let events = log_walk(&model, &index.into_value());
    assert!(events.contains(&"reference(Base)".to_string()));
    assert!(!events.contains(&"objectBegin(Base)".to_string()));
}

#[test]
fn root_map_with_object_keys_walks_them_fully() {
    let model = test_model();
    let base = Record::new("Base").with("id", "k").with("other", Value::Null);
    let map = Value::Map(vec![(base.into_value(), Value::from("v"))]);

    let events = log_walk(&model, &map);
    // the map is the traversal root: no owning property, keys walk as
    // full values
    assert!(events.contains(&"objectBegin(Base)".to_string()));
}

#[test]
fn enum_values_emit_enum_events() {
    let model = test_model();
    let events = log_walk(&model, &Value::Enum(EnumValue::new("Colour", "RED")));
    assert_eq!(events, vec!["enum(RED)"]);
}

#[test]
fn primitive_hook_receives_registered_mapper() {
    let mut model = test_model();
    model.register_primitive_mapper(crate::mappers::uuid_mapper());
    let intro = RecordIntrospector::new(&model);

    let handlers = WalkHandlers::<(), Option<String>> {
        primitive: Box::new(|_, info, p, mapper| {
            let raw = match (p, mapper) {
                (Primitive::Opaque(o), Some(m)) => match m.to_raw(o) {
                    Some(Primitive::Str(s)) => Some(s),
                    _ => None,
                },
                _ => None,
            };
            WalkInfo::new((), raw)
        }),
        ..WalkHandlers::default()
    };
    let walker = Walker::new(&model, &intro, handlers);

    let id = uuid::Uuid::new_v4();
    let value = Value::Primitive(Primitive::Opaque(OpaqueValue::new("Uuid", id)));
    let result = walker.walk(WalkInfo::new((), None), &value).unwrap();
    assert_eq!(result.acc, Some(id.to_string()));
}

#[test]
fn unknown_composite_child_aborts_with_partial_path() {
    let model = test_model();
    let ghost = Record::new("Ghost");
    let sub = Record::new("Sub")
        .with("id", "s")
        .with("other", Value::Null)
        .with("child", ghost.into_value())
        .with("secret", "x");

    let intro = RecordIntrospector::new(&model);
    let walker: Walker<(), ()> = Walker::new(&model, &intro, WalkHandlers::default());
    let err = walker
        .walk(WalkInfo::new((), ()), &sub.into_value())
        .unwrap_err();
    match err {
        TypewalkError::UnknownRuntimeType { type_name, path } => {
            assert_eq!(type_name, "Ghost");
            assert_eq!(path, vec!["child".to_string()]);
        }
        other => panic!("expected UnknownRuntimeType, got {other:?}"),
    }
}

#[test]
fn missing_field_aborts_as_property_access() {
    let model = test_model();
    // 'other' is declared but absent from the record
    let base = Record::new("Base").with("id", "b");
    let intro = RecordIntrospector::new(&model);
    let walker: Walker<(), ()> = Walker::new(&model, &intro, WalkHandlers::default());
    let err = walker
        .walk(WalkInfo::new((), ()), &base.into_value())
        .unwrap_err();
    assert!(matches!(err, TypewalkError::PropertyAccess { .. }));
}

#[test]
fn paths_use_configured_markers() {
    let model = test_model();
    let intro = RecordIntrospector::new(&model);
    let handlers = WalkHandlers::<(), Vec<String>> {
        coll_element_begin: Box::new(|path, info, _| {
            let mut acc = info.acc;
            acc.push(path.join("/"));
            WalkInfo::new((), acc)
        }),
        ..WalkHandlers::default()
    };
    let walker = Walker::new(&model, &intro, handlers).with_config(WalkConfig {
        elements: "items".to_string(),
        ..WalkConfig::default()
    });
    let list = Value::List(vec![Value::from(1i64), Value::from(2i64)]);
    let result = walker.walk(WalkInfo::new((), Vec::new()), &list).unwrap();
    assert_eq!(result.acc, vec!["items/0".to_string(), "items/1".to_string()]);
}

#[test]
fn property_paths_extend_with_property_names() {
    let model = test_model();
    let intro = RecordIntrospector::new(&model);
    let handlers = WalkHandlers::<(), Vec<String>> {
        property_begin: Box::new(|path, info, _| {
            let mut acc = info.acc;
            acc.push(path.join("/"));
            WalkInfo::new((), acc)
        }),
        ..WalkHandlers::default()
    };
    let walker = Walker::new(&model, &intro, handlers);
    let base = Record::new("Base").with("id", "b").with("other", Value::Null);
    let sub = Record::new("Sub")
        .with("id", "s")
        .with("other", Value::Null)
        .with("child", base.into_value())
        .with("secret", "x");
    let result = walker
        .walk(WalkInfo::new((), Vec::new()), &sub.into_value())
        .unwrap();
    assert_eq!(
        result.acc,
        vec![
            "id".to_string(),
            "other".to_string(),
            "child".to_string(),
            "child/id".to_string(),
            "child/other".to_string(),
        ]
    );
}

#[test]
fn shared_model_walks_repeatedly() {
    // the model is read-only during walks: the same instance drives any
    // number of walker configurations
    let model = Rc::new(test_model());
    for _ in 0..3 {
        let events = log_walk(&model, &Value::Enum(EnumValue::new("Colour", "GREEN")));
        assert_eq!(events, vec!["enum(GREEN)"]);
    }
}
