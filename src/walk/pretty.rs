//! Ready-made stringifying walk
//!
//! `pretty` renders a value graph as a single-line trace:
//! objects as `Name { prop = value }`, maps as `Map { [key] = value, ... }`,
//! lists and sets as `[a, b, c]`, references as `&TypeName`, strings
//! quoted. Useful for diagnostics and as the reference usage of the walker.

use crate::error::TypewalkError;
use crate::introspect::ObjectIntrospector;
use crate::model::registry::TypeModel;
use crate::value::{Primitive, Value};
use crate::walk::walker::{WalkHandlers, WalkInfo, Walker};

fn render_primitive(out: &mut String, primitive: &Primitive) {
    match primitive {
        Primitive::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Primitive::Int(n) => out.push_str(&n.to_string()),
        Primitive::Decimal(d) => out.push_str(&d.to_string()),
        Primitive::Str(s) => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Primitive::Opaque(o) => {
            out.push('<');
            out.push_str(o.type_name());
            out.push('>');
        }
    }
}

/// Render a value graph as a single-line trace string.
pub fn pretty(
    model: &TypeModel,
    introspector: &dyn ObjectIntrospector,
    value: &Value,
) -> Result<String, TypewalkError> {
    let handlers = WalkHandlers::<(), String> {
        object_begin: Box::new(|_, info, _, datatype| {
            WalkInfo::new((), format!("{}{} {{ ", info.acc, datatype.name))
        }),
        object_end: Box::new(|_, info, _, _| WalkInfo::new((), format!("{}}}", info.acc))),
        property_begin: Box::new(|_, info, property| {
            WalkInfo::new((), format!("{}{} = ", info.acc, property.name))
        }),
        property_end: Box::new(|_, info, _| WalkInfo::new((), format!("{} ", info.acc))),
        map_begin: Box::new(|_, info, _| WalkInfo::new((), format!("{}Map {{ ", info.acc))),
        map_entry_key_begin: Box::new(|_, info, _| WalkInfo::new((), format!("{}[", info.acc))),
        map_entry_key_end: Box::new(|_, info, _| WalkInfo::new((), format!("{}]", info.acc))),
        map_entry_value_begin: Box::new(|_, info, _| {
            WalkInfo::new((), format!("{} = ", info.acc))
        }),
        map_separate: Box::new(|_, info, _, _| WalkInfo::new((), format!("{}, ", info.acc))),
        map_end: Box::new(|_, info, _| WalkInfo::new((), format!("{} }}", info.acc))),
        coll_begin: Box::new(|_, info, _, _| WalkInfo::new((), format!("{}[", info.acc))),
        coll_separate: Box::new(|_, info, _, _, _| WalkInfo::new((), format!("{}, ", info.acc))),
        coll_end: Box::new(|_, info, _, _| WalkInfo::new((), format!("{}]", info.acc))),
        reference: Box::new(|_, info, value, _| {
            WalkInfo::new((), format!("{}&{}", info.acc, value.type_name()))
        }),
        primitive: Box::new(|_, info, primitive, _| {
            let mut acc = info.acc;
            render_primitive(&mut acc, primitive);
            WalkInfo::new((), acc)
        }),
        enum_value: Box::new(|_, info, literal| {
            WalkInfo::new((), format!("{}{}", info.acc, literal.literal))
        }),
        null_value: Box::new(|_, info| WalkInfo::new((), format!("{}null", info.acc))),
        ..WalkHandlers::default()
    };
    let walker = Walker::new(model, introspector, handlers);
    Ok(walker.walk(WalkInfo::new((), String::new()), value)?.acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::RecordIntrospector;
    use crate::model::registry::STD_MODEL;
    use crate::value::Record;

    fn model() -> TypeModel {
        let mut model = TypeModel::new();
        model.register_from_str(STD_MODEL).unwrap();
        model
            .register_from_str(
                r#"
                namespace app {
                    datatype A {
                        composite-val prop1 : String
                    }
                    datatype Pair {
                        composite-val left : A
                        reference-var right : A
                    }
                }
                "#,
            )
            .unwrap();
        model
    }

    #[test]
    fn object_trace() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let a = Record::new("A").with("prop1", "hello").into_value();
        assert_eq!(pretty(&model, &intro, &a).unwrap(), "A { prop1 = 'hello' }");
    }

    #[test]
    fn map_trace() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let map = Value::Map(vec![
            (Value::from("a"), Value::from(1i64)),
            (Value::from("b"), Value::from(2i64)),
            (Value::from("c"), Value::from(3i64)),
        ]);
        assert_eq!(
            pretty(&model, &intro, &map).unwrap(),
            "Map { ['a'] = 1, ['b'] = 2, ['c'] = 3 }"
        );
    }

    #[test]
    fn list_and_null_trace() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let list = Value::List(vec![Value::from(1i64), Value::Null, Value::from(3i64)]);
        assert_eq!(pretty(&model, &intro, &list).unwrap(), "[1, null, 3]");
        assert_eq!(pretty(&model, &intro, &Value::Null).unwrap(), "null");
    }

    #[test]
    fn composite_nests_reference_does_not() {
        let model = model();
        let intro = RecordIntrospector::new(&model);
        let left = Record::new("A").with("prop1", "x").into_value();
        let right = Record::new("A").with("prop1", "y").into_value();
        let pair = Record::new("Pair")
            .with("left", left)
            .with("right", right)
            .into_value();
        assert_eq!(
            pretty(&model, &intro, &pair).unwrap(),
            "Pair { left = A { prop1 = 'x' } right = &A }"
        );
    }
}
