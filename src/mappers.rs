//! Ready-made primitive mappers for common application primitives
//!
//! Register these on a [`crate::model::TypeModel`] when the corresponding
//! type names appear as primitives in the model description, e.g.
//! `primitive Uuid` or `primitive DateTime`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::value::{Primitive, PrimitiveMapper};

/// Maps `uuid::Uuid` payloads to and from their hyphenated string form.
pub fn uuid_mapper() -> PrimitiveMapper {
    PrimitiveMapper::create::<Uuid>(
        "Uuid",
        "String",
        |id| Primitive::Str(id.to_string()),
        |raw| match raw {
            Primitive::Str(s) => Uuid::parse_str(s).ok(),
            _ => None,
        },
    )
}

/// Maps `chrono::DateTime<Utc>` payloads to and from RFC 3339 strings.
pub fn datetime_mapper() -> PrimitiveMapper {
    PrimitiveMapper::create::<DateTime<Utc>>(
        "DateTime",
        "String",
        |ts| Primitive::Str(ts.to_rfc3339()),
        |raw| match raw {
            Primitive::Str(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OpaqueValue;

    #[test]
    fn uuid_round_trip() {
        let mapper = uuid_mapper();
        assert_eq!(mapper.primitive_type(), "Uuid");
        assert_eq!(mapper.raw_type(), "String");

        let id = Uuid::new_v4();
        let raw = mapper.to_raw(&OpaqueValue::new("Uuid", id)).unwrap();
        assert_eq!(raw, Primitive::Str(id.to_string()));
        let back = mapper.from_raw(&raw).unwrap();
        assert_eq!(back.downcast_ref::<Uuid>(), Some(&id));
    }

    #[test]
    fn datetime_round_trip() {
        let mapper = datetime_mapper();
        let ts: DateTime<Utc> = "2024-05-01T12:30:00Z".parse().unwrap();
        let raw = mapper.to_raw(&OpaqueValue::new("DateTime", ts)).unwrap();
        let back = mapper.from_raw(&raw).unwrap();
        assert_eq!(back.downcast_ref::<DateTime<Utc>>(), Some(&ts));
    }

    #[test]
    fn malformed_raw_is_none() {
        let mapper = uuid_mapper();
        assert!(mapper.from_raw(&Primitive::Str("not-a-uuid".into())).is_none());
        assert!(mapper.from_raw(&Primitive::Int(7)).is_none());
    }
}
