//! Typed accessors for script tables.
//!
//! Loaders read script values only through these helpers, so every dynamic
//! value is checked once at the boundary and converted into a Rust type.

use mlua::{Table, Value};
use thiserror::Error;

/// A script table field is missing or has the wrong type.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("missing required field '{0}'")]
    Missing(String),
    #[error("field '{field}': expected {expected}, got {actual}")]
    WrongType {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// Indexing the table raised (e.g. from an `__index` metamethod).
    #[error("field lookup failed: {0}")]
    Lua(#[from] mlua::Error),
}

fn wrong_type(field: &str, expected: &'static str, value: &Value) -> FieldError {
    FieldError::WrongType {
        field: field.to_string(),
        expected,
        actual: value.type_name(),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match *value {
        Value::Integer(i) => Some(i),
        Value::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(n as i64),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match *value {
        Value::Integer(i) => Some(i as f64),
        Value::Number(n) => Some(n),
        _ => None,
    }
}

/// Looks up `field`, treating `nil` as absent.
fn lookup(table: &Table, field: &str) -> Result<Option<Value>, FieldError> {
    match table.get::<Value>(field)? {
        Value::Nil => Ok(None),
        value => Ok(Some(value)),
    }
}

/// Any non-nil value of `field`.
pub fn require_field(table: &Table, field: &str) -> Result<Value, FieldError> {
    lookup(table, field)?.ok_or_else(|| FieldError::Missing(field.to_string()))
}

pub fn require_string(table: &Table, field: &str) -> Result<String, FieldError> {
    match require_field(table, field)? {
        Value::String(s) => Ok(s.to_string_lossy().to_string()),
        other => Err(wrong_type(field, "string", &other)),
    }
}

/// Integral floats such as `3.0` are accepted.
pub fn require_integer(table: &Table, field: &str) -> Result<i64, FieldError> {
    let value = require_field(table, field)?;
    as_integer(&value).ok_or_else(|| wrong_type(field, "integer", &value))
}

pub fn require_number(table: &Table, field: &str) -> Result<f64, FieldError> {
    let value = require_field(table, field)?;
    as_number(&value).ok_or_else(|| wrong_type(field, "number", &value))
}

pub fn get_boolean(table: &Table, field: &str, default: bool) -> Result<bool, FieldError> {
    match lookup(table, field)? {
        None => Ok(default),
        Some(Value::Boolean(b)) => Ok(b),
        Some(other) => Err(wrong_type(field, "boolean", &other)),
    }
}

/// Optional integer, clamped to `[min, max]` when present.
pub fn get_integer(
    table: &Table,
    field: &str,
    default: i64,
    min: i64,
    max: i64,
) -> Result<i64, FieldError> {
    match lookup(table, field)? {
        None => Ok(default),
        Some(value) => as_integer(&value)
            .map(|i| i.clamp(min, max))
            .ok_or_else(|| wrong_type(field, "integer", &value)),
    }
}

pub fn require_table(table: &Table, field: &str) -> Result<Table, FieldError> {
    match require_field(table, field)? {
        Value::Table(t) => Ok(t),
        other => Err(wrong_type(field, "table", &other)),
    }
}

/// `None` when the field is absent; an error when it holds a non-table.
pub fn optional_table(table: &Table, field: &str) -> Result<Option<Table>, FieldError> {
    match lookup(table, field)? {
        None => Ok(None),
        Some(Value::Table(t)) => Ok(Some(t)),
        Some(other) => Err(wrong_type(field, "table", &other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::Lua;

    fn table(lua: &Lua, source: &str) -> Table {
        lua.load(source).eval::<Table>().unwrap()
    }

    #[test]
    fn test_require_field_accepts_any_non_nil() {
        let lua = Lua::new();
        let t = table(&lua, "{ flag = false, name = 'x', gone = nil }");
        assert!(matches!(require_field(&t, "flag").unwrap(), Value::Boolean(false)));
        assert!(matches!(require_field(&t, "name").unwrap(), Value::String(_)));
        let err = require_field(&t, "gone").unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'gone'");
    }

    #[test]
    fn test_require_string() {
        let lua = Lua::new();
        let t = table(&lua, r#"{ block = "stone", height = 3 }"#);
        assert_eq!(require_string(&t, "block").unwrap(), "stone");

        let err = require_string(&t, "height").unwrap_err();
        assert_eq!(err.to_string(), "field 'height': expected string, got integer");
        let err = require_string(&t, "name").unwrap_err();
        assert_eq!(err.to_string(), "missing required field 'name'");
    }

    #[test]
    fn test_require_integer_accepts_integral_floats() {
        let lua = Lua::new();
        let t = table(&lua, "{ a = 4, b = -1.0, c = 2.5, d = 'x' }");
        assert_eq!(require_integer(&t, "a").unwrap(), 4);
        assert_eq!(require_integer(&t, "b").unwrap(), -1);
        assert!(matches!(
            require_integer(&t, "c"),
            Err(FieldError::WrongType { expected: "integer", .. })
        ));
        assert!(matches!(
            require_integer(&t, "d"),
            Err(FieldError::WrongType { actual: "string", .. })
        ));
    }

    #[test]
    fn test_require_number() {
        let lua = Lua::new();
        let t = table(&lua, "{ value = 0.5, weight = 2 }");
        assert_eq!(require_number(&t, "value").unwrap(), 0.5);
        assert_eq!(require_number(&t, "weight").unwrap(), 2.0);
        assert!(matches!(require_number(&t, "missing"), Err(FieldError::Missing(_))));
    }

    #[test]
    fn test_get_boolean_default() {
        let lua = Lua::new();
        let t = table(&lua, "{ below_sea_level = false, bad = 1 }");
        assert!(!get_boolean(&t, "below_sea_level", true).unwrap());
        assert!(get_boolean(&t, "absent", true).unwrap());
        assert!(get_boolean(&t, "bad", true).is_err());
    }

    #[test]
    fn test_get_integer_clamps() {
        let lua = Lua::new();
        let t = table(&lua, "{ low = -5, high = 99, ok = 7 }");
        assert_eq!(get_integer(&t, "low", 0, 0, 16).unwrap(), 0);
        assert_eq!(get_integer(&t, "high", 0, 0, 16).unwrap(), 16);
        assert_eq!(get_integer(&t, "ok", 0, 0, 16).unwrap(), 7);
        assert_eq!(get_integer(&t, "absent", 3, 0, 16).unwrap(), 3);
    }

    #[test]
    fn test_optional_table() {
        let lua = Lua::new();
        let t = table(&lua, "{ layers = {}, sea_layers = 'none' }");
        assert!(optional_table(&t, "layers").unwrap().is_some());
        assert!(optional_table(&t, "absent").unwrap().is_none());
        assert!(optional_table(&t, "sea_layers").is_err());
        assert!(require_table(&t, "absent").is_err());
    }
}
