//! String to value coercion for leaf flags.
//!
//! Every leaf flag receives raw command-line tokens; this module turns them
//! into JSON values of the field's declared type. `None`/`null` (any case)
//! clears a field, but only if the field is optional.

use serde_json::{Map, Number, Value};

use crate::describe::{Element, FieldDescriptor};
use crate::error::ConfigError;
use crate::tree::Slot;
use crate::types::{Choices, ContainerKind, EnumRepr, EnumSpec, Primitive, display_value};

/// Whether `token` is the sentinel that clears an optional field.
pub(crate) fn is_none_token(token: &str) -> bool {
    token.eq_ignore_ascii_case("none") || token.eq_ignore_ascii_case("null")
}

/// `true`, `y` and `yes` (any case), or a positive integer.
pub(crate) fn str_to_bool(token: &str) -> bool {
    let lower = token.to_ascii_lowercase();
    if matches!(lower.as_str(), "true" | "y" | "yes") {
        return true;
    }
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) && token.bytes().any(|b| b != b'0')
}

pub(crate) fn primitive(flag: &str, kind: Primitive, token: &str) -> Result<Value, ConfigError> {
    match kind {
        Primitive::Bool => Ok(Value::Bool(str_to_bool(token))),
        Primitive::Int => token
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ConfigError::invalid(flag, format!("expected an integer, got '{token}'"))),
        Primitive::Float => {
            let parsed = token
                .parse::<f64>()
                .map_err(|_| ConfigError::invalid(flag, format!("expected a number, got '{token}'")))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| ConfigError::invalid(flag, format!("'{token}' is not a finite number")))
        }
        Primitive::Str => Ok(Value::String(token.to_string())),
    }
}

/// Match `token` against the enum's member values first, then its member
/// names. The result is the member name.
pub(crate) fn enum_member(flag: &str, spec: &EnumSpec, token: &str) -> Result<Value, ConfigError> {
    let by_value = spec.members.iter().find(|(_, value)| match spec.repr {
        EnumRepr::Str => value.as_str() == Some(token),
        EnumRepr::Int => token.parse::<i64>().ok().is_some_and(|i| value.as_i64() == Some(i)),
        EnumRepr::Float => token.parse::<f64>().ok().is_some_and(|f| value.as_f64() == Some(f)),
    });
    let found = by_value.or_else(|| spec.members.iter().find(|(name, _)| name == token));
    match found {
        Some((name, _)) => Ok(Value::String(name.clone())),
        None => Err(ConfigError::InvalidChoice {
            flag: format!("--{flag}"),
            value: token.to_string(),
            allowed: spec.choices(),
        }),
    }
}

fn element(flag: &str, descriptor: &FieldDescriptor, token: &str) -> Result<Value, ConfigError> {
    let value = match &descriptor.element {
        Element::Primitive(p) => primitive(flag, *p, token)?,
        Element::Enum(spec) => enum_member(flag, spec, token)?,
        Element::Record(name) => {
            return Err(ConfigError::invalid(
                flag,
                format!("'{name}' is a structured type, not a value"),
            ));
        }
    };
    check_choices(flag, descriptor, &value)?;
    Ok(value)
}

fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Reject values outside an enforced literal choice list.
fn check_choices(
    flag: &str,
    descriptor: &FieldDescriptor,
    value: &Value,
) -> Result<(), ConfigError> {
    let Some(Choices::Values(allowed)) = &descriptor.meta.choices else {
        return Ok(());
    };
    if !descriptor.meta.enforces_choices() || allowed.iter().any(|a| same_value(a, value)) {
        return Ok(());
    }
    Err(ConfigError::InvalidChoice {
        flag: format!("--{flag}"),
        value: display_value(value),
        allowed: allowed.iter().map(display_value).collect(),
    })
}

/// Coerce the tokens given to a leaf flag.
pub(crate) fn leaf(
    flag: &str,
    descriptor: &FieldDescriptor,
    tokens: &[String],
) -> Result<Slot, ConfigError> {
    if let [token] = tokens
        && is_none_token(token)
    {
        if descriptor.optional {
            return Ok(Slot::Null);
        }
        return Err(ConfigError::invalid(flag, "field is not optional and can not be None"));
    }

    match descriptor.container {
        ContainerKind::None => {
            let [token] = tokens else {
                return Err(ConfigError::invalid(flag, "expected exactly one value"));
            };
            Ok(Slot::Value(element(flag, descriptor, token)?))
        }
        ContainerKind::List => {
            let items = tokens
                .iter()
                .map(|t| element(flag, descriptor, t))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Slot::Value(Value::Array(items)))
        }
        ContainerKind::Set => {
            let mut items: Vec<Value> = Vec::with_capacity(tokens.len());
            for token in tokens {
                let value = element(flag, descriptor, token)?;
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            Ok(Slot::Value(Value::Array(items)))
        }
        ContainerKind::Dict => {
            let key_kind = descriptor.dict_key.unwrap_or(Primitive::Str);
            let mut map = Map::new();
            for token in tokens {
                let Some((key, value)) = token.split_once('=') else {
                    return Err(ConfigError::invalid(
                        flag,
                        format!("expected key=value, got '{token}'"),
                    ));
                };
                let key = display_value(&primitive(flag, key_kind, key)?);
                map.insert(key, element(flag, descriptor, value)?);
            }
            Ok(Slot::Value(Value::Object(map)))
        }
    }
}
