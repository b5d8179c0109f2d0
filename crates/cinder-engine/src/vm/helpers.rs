// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime helper implementations.
//!
//! Calls and construction need to re-enter the interpreter and are handled
//! there; every other helper is a pure function of the realm and its stack
//! arguments.

use super::comparison::{abstract_equals, less_than, strict_equals};
use crate::compiler::Helper;
use crate::runtime::object::Property;
use crate::runtime::value::to_int32;
use crate::runtime::{Realm, Throw, Value};

/// Runs `helper` on `args`, given in push order.
pub fn apply(realm: &mut Realm, helper: Helper, args: Vec<Value>) -> Result<Value, Throw> {
    if let Helper::NewArray { .. } = helper {
        return Ok(Value::Object(realm.new_array(args)));
    }

    let mut args = args.into_iter();
    let mut next = || args.next().unwrap_or_default();

    let result = match helper {
        // Conversions
        Helper::ToBoolean => Value::Boolean(next().to_boolean()),
        Helper::ToNumber => Value::Number(realm.to_number(&next())),

        // Arithmetic
        Helper::Add => {
            let (a, b) = (next(), next());
            add(realm, &a, &b)
        }
        Helper::Subtract => numeric(realm, next(), next(), |a, b| a - b),
        Helper::Multiply => numeric(realm, next(), next(), |a, b| a * b),
        Helper::Divide => numeric(realm, next(), next(), |a, b| a / b),
        Helper::Modulo => numeric(realm, next(), next(), |a, b| a % b),
        Helper::Negate => Value::Number(-realm.to_number(&next())),

        // Bitwise
        Helper::ShiftLeft => int32(realm, next(), next(), |a, b| a.wrapping_shl(b as u32 & 31)),
        Helper::ShiftRight => int32(realm, next(), next(), |a, b| a.wrapping_shr(b as u32 & 31)),
        Helper::ShiftRightUnsigned => {
            let a = to_int32(realm.to_number(&next())) as u32;
            let b = to_int32(realm.to_number(&next())) as u32;
            Value::Number((a >> (b & 31)) as f64)
        }
        Helper::BitAnd => int32(realm, next(), next(), |a, b| a & b),
        Helper::BitOr => int32(realm, next(), next(), |a, b| a | b),
        Helper::BitXor => int32(realm, next(), next(), |a, b| a ^ b),
        Helper::BitNot => Value::Number(!to_int32(realm.to_number(&next())) as f64),

        // Logical and type
        Helper::Not => Value::Boolean(!next().to_boolean()),
        Helper::TypeOf => Value::from(realm.type_of(&next())),

        // Comparison
        Helper::LessThan => {
            let (a, b) = (next(), next());
            Value::Boolean(less_than(realm, &a, &b) == Some(true))
        }
        Helper::GreaterThan => {
            let (a, b) = (next(), next());
            Value::Boolean(less_than(realm, &b, &a) == Some(true))
        }
        Helper::LessEqual => {
            let (a, b) = (next(), next());
            Value::Boolean(less_than(realm, &b, &a) == Some(false))
        }
        Helper::GreaterEqual => {
            let (a, b) = (next(), next());
            Value::Boolean(less_than(realm, &a, &b) == Some(false))
        }
        Helper::Equal => {
            let (a, b) = (next(), next());
            Value::Boolean(abstract_equals(realm, &a, &b))
        }
        Helper::NotEqual => {
            let (a, b) = (next(), next());
            Value::Boolean(!abstract_equals(realm, &a, &b))
        }
        Helper::StrictEqual => Value::Boolean(strict_equals(&next(), &next())),
        Helper::StrictNotEqual => Value::Boolean(!strict_equals(&next(), &next())),
        Helper::In => {
            let (key, object) = (next(), next());
            let Some(handle) = object.as_object() else {
                return Err(Throw::type_error(format!(
                    "cannot use 'in' operator to search for '{}' in {}",
                    realm.to_js_string(&key),
                    realm.to_js_string(&object)
                )));
            };
            let key = realm.to_js_string(&key);
            Value::Boolean(realm.has_property(handle, &key))
        }
        Helper::InstanceOf => {
            let (value, constructor) = (next(), next());
            Value::Boolean(realm.instance_of(&value, &constructor)?)
        }

        // Properties
        Helper::GetProperty => {
            let (object, key) = (next(), next());
            let key = realm.to_js_string(&key);
            realm.get(&object, &key)?
        }
        Helper::PutProperty { strict } => {
            let (object, key, value) = (next(), next(), next());
            let key = realm.to_js_string(&key);
            realm.put(&object, &key, value.clone(), strict)?;
            value
        }
        Helper::DeleteProperty { strict } => {
            let (object, key) = (next(), next());
            let key = realm.to_js_string(&key);
            Value::Boolean(realm.delete(&object, &key, strict)?)
        }
        Helper::DefineProperty => {
            let (object, key, value) = (next(), next(), next());
            let Some(handle) = object.as_object() else {
                return Err(Throw::type_error("cannot define a property on a primitive"));
            };
            let key = realm.to_js_string(&key);
            realm.object_mut(handle).define(&key, Property::data(value));
            object
        }

        // Allocation
        Helper::NewObject => Value::Object(realm.new_object()),
        Helper::NewArray { .. } => unreachable_helper(helper)?,
        Helper::NewRegExp => {
            let (pattern, flags) = (next(), next());
            let pattern = realm.to_js_string(&pattern);
            let flags = realm.to_js_string(&flags);
            if let Some(flag) = flags.chars().find(|c| !matches!(c, 'g' | 'i' | 'm')) {
                return Err(Throw::type_error(format!(
                    "invalid regular expression flag '{}'",
                    flag
                )));
            }
            Value::Object(realm.new_regexp(&pattern, &flags))
        }

        // Other
        Helper::EnumerateKeys => {
            let keys = realm
                .enumerate_keys(&next())
                .into_iter()
                .map(Value::String)
                .collect();
            Value::Object(realm.new_array(keys))
        }
        Helper::Print => {
            let line = realm.to_js_string(&next());
            realm.print(line);
            Value::Undefined
        }

        Helper::Call { .. } | Helper::Construct { .. } => unreachable_helper(helper)?,
    };
    Ok(result)
}

fn unreachable_helper(helper: Helper) -> Result<Value, Throw> {
    Err(Throw::type_error(format!(
        "{} is not a stack helper",
        helper
    )))
}

/// The `+` operator: string concatenation if either primitive is a string.
fn add(realm: &Realm, a: &Value, b: &Value) -> Value {
    let pa = realm.to_primitive(a);
    let pb = realm.to_primitive(b);
    if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
        let mut out = realm.to_js_string(&pa);
        out.push_str(&realm.to_js_string(&pb));
        Value::String(out)
    } else {
        Value::Number(pa.to_number() + pb.to_number())
    }
}

fn numeric(realm: &Realm, a: Value, b: Value, op: impl Fn(f64, f64) -> f64) -> Value {
    Value::Number(op(realm.to_number(&a), realm.to_number(&b)))
}

fn int32(realm: &Realm, a: Value, b: Value, op: impl Fn(i32, i32) -> i32) -> Value {
    let a = to_int32(realm.to_number(&a));
    let b = to_int32(realm.to_number(&b));
    Value::Number(op(a, b) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(helper: Helper, args: Vec<Value>) -> Value {
        let mut realm = Realm::new();
        apply(&mut realm, helper, args).unwrap()
    }

    #[test]
    fn test_add_concatenates_strings() {
        assert_eq!(
            run(Helper::Add, vec![Value::from("a"), Value::Number(1.0)]),
            Value::from("a1")
        );
        assert_eq!(
            run(Helper::Add, vec![Value::Number(1.0), Value::Boolean(true)]),
            Value::Number(2.0)
        );
    }

    #[test]
    fn test_bitwise_and_shifts() {
        assert_eq!(
            run(Helper::ShiftLeft, vec![Value::Number(1.0), Value::Number(33.0)]),
            Value::Number(2.0)
        );
        assert_eq!(
            run(Helper::ShiftRightUnsigned, vec![Value::Number(-1.0), Value::Number(28.0)]),
            Value::Number(15.0)
        );
        assert_eq!(run(Helper::BitNot, vec![Value::Number(0.0)]), Value::Number(-1.0));
    }

    #[test]
    fn test_relational_with_nan_is_false() {
        let nan = Value::Number(f64::NAN);
        assert_eq!(
            run(Helper::LessEqual, vec![nan.clone(), Value::Number(1.0)]),
            Value::Boolean(false)
        );
        assert_eq!(
            run(Helper::GreaterEqual, vec![Value::Number(2.0), Value::Number(2.0)]),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_property_helpers() {
        let mut realm = Realm::new();
        let object = apply(&mut realm, Helper::NewObject, vec![]).unwrap();
        let same = apply(
            &mut realm,
            Helper::DefineProperty,
            vec![object.clone(), Value::from("x"), Value::Number(1.0)],
        )
        .unwrap();
        assert_eq!(same, object);
        let read = apply(
            &mut realm,
            Helper::GetProperty,
            vec![object.clone(), Value::from("x")],
        )
        .unwrap();
        assert_eq!(read, Value::Number(1.0));
        let found = apply(&mut realm, Helper::In, vec![Value::from("x"), object]).unwrap();
        assert_eq!(found, Value::Boolean(true));
    }

    #[test]
    fn test_in_requires_an_object() {
        let mut realm = Realm::new();
        let err = apply(&mut realm, Helper::In, vec![Value::from("x"), Value::Number(1.0)])
            .unwrap_err();
        assert!(matches!(err, Throw::Error { .. }));
    }

    #[test]
    fn test_get_property_of_undefined_throws() {
        let mut realm = Realm::new();
        let err = apply(
            &mut realm,
            Helper::GetProperty,
            vec![Value::Undefined, Value::from("x")],
        )
        .unwrap_err();
        assert!(err.to_string().contains("TypeError"));
    }

    #[test]
    fn test_print_records_output() {
        let mut realm = Realm::new();
        apply(&mut realm, Helper::Print, vec![Value::Number(1.5)]).unwrap();
        assert_eq!(realm.output(), &["1.5".to_string()]);
    }
}
