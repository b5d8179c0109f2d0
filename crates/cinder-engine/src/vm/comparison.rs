// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Equality and relational comparison (ES3 Sections 11.8.5, 11.9.3, 11.9.6)

use crate::runtime::value::string_to_number;
use crate::runtime::{Realm, Value};
use std::cmp::Ordering;
use std::mem::discriminant;

/// Strict equality comparison (ES3 Section 11.9.6)
///
/// NaN is unequal to itself and the two zeros are equal, which is exactly
/// `f64` equality.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    a == b
}

/// Abstract equality comparison (ES3 Section 11.9.3)
///
/// The Abstract Equality Comparison Algorithm with type coercion.
pub fn abstract_equals(realm: &Realm, a: &Value, b: &Value) -> bool {
    // 1. If Type(x) is the same as Type(y), return strict equality
    if discriminant(a) == discriminant(b) {
        return strict_equals(a, b);
    }
    match (a, b) {
        // 2. null == undefined is true
        (Value::Null, Value::Undefined) | (Value::Undefined, Value::Null) => true,

        // 3. If one is number and other is string, convert string to number
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            *n == string_to_number(s)
        }

        // 4. If one is boolean, convert it to number and compare
        (Value::Boolean(b_val), other) => {
            abstract_equals(realm, &Value::Number(bool_to_number(*b_val)), other)
        }
        (other, Value::Boolean(b_val)) => {
            abstract_equals(realm, other, &Value::Number(bool_to_number(*b_val)))
        }

        // 5. If one is number/string and other is object, convert object to primitive
        (Value::Number(_) | Value::String(_), Value::Object(_)) => {
            abstract_equals(realm, a, &realm.to_primitive(b))
        }
        (Value::Object(_), Value::Number(_) | Value::String(_)) => {
            abstract_equals(realm, &realm.to_primitive(a), b)
        }

        // All other cases are not equal
        _ => false,
    }
}

fn bool_to_number(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

/// Abstract relational comparison (ES3 Section 11.8.5)
///
/// Returns `None` when either side converts to NaN, which every relational
/// operator treats as false.
pub fn less_than(realm: &Realm, a: &Value, b: &Value) -> Option<bool> {
    let pa = realm.to_primitive(a);
    let pb = realm.to_primitive(b);
    if let (Value::String(sa), Value::String(sb)) = (&pa, &pb) {
        // Strings compare by UTF-16 code units.
        return Some(sa.encode_utf16().cmp(sb.encode_utf16()) == Ordering::Less);
    }
    let na = realm.to_number(&pa);
    let nb = realm.to_number(&pb);
    if na.is_nan() || nb.is_nan() {
        return None;
    }
    Some(na < nb)
}
