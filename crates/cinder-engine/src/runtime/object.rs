// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Object representation.

use super::function::Closure;
use super::value::Value;
use rustc_hash::FxHashMap;

/// Handle to an object in the realm's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef(pub(crate) usize);

impl ObjectRef {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What kind of object this is, and any internal state that comes with it.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    Array,
    Function(Closure),
    Error,
    RegExp { pattern: String, flags: String },
}

/// An object property.
#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// A plain data property as created by assignment.
    pub fn data(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// A writable property hidden from for-in.
    pub fn hidden(value: Value) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: false,
        }
    }
}

/// An object stored in the realm.
///
/// Property order is insertion order, which is also the for-in order.
#[derive(Debug, Clone)]
pub struct RuntimeObject {
    pub kind: ObjectKind,
    /// The prototype of this object
    pub prototype: Option<ObjectRef>,
    properties: FxHashMap<String, Property>,
    order: Vec<String>,
}

impl RuntimeObject {
    /// Creates a new empty object.
    pub fn new(kind: ObjectKind, prototype: Option<ObjectRef>) -> Self {
        Self {
            kind,
            prototype,
            properties: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    pub fn closure(&self) -> Option<&Closure> {
        match &self.kind {
            ObjectKind::Function(closure) => Some(closure),
            _ => None,
        }
    }

    /// Gets an own property.
    pub fn get_own(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Checks if an own property exists.
    pub fn has_own(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    /// Writes an own property, creating a plain data property when absent.
    /// Returns false if the existing property is read-only.
    pub fn set(&mut self, key: &str, value: Value) -> bool {
        match self.properties.get_mut(key) {
            Some(prop) if !prop.writable => false,
            Some(prop) => {
                prop.value = value;
                true
            }
            None => {
                self.define(key, Property::data(value));
                true
            }
        }
    }

    /// Defines or replaces an own property with the given attributes.
    pub fn define(&mut self, key: &str, property: Property) {
        if self.properties.insert(key.to_string(), property).is_none() {
            self.order.push(key.to_string());
        }
    }

    /// Deletes an own property. Returns false if it is not configurable.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.properties.get(key) {
            Some(prop) if !prop.configurable => false,
            Some(_) => {
                self.properties.remove(key);
                self.order.retain(|k| k != key);
                true
            }
            None => true,
        }
    }

    /// Deletes every configurable array-index property at or above
    /// `length`, in one pass over the own keys.
    pub fn truncate(&mut self, length: u32) {
        let properties = &mut self.properties;
        self.order.retain(|key| {
            let doomed = array_index(key).is_some_and(|index| index >= length)
                && properties.get(key).is_some_and(|prop| prop.configurable);
            if doomed {
                properties.remove(key);
            }
            !doomed
        });
    }

    /// Own enumerable keys in insertion order.
    pub fn enumerable_keys(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .filter(|key| self.properties.get(*key).is_some_and(|p| p.enumerable))
            .map(String::as_str)
    }

    /// All own keys in insertion order.
    pub fn own_keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Current array length, or zero for non-arrays.
    pub fn array_length(&self) -> u32 {
        match self.properties.get("length") {
            Some(Property {
                value: Value::Number(n),
                ..
            }) if self.is_array() => *n as u32,
            _ => 0,
        }
    }
}

/// Parses a property key as an array index.
pub fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index != u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_survives_overwrite() {
        let mut obj = RuntimeObject::new(ObjectKind::Ordinary, None);
        obj.set("b", Value::Number(1.0));
        obj.set("a", Value::Number(2.0));
        obj.set("b", Value::Number(3.0));
        let keys: Vec<_> = obj.enumerable_keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn test_delete_respects_configurable() {
        let mut obj = RuntimeObject::new(ObjectKind::Ordinary, None);
        obj.define("fixed", Property::hidden(Value::Null));
        obj.set("loose", Value::Null);
        assert!(!obj.delete("fixed"));
        assert!(obj.delete("loose"));
        assert!(obj.delete("missing"));
        assert!(!obj.has_own("loose"));
    }

    #[test]
    fn test_hidden_properties_are_not_enumerable() {
        let mut obj = RuntimeObject::new(ObjectKind::Array, None);
        obj.define("length", Property::hidden(Value::Number(0.0)));
        obj.set("0", Value::Boolean(true));
        assert_eq!(obj.enumerable_keys().collect::<Vec<_>>(), vec!["0"]);
    }

    #[test]
    fn test_truncate_drops_high_indices_only() {
        let mut obj = RuntimeObject::new(ObjectKind::Array, None);
        obj.define("length", Property::hidden(Value::Number(3.0)));
        obj.set("0", Value::Null);
        obj.set("name", Value::Null);
        obj.set("2", Value::Null);
        obj.truncate(1);
        assert_eq!(obj.own_keys().collect::<Vec<_>>(), vec!["length", "0", "name"]);
    }

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("17"), Some(17));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("length"), None);
    }
}
