//! Shared test utilities and arbitrary generators for property-based testing.

use crate::types::{CommandName, NodeId};
use proptest::prelude::*;
use serde_json::Value;

pub fn arb_node_id() -> impl Strategy<Value = NodeId> {
    "[a-z0-9][a-z0-9.-]{0,30}".prop_map(|s| NodeId::parse(s).unwrap())
}

pub fn arb_command_name() -> impl Strategy<Value = CommandName> {
    prop_oneof![
        Just(CommandName::replace_catalog()),
        Just(CommandName::replace_facts()),
        Just(CommandName::store_report()),
        Just(CommandName::deactivate_node()),
        "[a-zA-Z][a-zA-Z0-9 _.-]{0,20}".prop_map(|s| CommandName::parse(s).unwrap()),
    ]
}

pub fn arb_non_singleton_name() -> impl Strategy<Value = CommandName> {
    arb_command_name().prop_filter("non-singleton", |n| !n.is_singleton())
}

/// Arbitrary JSON values: scalars, arrays and string-keyed objects, nested.
pub fn arb_json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        ".{0,20}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}
