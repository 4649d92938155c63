// This file is part of the terraform-provider-fortimanager project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::client::{ClientError, RoutingParams};
use crate::schema::{Key, ResourceSchema, Scope, DEVICE_NAME, DEVICE_VDOM, ID};

use super::state::{string_of, ValueDynamic};

/// Routing parameters locating the object described by `object`.
///
/// Fails before anything is sent when a parameter cannot be resolved.
pub(crate) fn routing_params<K: Borrow<str> + Ord>(
    schema: &ResourceSchema,
    object: &BTreeMap<K, ValueDynamic>,
    default_device: Option<&str>,
) -> Result<RoutingParams, ClientError> {
    let mut params = RoutingParams::new();

    let device = string_of(object, DEVICE_NAME)
        .or_else(|| default_device.map(str::to_owned))
        .ok_or_else(|| ClientError::MissingParameter(DEVICE_NAME.to_owned()))?;
    params.insert("device", device);

    if schema.scope == Scope::Vdom {
        let vdom = string_of(object, DEVICE_VDOM)
            .ok_or_else(|| ClientError::MissingParameter(DEVICE_VDOM.to_owned()))?;
        params.insert("vdom", vdom);
    }

    for parent in schema.parents {
        let value = string_of(object, parent)
            .ok_or_else(|| ClientError::MissingParameter(parent.to_string()))?;
        params.insert(*parent, value);
    }

    Ok(params)
}

/// Key of the object on the remote, falling back to the id for imported objects.
pub(crate) fn object_key<K: Borrow<str> + Ord>(
    schema: &ResourceSchema,
    object: &BTreeMap<K, ValueDynamic>,
) -> Option<String> {
    match schema.key {
        Key::Field(name) => string_of(object, name).or_else(|| string_of(object, ID)),
        Key::Singleton(_) => None,
    }
}

/// Terraform id of the object.
pub(crate) fn object_id(schema: &ResourceSchema, key: Option<&str>) -> String {
    match (schema.key, key) {
        (Key::Singleton(id), _) => id.to_owned(),
        (Key::Field(_), Some(key)) => key.to_owned(),
        (Key::Field(_), None) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use tf_provider::value::Value;

    use super::*;
    use crate::object::state::{Dynamic, StateObject};
    use crate::schema::registry;

    fn object(entries: Vec<(&'static str, &str)>) -> StateObject<'static> {
        entries
            .into_iter()
            .map(|(k, v)| (Cow::Borrowed(k), Value::Value(Dynamic::from(v))))
            .collect()
    }

    #[test]
    fn vdom_scoped() {
        let schema = registry::firewall_address();
        let state = object(vec![
            ("device_name", "FGT-01"),
            ("device_vdom", "root"),
            ("name", "lan"),
        ]);

        let params = routing_params(&schema, &state, None).unwrap();
        assert_eq!(params.get("device"), Some("FGT-01"));
        assert_eq!(params.get("vdom"), Some("root"));
        assert_eq!(object_key(&schema, &state).as_deref(), Some("lan"));
        assert_eq!(object_id(&schema, Some("lan")), "lan");
    }

    #[test]
    fn default_device() {
        let schema = registry::system_ha();
        let state = object(vec![]);

        let params = routing_params(&schema, &state, Some("FGT-02")).unwrap();
        assert_eq!(params.get("device"), Some("FGT-02"));
        assert_eq!(params.get("vdom"), None);
        assert_eq!(object_key(&schema, &state), None);
        assert_eq!(object_id(&schema, None), "SystemHa");
    }

    #[test]
    fn missing_parameters() {
        let schema = registry::session_sync_filter();
        let err = routing_params(&schema, &object(vec![]), None).unwrap_err();
        assert!(matches!(err, ClientError::MissingParameter(name) if name == DEVICE_NAME));

        let err = routing_params(&schema, &object(vec![("device_name", "FGT")]), None).unwrap_err();
        assert!(matches!(err, ClientError::MissingParameter(name) if name == "cluster_sync"));

        let schema = registry::managed_switch();
        let err = routing_params(&schema, &object(vec![("device_name", "FGT")]), None).unwrap_err();
        assert!(matches!(err, ClientError::MissingParameter(name) if name == DEVICE_VDOM));
    }

    #[test]
    fn imported_key_from_id() {
        let schema = registry::managed_switch();
        let state = object(vec![("id", "S248EPTF00000001")]);
        assert_eq!(
            object_key(&schema, &state).as_deref(),
            Some("S248EPTF00000001")
        );
    }
}
