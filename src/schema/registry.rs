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

//! Resource types exposed by the provider.

use super::{Field, Key, ResourceSchema, Scope};

pub fn all() -> Vec<ResourceSchema> {
    vec![
        managed_switch(),
        system_ha(),
        session_sync_filter(),
        firewall_address(),
    ]
}

pub fn managed_switch() -> ResourceSchema {
    ResourceSchema {
        type_name: "switchcontroller_managedswitch",
        description: "FortiSwitch managed by a FortiGate through FortiLink",
        url: "/pm/config/device/{device}/vdom/{vdom}/switch-controller/managed-switch",
        scope: Scope::Vdom,
        parents: &[],
        key: Key::Field("switch_id"),
        fields: vec![
            Field::string("switch_id")
                .required()
                .describe("Managed-switch serial number"),
            Field::string("name").describe("Managed-switch name"),
            Field::string("description"),
            Field::string("switch_profile"),
            Field::string("access_profile"),
            Field::string("fsw_wan1_peer").describe("FortiSwitch WAN1 peer port"),
            Field::string("fsw_wan1_admin"),
            Field::string("type"),
            Field::string("owner_vdom"),
            Field::int("poe_detection_type"),
            Field::int("max_allowed_trunk_members"),
            Field::int("pre_provisioned"),
            Field::string("poe_pre_standard_detection"),
            Field::string("dynamic_capability").computed(),
            Field::int("version").computed(),
            Field::blocks(
                "ports",
                vec![
                    Field::string("port_name").describe("Switch port name"),
                    Field::string("description"),
                    Field::string("status"),
                    Field::string("type"),
                    Field::string("speed"),
                    Field::string("poe_status"),
                    Field::string("poe_pre_standard_detection"),
                    Field::string("vlan"),
                    Field::string_set("allowed_vlans"),
                    Field::string_set("untagged_vlans"),
                    Field::string("access_mode"),
                    Field::string("lldp_status"),
                    Field::string("stp_state"),
                    Field::string("edge_port"),
                    Field::string("dhcp_snooping"),
                    Field::string("export_to"),
                    Field::string_set("members"),
                    Field::string("isl_local_trunk_name").computed(),
                    Field::int("fortilink_port").computed(),
                ],
            )
            .describe("Managed-switch port list"),
            Field::block(
                "snmp_sysinfo",
                vec![
                    Field::string("status"),
                    Field::string("engine_id"),
                    Field::string("description"),
                    Field::string("contact_info"),
                    Field::string("location"),
                ],
            ),
            Field::block(
                "stp_settings",
                vec![
                    Field::string("local_override"),
                    Field::string("name"),
                    Field::int("revision"),
                    Field::int("hello_time"),
                    Field::int("forward_time"),
                    Field::int("max_age"),
                    Field::int("max_hops"),
                ],
            ),
            Field::block(
                "storm_control",
                vec![
                    Field::string("local_override"),
                    Field::int("rate"),
                    Field::string("unknown_unicast"),
                    Field::string("unknown_multicast"),
                    Field::string("broadcast"),
                ],
            ),
            Field::blocks(
                "mirror",
                vec![
                    Field::string("name"),
                    Field::string("status"),
                    Field::string("switching_packet"),
                    Field::string("dst"),
                    Field::string_set("src_ingress"),
                    Field::string_set("src_egress"),
                ],
            ),
            Field::blocks(
                "static_mac",
                vec![
                    Field::int("id"),
                    Field::string("type"),
                    Field::string("vlan"),
                    Field::string("mac"),
                    Field::string("interface"),
                    Field::string("description"),
                ],
            ),
        ],
    }
}

pub fn system_ha() -> ResourceSchema {
    ResourceSchema {
        type_name: "system_ha",
        description: "High availability settings of a managed FortiGate",
        url: "/pm/config/device/{device}/global/system/ha",
        scope: Scope::Global,
        parents: &[],
        key: Key::Singleton("SystemHa"),
        fields: vec![
            Field::int("group_id").describe("HA group ID"),
            Field::string("group_name"),
            Field::string("mode"),
            Field::string_list("password").sensitive(),
            Field::string_list("hbdev").describe("Heartbeat interfaces and priorities"),
            Field::int("hb_interval"),
            Field::int("hb_lost_threshold"),
            Field::string("session_pickup"),
            Field::string("session_pickup_connectionless"),
            Field::string("override"),
            Field::int("priority"),
            Field::string_set("monitor"),
            Field::string_set("pingserver_monitor_interface"),
            Field::string("ha_mgmt_status"),
            Field::blocks(
                "ha_mgmt_interfaces",
                vec![
                    Field::int("id"),
                    Field::string("interface"),
                    Field::string("dst"),
                    Field::string("gateway"),
                    Field::string("gateway6"),
                ],
            ),
            Field::string("unicast_hb"),
            Field::string("unicast_hb_peerip"),
            Field::blocks(
                "unicast_peers",
                vec![Field::int("id"), Field::string("peer_ip")],
            ),
            Field::string("uninterruptible_upgrade"),
            Field::int("ha_uptime_diff_margin"),
            Field::string("load_balance_all"),
            Field::string("schedule"),
            Field::string("sync_config"),
            Field::string("encryption"),
            Field::string("authentication"),
            Field::int("route_ttl"),
            Field::string("memory_compatible_mode"),
        ],
    }
}

pub fn session_sync_filter() -> ResourceSchema {
    ResourceSchema {
        type_name: "system_ha_clustersync_sessionsyncfilter",
        description: "Session synchronization filter of an HA cluster-sync entry",
        url: "/pm/config/device/{device}/global/system/ha/cluster-sync/{cluster_sync}/session-sync-filter",
        scope: Scope::Global,
        parents: &["cluster_sync"],
        key: Key::Singleton("SystemHaClusterSyncSessionSyncFilter"),
        fields: vec![
            Field::string("srcintf"),
            Field::string("dstintf"),
            Field::string_list("srcaddr"),
            Field::string_list("dstaddr"),
            Field::string("srcaddr6"),
            Field::string("dstaddr6"),
            Field::blocks(
                "custom_service",
                vec![
                    Field::int("id"),
                    Field::string("src_port_range"),
                    Field::string("dst_port_range"),
                ],
            )
            .describe("Only sessions using these custom services are synchronized"),
        ],
    }
}

pub fn firewall_address() -> ResourceSchema {
    ResourceSchema {
        type_name: "firewall_address",
        description: "IPv4 address object of a managed FortiGate",
        url: "/pm/config/device/{device}/vdom/{vdom}/firewall/address",
        scope: Scope::Vdom,
        parents: &[],
        key: Key::Field("name"),
        fields: vec![
            Field::string("name").required().describe("Address name"),
            Field::string("type"),
            Field::string_list("subnet").describe("IP address and netmask"),
            Field::string("start_ip"),
            Field::string("end_ip"),
            Field::string("fqdn"),
            Field::string_list("wildcard_fqdn"),
            Field::string("country"),
            Field::string("comment"),
            Field::int("color"),
            Field::string("associated_interface"),
            Field::string("allow_routing"),
            Field::string("fabric_object"),
            Field::string("uuid").computed(),
            Field::blocks(
                "tagging",
                vec![
                    Field::string("name"),
                    Field::string("category"),
                    Field::string_set("tags"),
                ],
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::schema::{Field, FieldKind, Mode};

    fn check_names(fields: &[Field]) {
        let mut seen = HashSet::new();
        for field in fields {
            assert!(seen.insert(field.name), "duplicate field {}", field.name);
            if let Some(children) = field.children() {
                check_names(children);
            }
        }
    }

    #[test]
    fn unique_type_names() {
        let names: HashSet<_> = all().iter().map(|schema| schema.type_name).collect();
        assert_eq!(names.len(), all().len());
    }

    #[test]
    fn well_formed() {
        for schema in all() {
            check_names(&schema.fields);
            if let Some(key) = schema.key_field() {
                assert_eq!(key.mode, Mode::Required, "{}", schema.type_name);
                assert_eq!(key.kind, FieldKind::String, "{}", schema.type_name);
            } else {
                assert!(schema.is_singleton(), "{} has no key field", schema.type_name);
            }
            for parent in schema.parents {
                assert!(
                    schema.url.contains(&format!("{{{parent}}}")),
                    "{} does not route {parent}",
                    schema.type_name
                );
            }
        }
    }
}
