// ARC: Analyzing Network Configurations with Extended Topology Graphs
// Copyright (C) 2021  The ARC Authors
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Test the physical topology layer.

use crate::example_networks::{ExampleNetwork, FirewallNet, TwoRouters};
use crate::graphs::{normalize_interface_name, DeviceGraph, Link, TopologyGraph, VertexKind};
use crate::network::config::*;
use crate::network::{DeviceId, IfaceId, Network, Prefix};
use crate::settings::Settings;
use petgraph::algo::has_path_connecting;
use std::sync::Arc;

fn iface(device: usize, index: usize) -> IfaceId {
    IfaceId { device: DeviceId(device), index }
}

fn p(s: &str) -> Prefix {
    s.parse().unwrap()
}

fn two_routers() -> DeviceGraph {
    let net = Arc::new(TwoRouters::net().unwrap());
    DeviceGraph::new(net, &Settings::default()).unwrap()
}

#[test]
fn test_normalize_interface_name() {
    assert_eq!(normalize_interface_name("Gi0/1"), Some("GigabitEthernet0/1".to_string()));
    assert_eq!(normalize_interface_name("gig1/0/2"), Some("GigabitEthernet1/0/2".to_string()));
    assert_eq!(normalize_interface_name("Te1/1"), Some("TenGigabitEthernet1/1".to_string()));
    assert_eq!(normalize_interface_name("Eth3/4"), Some("Ethernet3/4".to_string()));
    assert_eq!(normalize_interface_name("Po12"), Some("Port-channel12".to_string()));
    assert_eq!(normalize_interface_name("vl100"), Some("Vlan100".to_string()));
    assert_eq!(
        normalize_interface_name("GigabitEthernet0/0"),
        Some("GigabitEthernet0/0".to_string())
    );
    assert_eq!(normalize_interface_name("Serial0"), None);
    assert_eq!(normalize_interface_name("Gi"), None);
}

#[test]
fn test_links_by_subnet() {
    let g = two_routers();
    assert_eq!(g.etg().vertex_count(), 2);
    assert_eq!(g.etg().edge_count(), 1);
    assert_eq!(g.links(), vec![Link::new("a", "b")]);
    assert!(g.links()[0].connects("b", "a"));

    assert_eq!(g.connected_interface(iface(0, 0)), Some(iface(1, 0)));
    assert_eq!(g.connected_interface(iface(1, 0)), Some(iface(0, 0)));
    assert_eq!(g.connected_device(iface(1, 0)), Some(DeviceId(0)));
    // the LAN interfaces are not attached to any link
    assert_eq!(g.connected_interface(iface(0, 1)), None);
    assert_eq!(g.connected_interface(iface(1, 1)), None);
}

#[test]
fn test_links_by_description() {
    let config = NetworkConfig::new()
        .device(
            DeviceConfig::new("a")
                .interface(InterfaceConfig::new("GigabitEthernet0/0").description("INFRA:B:Gi0/1"))
                .interface(InterfaceConfig::new("GigabitEthernet0/1").description("INFRA:c"))
                .interface(InterfaceConfig::new("Vlan10").description("INFRA:c:Gi0/0")),
        )
        .device(
            DeviceConfig::new("b")
                .interface(InterfaceConfig::new("GigabitEthernet0/0"))
                .interface(
                    InterfaceConfig::new("GigabitEthernet0/1")
                        .description("INFRA:core:a:GigabitEthernet0/0"),
                ),
        )
        .device(DeviceConfig::new("c").interface(InterfaceConfig::new("GigabitEthernet0/0")));
    let net = Arc::new(Network::from_config(&config).unwrap());

    let by_subnet = DeviceGraph::new(net.clone(), &Settings::default()).unwrap();
    assert_eq!(by_subnet.etg().edge_count(), 0);

    let settings = Settings { use_descriptions: true, ..Settings::default() };
    let g = DeviceGraph::new(net, &settings).unwrap();
    // malformed descriptions and non-ethernet interfaces are ignored, and the link described on
    // both ends is added once
    assert_eq!(g.links(), vec![Link::new("a", "b")]);
    assert_eq!(g.connected_interface(iface(0, 0)), Some(iface(1, 1)));
    assert_eq!(g.connected_interface(iface(2, 0)), None);
}

#[test]
fn test_port_channel_links() {
    let device = |name: &str, address: &str| {
        DeviceConfig::new(name)
            .interface(InterfaceConfig::new("Port-channel1").prefix(p(address)))
            .interface(InterfaceConfig::new("GigabitEthernet0/0").channel_group(1))
            .interface(InterfaceConfig::new("GigabitEthernet0/1").channel_group(1))
    };
    let config = NetworkConfig::new()
        .device(device("a", "10.0.0.1/30"))
        .device(device("b", "10.0.0.2/30"));
    let net = Arc::new(Network::from_config(&config).unwrap());
    let g = DeviceGraph::new(net, &Settings::default()).unwrap();

    // the link is expanded to the members, but the devices are connected only once
    assert_eq!(g.etg().edge_count(), 1);
    assert_eq!(g.connected_interface(iface(0, 1)), Some(iface(1, 1)));
    assert_eq!(g.connected_interface(iface(0, 0)), None);
}

#[test]
fn test_customize() {
    let mut g = two_routers();
    let flow = TwoRouters::flow(g.network());
    assert!(g.customize(&flow).unwrap());
    assert!(!g.customize(&flow).unwrap());
    assert_eq!(g.flow(), Some(&flow));

    let etg = g.etg();
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let destination = etg.destination_vertex().unwrap();
    let a = etg.vertex_id("a").unwrap();
    let b = etg.vertex_id("b").unwrap();
    assert_eq!(etg.vertex_count(), 4);
    assert!(etg.contains_edge(source, a));
    assert!(etg.contains_edge(b, destination));
    assert!(!etg.contains_edge(source, b));
    assert!(has_path_connecting(etg.graph(), source, destination, None));
    assert_eq!(etg.vertex(source).map(|v| v.kind()), Some(VertexKind::Source));
}

#[test]
fn test_customize_does_not_touch_base() {
    let base = two_routers();
    let mut g = base.clone();
    g.customize(&TwoRouters::flow(base.network())).unwrap();
    assert_eq!(base.etg().vertex_count(), 2);
    assert_eq!(base.etg().edge_count(), 1);
    assert_eq!(base.flow(), None);
}

#[test]
fn test_remove_link() {
    let mut g = two_routers();
    let flow = TwoRouters::flow(g.network());
    g.customize(&flow).unwrap();

    // the direction of the link does not matter
    g.remove_link(&Link::new("b", "a"));
    let etg = g.etg();
    assert_eq!(etg.edge_count(), 2);
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let destination = etg.destination_vertex().unwrap();
    assert!(!has_path_connecting(etg.graph(), source, destination, None));
}

#[test]
fn test_blocked_source() {
    let net = Arc::new(FirewallNet::net().unwrap());
    let flow = FirewallNet::flow(&net);
    let mut g = DeviceGraph::new(net, &Settings::default()).unwrap();
    g.customize(&flow).unwrap();

    let etg = g.etg();
    let source = etg.source_vertex(flow.source.as_ref().unwrap()).unwrap();
    let a = etg.vertex_id("a").unwrap();
    let e = etg.find_edge(source, a).unwrap();
    assert!(etg.edge(e).unwrap().blocked);

    // the reverse flow passes the filter
    let reverse = crate::policy::Flow::new(flow.destination.clone(), flow.source.clone().unwrap());
    let mut g = DeviceGraph::new(g.network().clone(), &Settings::default()).unwrap();
    g.customize(&reverse).unwrap();
    let etg = g.etg();
    let destination = etg.destination_vertex().unwrap();
    let e = etg.find_edge(a, destination).unwrap();
    assert!(!etg.edge(e).unwrap().blocked);
}
