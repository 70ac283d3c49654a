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

use arc::construct::{
    enumerate_flows, generate_flow_etgs, generate_interface_etgs, plan_flows, FlowEtgs,
};
use arc::graphs::{
    Canonicalizer, DeviceGraph, InterfaceGraph, Link, ProcessGraph, RankCanonicalizer,
    TopologyGraph,
};
use arc::maxflow::FlowCache;
use arc::network::config::NetworkConfig;
use arc::network::{Network, Protocol};
use arc::policy::Flow;
use arc::verifiers::*;
use arc::Settings;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::*;
use std::collections::BTreeMap;
use std::error::Error;
use std::fs;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

mod example_topologies;
use example_topologies::Topology;

fn main() -> Result<(), Box<dyn Error>> {
    // run clap
    let args = CommandLineArguments::parse();

    // initialize the env logger
    pretty_env_logger::init();

    let settings = args.settings.load()?;
    let config = args.network.load()?;
    let net = Arc::new(Network::from_config(&config)?);

    match args.cmd {
        MainCommand::Summary => summary(&net, &settings)?,
        MainCommand::Flows { filter } => {
            let flows = filter.apply(enumerate_flows(&net, &settings));
            let plan = plan_flows(&net, &flows);
            for planned in plan.queue.iter() {
                println!("{} (serves {} flows)", planned, plan.served_flows(planned).len());
            }
            info!("{} flows, {} graphs", plan.num_flows(), plan.queue.len());
        }
        MainCommand::Verify { property, max_failures, failed_links, filter, json } => {
            let failed = failed_links
                .iter()
                .map(|l| parse_link(l))
                .collect::<Result<Vec<Link>, String>>()?;
            let flows = filter.apply(enumerate_flows(&net, &settings));
            let devices = DeviceGraph::new(net.clone(), &settings)?;
            let processes = ProcessGraph::new(&devices, &settings)?;
            let start = Instant::now();
            let etgs = generate(&processes, &net, &flows, &failed, &settings)?;
            info!("Generated {} ETGs in {:?}", etgs.len(), start.elapsed());
            let results = if settings.interface_based {
                let etgs = generate_interface_etgs(&etgs, &settings)?;
                verify(etgs, property, max_failures, &settings)?
            } else {
                verify(etgs, property, max_failures, &settings)?
            };
            report(&results, json)?;
        }
        MainCommand::Equivalent { other, filter, structure_only, json } => {
            let other: NetworkConfig = serde_json::from_str(&fs::read_to_string(&other)?)?;
            let other_net = Arc::new(Network::from_config(&other)?);
            let flows = filter.apply(enumerate_flows(&net, &settings));
            let mine = Arc::new(build_etgs(&net, &flows, &[], &settings)?);
            let theirs = Arc::new(build_etgs(&other_net, &flows, &[], &settings)?);
            let canonicalizer: Option<Arc<dyn Canonicalizer>> =
                if structure_only { None } else { Some(Arc::new(RankCanonicalizer)) };
            let verifier = Arc::new(Equivalent::new(mine, canonicalizer));
            let results = verify_all(verifier, &theirs, &settings)?;
            report(&results, json)?;
        }
    }
    Ok(())
}

/// Print the size of every graph layer
fn summary(net: &Arc<Network>, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let devices = DeviceGraph::new(net.clone(), settings)?;
    let processes = ProcessGraph::new(&devices, settings)?;
    let instances = processes.instance_graph();
    let interfaces = InterfaceGraph::new(&processes)?;

    println!("devices:        {}", net.devices().len());
    println!("policy groups:  {}", net.policy_groups().len());
    println!("links:          {}", devices.links().len());
    for protocol in [Protocol::Bgp, Protocol::Ospf, Protocol::Static].iter() {
        println!(
            "{:<15} {} processes, {} instances",
            format!("{}:", protocol),
            processes.number_of_type(*protocol),
            instances.number_of_type(*protocol)
        );
    }
    println!(
        "process graph:  {} vertices, {} edges",
        processes.etg().vertex_count(),
        processes.etg().edge_count()
    );
    println!(
        "interface graph: {} vertices, {} edges",
        interfaces.etg().vertex_count(),
        interfaces.etg().edge_count()
    );
    println!("instances:      {}", instances.instances().len());
    for instance in instances.instances() {
        let parents: Vec<String> = instances
            .parents(instance.id())
            .into_iter()
            .filter_map(|p| instances.instance(p).map(|i| i.name().to_string()))
            .collect();
        let size = instance.processes().len();
        println!("    {} ({} processes) <- [{}]", instance, size, parents.join(", "));
    }
    if instances.has_cycles() {
        println!("route redistribution between instances is cyclic");
    }
    Ok(())
}

/// Flow-specific process graphs, with the given links failed
fn build_etgs(
    net: &Arc<Network>,
    flows: &[Flow],
    failed: &[Link],
    settings: &Settings,
) -> Result<FlowEtgs<ProcessGraph>, Box<dyn Error>> {
    let devices = DeviceGraph::new(net.clone(), settings)?;
    let processes = ProcessGraph::new(&devices, settings)?;
    generate(&processes, net, flows, failed, settings)
}

fn generate<G: TopologyGraph + 'static>(
    base: &G,
    net: &Network,
    flows: &[Flow],
    failed: &[Link],
    settings: &Settings,
) -> Result<FlowEtgs<G>, Box<dyn Error>> {
    let mut base = base.clone();
    base.remove_links(failed);
    let plan = plan_flows(net, flows);
    Ok(generate_flow_etgs(&base, &plan, settings)?)
}

fn verify<G: TopologyGraph + 'static>(
    etgs: FlowEtgs<G>,
    property: Property,
    max_failures: usize,
    settings: &Settings,
) -> Result<BTreeMap<Flow, bool>, Box<dyn Error>> {
    let etgs = Arc::new(etgs);
    let start = Instant::now();
    let results = match property {
        Property::AlwaysReachable => {
            let cache = Arc::new(FlowCache::new());
            let verifier = Arc::new(AlwaysReachable::new(etgs, cache.clone()));
            let results = verify_all(verifier, &max_failures, settings)?;
            debug!("Flow cache: {} hits, {} misses", cache.hits(), cache.misses());
            results
        }
        Property::AlwaysBlocked => verify_all(Arc::new(AlwaysBlocked::new(etgs)), &(), settings)?,
        Property::CurrentlyBlocked => {
            verify_all(Arc::new(CurrentlyBlocked::new(etgs)), &(), settings)?
        }
    };
    info!("Verified {} flows in {:?}", results.len(), start.elapsed());
    Ok(results)
}

/// Print the results, and write them to a JSON file if requested.
fn report(results: &BTreeMap<Flow, bool>, json: Option<String>) -> Result<(), Box<dyn Error>> {
    for (flow, result) in results.iter() {
        println!("{}: {}", flow, result);
    }
    let holds = results.values().filter(|r| **r).count();
    info!("Property holds for {} of {} flows", holds, results.len());
    if let Some(path) = json {
        let by_name: BTreeMap<String, bool> =
            results.iter().map(|(f, r)| (f.to_string(), *r)).collect();
        fs::write(&path, serde_json::to_string_pretty(&by_name)?)?;
        info!("Results written to {}", path);
    }
    Ok(())
}

/// Parse a link given as `a:b`
fn parse_link(link: &str) -> Result<Link, String> {
    match link.split(':').collect::<Vec<_>>().as_slice() {
        [a, b] if !a.is_empty() && !b.is_empty() => Ok(Link::new(*a, *b)),
        _ => Err(format!("Invalid link {:?}, expected <device>:<device>", link)),
    }
}

/// Compile network configurations into extended topology graphs and verify properties on them.
#[derive(Parser, Debug)]
#[command(name = "arc", author = "The ARC Authors")]
struct CommandLineArguments {
    /// Network to analyze
    #[command(flatten)]
    network: NetworkSelection,
    /// Settings overrides
    #[command(flatten)]
    settings: SettingsArguments,
    /// Action to perform
    #[command(subcommand)]
    cmd: MainCommand,
}

#[derive(Subcommand, Debug)]
enum MainCommand {
    /// Print the size of the graph layers and the routing instances
    #[command(name = "summary")]
    Summary,
    /// List the flows and the graphs constructed for them
    #[command(name = "flows")]
    Flows {
        #[command(flatten)]
        filter: FlowFilter,
    },
    /// Verify a property for every flow
    #[command(name = "verify")]
    Verify {
        /// Property to verify
        #[arg(value_enum)]
        property: Property,
        /// Number of link failures to tolerate (always-reachable only)
        #[arg(short = 'k', long, default_value = "0")]
        max_failures: usize,
        /// Links to fail before verifying, as `<device>:<device>`
        #[arg(short = 'l', long = "fail")]
        failed_links: Vec<String>,
        #[command(flatten)]
        filter: FlowFilter,
        /// Store the results in a json file
        #[arg(long = "json")]
        json: Option<String>,
    },
    /// Compare the graphs of every flow with the graphs of another configuration
    #[command(name = "equivalent")]
    Equivalent {
        /// JSON configuration to compare with
        other: String,
        #[command(flatten)]
        filter: FlowFilter,
        /// Compare the structure only, ignoring the edge weights
        #[arg(long)]
        structure_only: bool,
        /// Store the results in a json file
        #[arg(long = "json")]
        json: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Property {
    AlwaysReachable,
    AlwaysBlocked,
    CurrentlyBlocked,
}

#[derive(Args, Debug)]
struct NetworkSelection {
    /// JSON file with the network configuration
    #[arg(short = 'c', long, conflicts_with = "example")]
    config: Option<String>,
    /// Use an example network instead of a configuration file
    #[arg(short = 'e', long, value_enum)]
    example: Option<Topology>,
}

impl NetworkSelection {
    fn load(&self) -> Result<NetworkConfig, Box<dyn Error>> {
        match (self.config.as_ref(), self.example) {
            (Some(path), _) => {
                info!("Loading the network from {}", path);
                Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
            }
            (None, Some(topology)) => {
                info!("Using the example network {}", topology);
                Ok(topology.config())
            }
            (None, None) => Err("Either --config or --example is required".into()),
        }
    }
}

#[derive(Args, Debug)]
struct SettingsArguments {
    /// JSON file with the settings. The flags below override it.
    #[arg(short = 's', long = "settings")]
    file: Option<String>,
    /// Abort when an assumption about the configuration is violated
    #[arg(long)]
    strict: bool,
    /// Find links by interface descriptions instead of shared subnets
    #[arg(long)]
    use_descriptions: bool,
    /// Prune blocked edges and dead vertices from every graph
    #[arg(long)]
    prune: bool,
    /// Verify on the interface graph instead of the process graph
    #[arg(long)]
    interface_based: bool,
    /// Only consider flows between internal policy groups
    #[arg(long)]
    internal_only: bool,
    /// Skip policy groups with fewer addresses
    #[arg(long)]
    min_hosts: Option<u64>,
    /// Generate and verify on multiple threads
    #[arg(short = 'p', long)]
    parallel: bool,
    /// Number of worker threads (one per CPU by default)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
    /// Log the time spent on every flow
    #[arg(long)]
    per_flow_timing: bool,
}

impl SettingsArguments {
    fn load(&self) -> Result<Settings, Box<dyn Error>> {
        let mut settings: Settings = match self.file.as_ref() {
            Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
            None => Settings::default(),
        };
        settings.warn_assumptions &= !self.strict;
        settings.use_descriptions |= self.use_descriptions;
        settings.prune |= self.prune;
        settings.interface_based |= self.interface_based;
        settings.internal_only |= self.internal_only;
        settings.parallelize |= self.parallel || self.threads.is_some();
        settings.per_flow_timing |= self.per_flow_timing;
        if let Some(min_hosts) = self.min_hosts {
            settings.min_hosts = min_hosts;
        }
        if self.threads.is_some() {
            settings.n_threads = self.threads;
        }
        debug!("{:?}", settings);
        Ok(settings)
    }
}

#[derive(Args, Debug)]
struct FlowFilter {
    /// Only flows whose source group contains this address
    #[arg(long)]
    from: Option<Ipv4Addr>,
    /// Only flows whose destination group contains this address
    #[arg(long)]
    to: Option<Ipv4Addr>,
}

impl FlowFilter {
    fn apply(&self, flows: Vec<Flow>) -> Vec<Flow> {
        flows
            .into_iter()
            .filter(|f| {
                self.from.map_or(true, |ip| f.source.as_ref().map_or(false, |s| s.contains_ip(ip)))
            })
            .filter(|f| self.to.map_or(true, |ip| f.destination.contains_ip(ip)))
            .collect()
    }
}
