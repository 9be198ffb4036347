//! Command-line argument parsing and dispatch.
//!
//! Every subcommand is a thin wrapper over the library API; results are
//! printed as CSV rows or, with `--json`, as JSON.

use crate::config::{Config, OutputFormat};
use crate::error::{Error, Result};
use crate::models::{
    binary_with_prefix, parse_cidr, parse_cidr_input, range_to_minimal_prefixes, subnet_meta,
    NormalisedCidr, VlsmRequest, VlsmStrategy,
};
use crate::output;
use crate::processing::{
    allocate_vlsm, calculate_utilization, classify_address, detect_overlaps,
    minimal_covering_supernet, split_by_host_count, split_into_n, summarize_prefixes,
};
use clap::{Parser, Subcommand};
use regex::Regex;
use std::sync::OnceLock;

/// CIDR subnet calculator for IPv4 and IPv6.
#[derive(Parser, Debug, Clone)]
#[command(name = "cidr-subnet-calc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Print JSON instead of CSV rows.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show metadata of a block (`addr/prefix`, `addr,netmask` or a bare address).
    Info { cidr: String },

    /// Split a block into equal parts.
    Split {
        cidr: String,

        /// Number of parts, a power of two.
        #[arg(long, conflicts_with = "hosts", required_unless_present = "hosts")]
        count: Option<u128>,

        /// Usable hosts each part must hold.
        #[arg(long)]
        hosts: Option<u128>,
    },

    /// Reduce blocks to the minimal equivalent list.
    Summarize {
        #[arg(required = true)]
        cidrs: Vec<String>,
    },

    /// Smallest single block covering all inputs.
    Supernet {
        #[arg(required = true)]
        cidrs: Vec<String>,
    },

    /// Minimal blocks covering an inclusive address range.
    Range { start: String, end: String },

    /// Report every overlapping pair.
    Overlaps {
        #[arg(required = true)]
        cidrs: Vec<String>,
    },

    /// Classify an address against well-known ranges.
    Classify { address: String },

    /// Allocate named requests (`name:hosts` or `name/prefix`) inside a parent.
    Vlsm {
        parent: String,

        #[arg(required = true, value_name = "NAME:HOSTS|NAME/PREFIX")]
        requests: Vec<String>,

        /// Block to keep free; repeatable.
        #[arg(long = "reserve", value_name = "CIDR")]
        reserved: Vec<String>,

        /// Placement order, overrides CIDR_CALC_STRATEGY.
        #[arg(long)]
        strategy: Option<VlsmStrategy>,
    },
}

/// Regex for `name:hosts` and `name/prefix` request arguments.
static REQUEST_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_request_regex() -> &'static Regex {
    REQUEST_REGEX.get_or_init(|| {
        Regex::new(r"^(?P<name>[^:/\s]+)(?::(?P<hosts>\d+)|/(?P<prefix>\d+))$")
            .expect("Invalid Regex")
    })
}

/// Parse a `name:hosts` or `name/prefix` argument into a request.
pub fn parse_request(text: &str) -> Result<VlsmRequest> {
    let caps = get_request_regex().captures(text.trim()).ok_or_else(|| {
        Error::format(format!(
            "request '{text}' is not of the form name:hosts or name/prefix"
        ))
    })?;
    let name = &caps["name"];

    if let Some(hosts) = caps.name("hosts") {
        let hosts: u128 = hosts
            .as_str()
            .parse()
            .map_err(|_| Error::range(format!("host count in '{text}' is too large")))?;
        return Ok(VlsmRequest::hosts(name, hosts));
    }
    let prefix = caps
        .name("prefix")
        .map(|m| m.as_str())
        .unwrap_or_default();
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| Error::range(format!("prefix in '{text}' is too large")))?;
    Ok(VlsmRequest::prefix(name, prefix))
}

fn parse_all(texts: &[String]) -> Result<Vec<NormalisedCidr>> {
    texts.iter().map(|t| parse_cidr(t)).collect()
}

/// Run one parsed command line.
pub fn run(cli: &Cli, config: &Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        config.output
    };
    let json = format == OutputFormat::Json;
    log::debug!("run {:?} as {format:?}", cli.command);

    match &cli.command {
        Commands::Info { cidr } => {
            let cidr = parse_cidr_input(cidr)?;
            let meta = subnet_meta(&cidr)?;
            if json {
                output::print_json(&meta)?;
            } else {
                output::print_meta(&meta, &binary_with_prefix(&cidr));
            }
        }
        Commands::Split { cidr, count, hosts } => {
            let cidr = parse_cidr(cidr)?;
            let subnets = match (count, hosts) {
                (Some(n), _) => split_into_n(&cidr, *n)?,
                (None, Some(h)) => split_by_host_count(&cidr, *h)?.subnets,
                (None, None) => {
                    return Err(Error::domain("split needs --count or --hosts").into())
                }
            };
            print_blocks(&subnets, json)?;
        }
        Commands::Summarize { cidrs } => {
            print_blocks(&summarize_prefixes(&parse_all(cidrs)?)?, json)?;
        }
        Commands::Supernet { cidrs } => {
            let supernet = minimal_covering_supernet(&parse_all(cidrs)?)?;
            print_blocks(&[supernet], json)?;
        }
        Commands::Range { start, end } => {
            print_blocks(&range_to_minimal_prefixes(start, end)?, json)?;
        }
        Commands::Overlaps { cidrs } => {
            let result = detect_overlaps(&parse_all(cidrs)?);
            if json {
                output::print_json(&result)?;
            } else {
                output::print_overlaps(&result);
            }
        }
        Commands::Classify { address } => {
            let classes = classify_address(address);
            if classes.is_empty() {
                return Err(Error::format(format!("'{address}' is not an IP address")).into());
            }
            if json {
                output::print_json(&classes)?;
            } else {
                output::print_classes(address, &classes);
            }
        }
        Commands::Vlsm {
            parent,
            requests,
            reserved,
            strategy,
        } => {
            let parent = parse_cidr(parent)?;
            let requests: Vec<VlsmRequest> =
                requests.iter().map(|r| parse_request(r)).collect::<Result<_>>()?;
            let reserved = parse_all(reserved)?;
            let strategy = strategy.unwrap_or(config.strategy);

            let allocations = allocate_vlsm(&parent, &requests, strategy, &reserved)?;
            let usage = calculate_utilization(&parent, &allocations)?;
            if json {
                output::print_json(&serde_json::json!({
                    "strategy": strategy,
                    "allocations": allocations,
                    "utilization": usage,
                }))?;
            } else {
                output::print_allocations(&allocations, &usage)?;
            }
        }
    }
    Ok(())
}

fn print_blocks(
    cidrs: &[NormalisedCidr],
    json: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    if json {
        output::print_json(cidrs)?;
    } else {
        output::print_cidrs(cidrs)?;
    }
    Ok(())
}
