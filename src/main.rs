//! Scaffold - CIDR address planning for VPC templates
//!
//! Plans subnet ranges for VPC templates from a TOML configuration,
//! and exposes the underlying allocator on the command line.

mod cli;

use cli::{Cli, Commands};
use scaffold::error::{Error, Result};
use scaffold::manifest::{self, ScaffoldConfig, VpcConfig};
use scaffold::network::{CidrBlock, CidrBlockAllocator, SubnetPlan};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse_args();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Plan {
            name,
            cidr,
            region,
            availability_zones,
            public_size,
            private_size,
            order,
            json,
        } => {
            let flags = VpcConfig {
                name,
                cidr: cidr.as_deref().map(CidrBlock::parse).transpose()?,
                region,
                availability_zones,
                public_size,
                private_size,
                order,
            };
            let config = plan_config(&cli.config, flags)?;

            let plan = config.planner()?.plan()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                print!("{}", render_plan(&plan));
            }
        }

        Commands::Alloc { cidr, sizes, json } => {
            let mut allocator = CidrBlockAllocator::from_cidr_str(&cidr)?;
            let (issued, failure) = allocate_all(&mut allocator, &sizes);

            if json {
                println!("{}", serde_json::to_string_pretty(&issued)?);
            } else {
                print!("{}", render_allocations(&issued));
                if failure.is_none() {
                    println!("\n{} addresses left in {}", allocator.remaining(), cidr);
                }
            }

            if let Some(e) = failure {
                return Err(e);
            }
        }

        Commands::Inspect { cidrs, json } => {
            let reports = inspect(&cidrs)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print!("{}", render_reports(&reports));
            }
        }

        Commands::Completion { shell } => {
            Cli::generate_completion(shell);
        }
    }

    Ok(())
}

/// Load the config files (if any), then let command-line flags override them
fn plan_config(paths: &[PathBuf], flags: VpcConfig) -> Result<ScaffoldConfig> {
    let config = match paths {
        [] => ScaffoldConfig::default(),
        [path] => manifest::load(path)?,
        paths => manifest::load_merged(paths)?,
    };

    let config = config.merge(ScaffoldConfig { vpc: flags });
    config.validate()?;
    Ok(config)
}

/// One block issued by the `alloc` command
#[derive(Debug, Serialize)]
struct Allocation {
    requested: u32,
    cidr: CidrBlock,
}

/// Allocate `sizes` in order, stopping at the first failure
///
/// Blocks issued before the failure are returned alongside it.
fn allocate_all(allocator: &mut CidrBlockAllocator, sizes: &[u32]) -> (Vec<Allocation>, Option<Error>) {
    let mut issued = Vec::with_capacity(sizes.len());

    for &requested in sizes {
        match allocator.alloc(requested) {
            Ok(cidr) => issued.push(Allocation { requested, cidr }),
            Err(e) => return (issued, Some(e)),
        }
    }

    (issued, None)
}

fn render_allocations(issued: &[Allocation]) -> String {
    let mut out = String::new();
    for a in issued {
        let _ = writeln!(out, "{:>8} -> {}", a.requested, a.cidr);
    }
    out
}

/// Output row for the `inspect` command
#[derive(Debug, Serialize)]
struct BlockReport {
    cidr: CidrBlock,
    address: String,
    netmask: String,
    prefix_len: u8,
    block_size: u64,
}

impl From<CidrBlock> for BlockReport {
    fn from(cidr: CidrBlock) -> Self {
        Self {
            cidr,
            address: cidr.ip_str(),
            netmask: cidr.mask_str(),
            prefix_len: cidr.mask_size(),
            block_size: cidr.block_size(),
        }
    }
}

fn inspect(cidrs: &[String]) -> Result<Vec<BlockReport>> {
    cidrs
        .iter()
        .map(|s| CidrBlock::parse(s).map(BlockReport::from))
        .collect()
}

fn render_reports(reports: &[BlockReport]) -> String {
    let mut out = String::new();
    for r in reports {
        let _ = writeln!(out, "{}", r.cidr);
        let _ = writeln!(out, "  Address:    {}", r.address);
        let _ = writeln!(out, "  Netmask:    {}", r.netmask);
        let _ = writeln!(out, "  Prefix:     /{}", r.prefix_len);
        let _ = writeln!(out, "  Addresses:  {}", r.block_size);
    }
    out
}

fn render_plan(plan: &SubnetPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "VPC {} {} ({})", plan.name, plan.vpc_cidr, plan.region);
    let _ = writeln!(out);
    let _ = writeln!(out, "{:<32} {:<8} {:<16} {}", "SUBNET", "TIER", "ZONE", "CIDR");
    for s in &plan.subnets {
        let _ = writeln!(
            out,
            "{:<32} {:<8} {:<16} {}",
            s.name,
            s.tier.to_string(),
            s.availability_zone,
            s.cidr
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{} addresses unallocated", plan.unallocated);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaffold::network::SubnetOrder;
    use std::fs;

    fn write_config(tag: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scaffold-main-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scaffold.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_flags_override_config() {
        let path = write_config(
            "override",
            "[vpc]\nname = \"Core\"\ncidr = \"10.0.0.0/16\"\nregion = \"eu-west-1\"\npublic_size = 512\n",
        );

        let flags = VpcConfig {
            cidr: Some(CidrBlock::parse("10.9.0.0/16").unwrap()),
            availability_zones: Some(vec!["a".to_string()]),
            order: Some(SubnetOrder::Grouped),
            ..Default::default()
        };
        let config = plan_config(&[path.clone()], flags).unwrap();

        // Flags win where set; the file supplies the rest
        assert_eq!(config.vpc.cidr.unwrap().to_string(), "10.9.0.0/16");
        assert_eq!(config.vpc.name.as_deref(), Some("Core"));
        assert_eq!(config.vpc.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.vpc.public_size, Some(512));

        let plan = config.planner().unwrap().plan().unwrap();
        let got: Vec<(String, String)> = plan
            .subnets
            .iter()
            .map(|s| (s.name.clone(), s.cidr.to_string()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("CorePrivateSubnetA".to_string(), "10.9.0.0/21".to_string()),
                ("CorePublicSubnetA".to_string(), "10.9.8.0/23".to_string()),
            ]
        );

        fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }

    #[test]
    fn test_flags_without_config() {
        let flags = VpcConfig {
            name: Some("Edge".to_string()),
            ..Default::default()
        };
        let config = plan_config(&[], flags).unwrap();
        let plan = config.planner().unwrap().plan().unwrap();
        assert_eq!(plan.vpc_cidr.to_string(), "172.16.0.0/16");
        assert_eq!(plan.subnets[0].name, "EdgePublicSubnetA");
    }

    #[test]
    fn test_flags_are_validated() {
        let flags = VpcConfig {
            public_size: Some(70000),
            ..Default::default()
        };
        assert!(matches!(plan_config(&[], flags), Err(Error::ConfigValidation(_))));
    }

    #[test]
    fn test_alloc_stops_at_first_failure() {
        let mut allocator = CidrBlockAllocator::from_cidr_str("192.168.0.0/24").unwrap();
        let (issued, failure) = allocate_all(&mut allocator, &[64, 100, 512, 16]);

        let cidrs: Vec<String> = issued.iter().map(|a| a.cidr.to_string()).collect();
        assert_eq!(cidrs, ["192.168.0.0/26", "192.168.0.128/25"]);
        assert!(matches!(
            failure,
            Some(Error::AddressSpaceExhausted { requested: 512, .. })
        ));
        // The trailing request was never attempted
        assert_eq!(allocator.remaining(), 0);

        let text = render_allocations(&issued);
        assert_eq!(text, "      64 -> 192.168.0.0/26\n     100 -> 192.168.0.128/25\n");
    }

    #[test]
    fn test_alloc_all_succeed() {
        let mut allocator = CidrBlockAllocator::from_cidr_str("10.0.0.0/8").unwrap();
        let (issued, failure) = allocate_all(&mut allocator, &[16, 256, 1024, 2047]);

        assert!(failure.is_none());
        let cidrs: Vec<String> = issued.iter().map(|a| a.cidr.to_string()).collect();
        assert_eq!(cidrs, ["10.0.0.0/28", "10.0.1.0/24", "10.0.4.0/22", "10.0.8.0/21"]);
    }

    #[test]
    fn test_inspect_rows() {
        let reports = inspect(&["172.16.8.0/21".to_string()]).unwrap();
        assert_eq!(
            render_reports(&reports),
            "172.16.8.0/21\n  Address:    172.16.8.0\n  Netmask:    255.255.248.0\n  Prefix:     /21\n  Addresses:  2048\n"
        );

        let err = inspect(&["10.0.0.0/8".to_string(), "nope".to_string()]).unwrap_err();
        assert!(matches!(err, Error::MalformedCidr(s) if s == "nope"));
    }

    #[test]
    fn test_render_plan() {
        let config = plan_config(
            &[],
            VpcConfig {
                name: Some("Core".to_string()),
                availability_zones: Some(vec!["a".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
        let text = render_plan(&config.planner().unwrap().plan().unwrap());

        assert!(text.starts_with("VPC Core 172.16.0.0/16 (us-west-2)\n"));
        assert!(text.contains("CorePublicSubnetA"));
        assert!(text.contains("172.16.8.0/21"));
        assert!(text.ends_with("61440 addresses unallocated\n"));
    }
}
