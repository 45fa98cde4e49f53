//! chainaux CLI — inspect and verify checkpoint tables from the terminal.
//!
//! Usage:
//! ```bash
//! # Load a checkpoint file and print the table
//! chainaux verify checkpoints.csv
//!
//! # Check a block hash against the file's pins
//! chainaux check checkpoints.csv 100000 <hash>
//!
//! # Fetch checkpoints published over DNS
//! chainaux dns --domain checkpoints.example.org
//! ```

mod logging;

use std::env;
use std::process;

use chainaux_core::{
    CheckpointConfig, CheckpointStatus, Checkpoints, Hash, HickoryTxtResolver,
    DEFAULT_CHECKPOINT_DNS_DOMAIN,
};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    logging::init_tracing(&logging::LogConfig::from_args(&args[2..]));

    let result = match args[1].as_str() {
        "verify" => cmd_verify(&args[2..]),
        "check" => cmd_check(&args[2..]),
        "dns" => cmd_dns(&args[2..]).await,
        "info" => {
            cmd_info();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("chainaux {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainaux {}", env!("CARGO_PKG_VERSION"));
    println!("Inspect and verify blockchain checkpoint tables\n");
    println!("USAGE:");
    println!("    chainaux <COMMAND> [ARGS] [FLAGS]\n");
    println!("COMMANDS:");
    println!("    verify <FILE>                 Load a checkpoint file and print it");
    println!("    check <FILE> <HEIGHT> <HASH>  Check a block hash against the file");
    println!("    dns                           Fetch checkpoints from DNS TXT records");
    println!("    info                          Show defaults");
    println!("    version                       Print version");
    println!("    help                          Print this help\n");
    println!("FLAGS:");
    println!("    --domain <DOMAIN>  DNS domain for `dns`  [default: {DEFAULT_CHECKPOINT_DNS_DOMAIN}]");
    println!("    --json             Print the table as JSON");
    println!("    --log <LEVEL>      Log filter  [default: warn]");
    println!("    --json-logs        Emit logs as JSON");
}

fn cmd_verify(args: &[String]) -> Result<(), String> {
    let file = args.first().ok_or("checkpoint file is required")?;
    let mut checkpoints = Checkpoints::new();
    let count = checkpoints
        .load_checkpoints_from_file(file)
        .map_err(|e| e.to_string())?;

    print_table(&checkpoints, args)?;
    println!("{count} checkpoint(s) loaded from {file}");
    Ok(())
}

fn cmd_check(args: &[String]) -> Result<(), String> {
    let [file, height, hash, ..] = args else {
        return Err("usage: chainaux check <FILE> <HEIGHT> <HASH>".into());
    };
    let height: u32 = height.parse().map_err(|_| format!("invalid height: {height}"))?;
    let hash: Hash = hash.parse().map_err(|e| format!("{e}"))?;

    let mut checkpoints = Checkpoints::new();
    checkpoints
        .load_checkpoints_from_file(file)
        .map_err(|e| e.to_string())?;

    match checkpoints.check_block(height, &hash) {
        Ok(CheckpointStatus::Passed) => println!("PASSED  height {height} matches checkpoint"),
        Ok(CheckpointStatus::NotCheckpointed) => {
            let zone = if checkpoints.is_in_checkpoint_zone(height) {
                "inside"
            } else {
                "beyond"
            };
            println!("OK      no checkpoint at height {height} ({zone} checkpoint zone)");
        }
        Err(e) => return Err(e.to_string()),
    }
    Ok(())
}

async fn cmd_dns(args: &[String]) -> Result<(), String> {
    let config = CheckpointConfig {
        dns_enabled: true,
        dns_domain: parse_flag(args, "--domain").unwrap_or_else(|| DEFAULT_CHECKPOINT_DNS_DOMAIN.into()),
        ..Default::default()
    };
    let resolver = HickoryTxtResolver::new();

    println!("Querying {}...", config.dns_domain);
    let checkpoints = Checkpoints::bootstrap(&config, &resolver)
        .await
        .map_err(|e| e.to_string())?;

    print_table(&checkpoints, args)?;
    println!("{} checkpoint(s) from DNS", checkpoints.len());
    Ok(())
}

fn cmd_info() {
    println!("chainaux v{}", env!("CARGO_PKG_VERSION"));
    println!("  Checkpoint DNS domain: {DEFAULT_CHECKPOINT_DNS_DOMAIN}");
    println!("  Checkpoint file format: <height>,<64 hex hash> per line");
    println!("  DNS record format: \"<height>:<64 hex hash>\"");
    println!("  Indices: payment id, block timestamp, tx timestamp, generated txs, orphan blocks");
}

fn print_table(checkpoints: &Checkpoints, args: &[String]) -> Result<(), String> {
    if args.iter().any(|a| a == "--json") {
        let json = serde_json::to_string_pretty(checkpoints).map_err(|e| e.to_string())?;
        println!("{json}");
    } else {
        for (height, hash) in checkpoints.iter() {
            println!("{height:>10}  {hash}");
        }
    }
    Ok(())
}

pub(crate) fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
