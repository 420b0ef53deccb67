//! # Chronometer
//!
//! Times a delay with a kernel-resident chronometer reached through stubs.

use chronometer_demo::{measure, DemoError, Microsecond};
use sim_kernel::{boot, KernelConfig};
use std::env;
use std::process;

const DEFAULT_DELAY_US: Microsecond = 1_500_000;

struct Options {
    config: KernelConfig,
    delay_us: Microsecond,
    audit: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let program = program_name(&args);

    let options = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(program);
        process::exit(1);
    });

    if let Err(e) = run(&options) {
        eprintln!("Chronometer error: {}", e);
        process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), DemoError> {
    let gate = boot(&options.config)?;

    println!("Chronometer test");
    println!("Chronometer start.");
    let measurement = measure(&gate, options.delay_us)?;
    println!("Chronometer stop.");
    println!();
    println!("Elapsed time = {} us", measurement.elapsed_us);

    if options.audit {
        match serde_json::to_string_pretty(&gate.audit_log()) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to export audit log: {}", e),
        }
    }

    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        config: KernelConfig::default(),
        delay_us: DEFAULT_DELAY_US,
        audit: false,
    };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                options.config = KernelConfig::load(&args[i])
                    .map_err(|e| format!("Failed to load config file: {}", e))?;
            }
            "--delay" | "-d" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --delay".to_string());
                }
                options.delay_us = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid delay value: {}", args[i]))?;
            }
            "--audit" => {
                options.audit = true;
            }
            "--help" | "-h" => {
                print_usage(program_name(args));
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Name to show in usage text (argv may be empty)
fn program_name(args: &[String]) -> &str {
    args.first().map_or("chronometer", String::as_str)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>   Kernel configuration file (JSON)");
    eprintln!(
        "  -d, --delay <US>      Delay to time, in microseconds (default {})",
        DEFAULT_DELAY_US
    );
    eprintln!("      --audit           Print the gate audit log as JSON");
    eprintln!("  -h, --help            Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn test_program_name_without_arguments() {
        assert_eq!(program_name(&[]), "chronometer");
        assert_eq!(program_name(&args(&["timer"])), "timer");
    }

    #[test]
    fn test_parse_args_without_arguments() {
        let options = parse_args(&[]).unwrap();
        assert_eq!(options.delay_us, DEFAULT_DELAY_US);
        assert!(!options.audit);
    }

    #[test]
    fn test_parse_delay_and_audit() {
        let options = parse_args(&args(&["chronometer", "-d", "2500", "--audit"])).unwrap();
        assert_eq!(options.delay_us, 2500);
        assert!(options.audit);

        assert!(parse_args(&args(&["chronometer", "--delay"])).is_err());
        assert!(parse_args(&args(&["chronometer", "--bogus"])).is_err());
    }
}
