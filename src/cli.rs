use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use scanguard::application::dto::OutputFormat;
use scanguard::scan_orchestration::domain::{ScanConfig, ScanDepth, ScanSeverity, ScanType};

/// Security-scan orchestration: detection, anomaly analysis, exploit validation and risk scoring
#[derive(Parser, Debug)]
#[command(name = "scanguard")]
#[command(version)]
#[command(about = "Scan targets for vulnerabilities, schedule rescans and notify webhooks", long_about = None)]
pub struct Args {
    /// Path to a config file (defaults to ./scanguard.config.yml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG / SCANGUARD_LOG take precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scan and print its report
    Scan(ScanArgs),
    /// Run the scheduler until interrupted
    Daemon(DaemonArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ScanArgs {
    /// URL, API endpoint or file name to scan
    #[arg(short, long)]
    pub target: String,

    /// Target type: url, api or file
    #[arg(short = 'T', long = "type", default_value = "url")]
    pub scan_type: ScanType,

    /// File whose content is inspected (for file scans)
    #[arg(long, value_name = "PATH")]
    pub content_file: Option<PathBuf>,

    /// Scan depth: basic, standard or comprehensive
    #[arg(short, long)]
    pub depth: Option<ScanDepth>,

    /// Skip the anomaly analysis stage
    #[arg(long)]
    pub no_ai: bool,

    /// Skip exploit validation
    #[arg(long)]
    pub no_pentest: bool,

    /// Deadline for the whole scan in seconds (1-3600)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format: json or text
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when the scan severity is at or above this level
    #[arg(long, value_name = "SEVERITY")]
    pub fail_on: Option<ScanSeverity>,
}

impl ScanArgs {
    /// Applies command-line overrides on top of the configured defaults
    pub fn scan_config(&self, base: ScanConfig) -> ScanConfig {
        ScanConfig {
            scan_depth: self.depth.unwrap_or(base.scan_depth),
            enable_ai_analysis: base.enable_ai_analysis && !self.no_ai,
            enable_penetration_testing: base.enable_penetration_testing && !self.no_pentest,
            timeout: self.timeout.unwrap_or(base.timeout),
            ..base
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct DaemonArgs {
    /// Run a single scheduler tick and exit
    #[arg(long)]
    pub once: bool,

    /// Seconds between scheduler ticks (overrides the config file)
    #[arg(long, value_name = "SECONDS")]
    pub tick_interval: Option<u64>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_scan_defaults() {
        let args = parse(&["scanguard", "scan", "--target", "https://example.com"]);
        let Command::Scan(scan) = args.command else {
            panic!("expected scan command");
        };
        assert_eq!(scan.scan_type, ScanType::Url);
        assert!(matches!(scan.format, OutputFormat::Text));
        assert_eq!(scan.scan_config(ScanConfig::default()), ScanConfig::default());
    }

    #[test]
    fn test_scan_overrides() {
        let args = parse(&[
            "scanguard",
            "scan",
            "-t",
            "app.js",
            "-T",
            "file",
            "--depth",
            "comprehensive",
            "--no-pentest",
            "--timeout",
            "30",
            "-f",
            "json",
            "--fail-on",
            "high",
        ]);
        let Command::Scan(scan) = args.command else {
            panic!("expected scan command");
        };
        let config = scan.scan_config(ScanConfig::default());
        assert_eq!(config.scan_depth, ScanDepth::Comprehensive);
        assert!(config.enable_ai_analysis);
        assert!(!config.enable_penetration_testing);
        assert_eq!(config.timeout, 30);
        assert_eq!(scan.fail_on, Some(ScanSeverity::High));
    }

    #[test]
    fn test_flags_cannot_reenable_disabled_stages() {
        let args = parse(&["scanguard", "scan", "-t", "https://example.com"]);
        let Command::Scan(scan) = args.command else {
            panic!("expected scan command");
        };
        let base = ScanConfig {
            enable_ai_analysis: false,
            ..ScanConfig::default()
        };
        assert!(!scan.scan_config(base).enable_ai_analysis);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Args::try_parse_from(["scanguard", "scan", "-t", "x", "-T", "ftp"]).is_err());
        assert!(Args::try_parse_from(["scanguard", "scan", "-t", "x", "-f", "xml"]).is_err());
        assert!(Args::try_parse_from(["scanguard", "scan"]).is_err());
    }

    #[test]
    fn test_daemon_with_global_config() {
        let args = parse(&["scanguard", "daemon", "--once", "--config", "custom.yml"]);
        assert_eq!(args.config, Some(PathBuf::from("custom.yml")));
        let Command::Daemon(daemon) = args.command else {
            panic!("expected daemon command");
        };
        assert!(daemon.once);
        assert!(daemon.tick_interval.is_none());
    }
}
