use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::debug;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::PathBuf;

use iskhour_core::{
    MAX_OVERGRID, PayoutTable, PerformanceRecord, WalletBreakdown, decode, encode,
    parse_wallet_breakdown,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportFormat {
    /// Human-readable console output
    Console,
    /// Machine-readable JSON
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "iskhour", version)]
#[command(about = "ISK/h calculator - parse incursion wallet pastes, mint and decode share tokens")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse pasted wallet journal text and print a summary plus share token
    Parse {
        /// File containing the wallet paste; stdin when omitted
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
    },
    /// Decode a share token and print the record it carries
    Decode {
        /// The token, including its leading version character
        token: String,

        /// Output report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
        report: ReportFormat,
    },
    /// Print the payout reference table
    Table,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Parse { input, report } => run_parse(input, report),
        Command::Decode { token, report } => run_decode(&token, report),
        Command::Table => run_table(),
    }
}

fn read_wallet_text(input: Option<&PathBuf>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read wallet paste from {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read wallet paste from stdin")?;
            Ok(text)
        }
    }
}

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    token: &'a str,
    #[serde(flatten)]
    breakdown: &'a WalletBreakdown,
}

fn run_parse(input: Option<PathBuf>, report: ReportFormat) -> Result<()> {
    let text = read_wallet_text(input.as_ref())?;
    let table = PayoutTable::shared();
    let Some(breakdown) = parse_wallet_breakdown(&text, table) else {
        bail!(
            "not enough data: paste at least two incursion payouts with distinct timestamps"
        );
    };
    debug!(
        "parsed {} payout rows into {} sites",
        breakdown.rows.len(),
        breakdown.record.sites
    );

    let token = encode(&breakdown.record).context("record could not be encoded")?;
    match report {
        ReportFormat::Json => {
            let payload = ParseReport {
                token: &token,
                breakdown: &breakdown,
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        ReportFormat::Console => {
            print_record(&breakdown.record);
            println!();
            println!("{} {}", "Share token:".bold(), token.bright_cyan());
        }
    }
    Ok(())
}

fn run_decode(token: &str, report: ReportFormat) -> Result<()> {
    let record = match decode(token) {
        Ok(record) => record,
        Err(err) => {
            debug!("decode failed: {err}");
            bail!("token could not be decoded");
        }
    };
    match report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
        ReportFormat::Console => print_record(&record),
    }
    Ok(())
}

fn print_record(record: &PerformanceRecord) {
    if let Some(rate) = record.isk_per_hour() {
        println!("{}", format!("{} ISK/h", group_digits(rate)).bold());
    }
    println!(
        "{} ISK + {} LP",
        group_digits(record.isk),
        group_digits(record.lp)
    );
    println!("{} sites completed", record.sites);
    if record.chars > 1 {
        println!("{} characters included in payout calculation", record.chars);
    }
    let average = record
        .average_gap()
        .map_or_else(|| "-".to_string(), format_duration);
    println!(
        "site times {} ~ {} (average {average})",
        format_duration(record.min_time),
        format_duration(record.max_time),
    );
    println!(
        "session of {} starting at unix {}",
        format_duration(record.duration()),
        record.start_time
    );
}

fn run_table() -> Result<()> {
    let table = PayoutTable::shared();
    let mut entries: Vec<_> = table.entries().collect();
    entries.sort_by(|a, b| b.payout.cmp(&a.payout));

    println!(
        "{:<24} {:>13} {:>7} {:>8}",
        "Site".bold(),
        "Payout".bold(),
        "LP".bold(),
        "On grid".bold()
    );
    for entry in entries {
        let on_grid = entry
            .on_grid
            .map_or_else(|| "-".to_string(), |count| count.to_string());
        println!(
            "{:<24} {:>13} {:>7} {:>8}",
            entry.label,
            group_digits(entry.payout),
            group_digits(entry.lp),
            on_grid
        );
    }
    debug!(
        "{} entries across overgrid 0..={MAX_OVERGRID}",
        table.len()
    );
    Ok(())
}

fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {secs:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs:02}s")
    } else {
        format!("{secs}s")
    }
}
