use crate::core::ranking::DEFAULT_TOP_N;
use crate::core::{REPORT_FILE_NAME, TREND_BATCH_SIZE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "trendio")]
#[command(about = "YouTube trend analyzer and AI channel idea reporter")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Two-letter region code for the trending chart
    #[arg(long, global = true, default_value = "US", value_parser = parse_region)]
    pub region: String,

    /// Number of top categories handed to idea generation
    #[arg(long, global = true, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
    pub top: usize,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch trends, generate channel ideas, write the spreadsheet and email it
    Run {
        /// Where to write the spreadsheet report
        #[arg(short, long, default_value = REPORT_FILE_NAME)]
        output: PathBuf,

        /// Write the report but do not send the email
        #[arg(long)]
        no_email: bool,
    },

    /// Show the current category ranking without generating ideas or sending mail
    Trends,
}

fn parse_region(raw: &str) -> Result<String, String> {
    let code = raw.trim();
    if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(format!("expected a two-letter region code, got {raw:?}"))
    }
}

fn parse_top_n(raw: &str) -> Result<usize, String> {
    let max = TREND_BATCH_SIZE as usize;
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=max).contains(&n) => Ok(n),
        _ => Err(format!("expected a number between 1 and {max}, got {raw:?}")),
    }
}
