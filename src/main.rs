mod cli;
mod config;
mod core;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::config::{Config, Requirements};
use crate::core::{
    IdeaService, Pipeline, REPORT_FILE_NAME, RunOptions, SmtpMailer, TrendService, TrendSnapshot,
    collect_trends,
};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let needs = match &cli.command {
        Some(Commands::Trends) => Requirements::TRENDS_ONLY,
        Some(Commands::Run { no_email: true, .. }) => Requirements {
            generation: true,
            email: false,
        },
        _ => Requirements::FULL,
    };
    let config = Config::from_env(needs)?;
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Commands::Run { output, no_email }) => {
            run_pipeline(&config, &cli.region, cli.top, output, no_email).await?;
        }
        Some(Commands::Trends) => {
            run_trends(&config, &cli.region, cli.top).await?;
        }
        None => {
            run_pipeline(
                &config,
                &cli.region,
                cli.top,
                PathBuf::from(REPORT_FILE_NAME),
                false,
            )
            .await?;
        }
    }

    Ok(())
}

fn trend_service(config: &Config) -> Result<TrendService> {
    let service = TrendService::new(&config.youtube_api_key, config.timeouts.youtube)?;
    Ok(match &config.youtube_api_base {
        Some(base) => service.with_api_base(base),
        None => service,
    })
}

fn build_pipeline(
    config: &Config,
    region: &str,
    top_n: usize,
    output: PathBuf,
    send_email: bool,
) -> Result<Pipeline<IdeaService, SmtpMailer>> {
    let trends = trend_service(config)?;
    let mut ideas = IdeaService::new(config.openai_key()?, config.timeouts.generation)?;
    if let Some(base) = &config.openai_api_base {
        ideas = ideas.with_api_base(base);
    }
    let mailer = if send_email {
        Some(SmtpMailer::new(config.mail()?, config.timeouts.smtp)?)
    } else {
        None
    };

    Ok(Pipeline::new(
        trends,
        ideas,
        mailer,
        RunOptions {
            region: region.to_string(),
            top_n,
            output,
        },
    ))
}

async fn run_pipeline(
    config: &Config,
    region: &str,
    top_n: usize,
    output: PathBuf,
    no_email: bool,
) -> Result<()> {
    println!("Collecting trending videos for region {region}...");
    let pipeline = build_pipeline(config, region, top_n, output, !no_email)?;
    let summary = pipeline.run().await?;

    println!(
        "Top categories: {}",
        summary.snapshot.top_categories.join(", ")
    );
    println!("Report saved to: {}", summary.report_path.display());

    if summary.delivered {
        println!(
            "✅ Report emailed to {} at {}",
            config.mail()?.recipient,
            summary.finished_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    } else {
        println!("✅ Report generated (email skipped)");
    }

    Ok(())
}

async fn run_trends(config: &Config, region: &str, top_n: usize) -> Result<()> {
    let trends = trend_service(config)?;
    let snapshot = collect_trends(&trends, region, top_n).await?;
    print_snapshot(region, &snapshot);
    Ok(())
}

fn print_snapshot(region: &str, snapshot: &TrendSnapshot) {
    println!(
        "{} trending videos in {region} across {} categories",
        snapshot.records.len(),
        snapshot.stats.len()
    );
    if !snapshot.categories_resolved {
        println!("Category names unavailable; videos are grouped as Unknown.");
    }
    println!();

    let mut stats: Vec<_> = snapshot.stats.iter().collect();
    stats.sort_by(|a, b| {
        b.avg_views
            .total_cmp(&a.avg_views)
            .then_with(|| b.video_count.cmp(&a.video_count))
    });

    println!("{:<4} {:<28} {:>8} {:>14}", "Rank", "Category", "Videos", "Avg views");
    for stat in stats {
        let rank = snapshot
            .top_categories
            .iter()
            .position(|name| *name == stat.category)
            .map(|idx| (idx + 1).to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<28} {:>8} {:>14.1}",
            rank, stat.category, stat.video_count, stat.avg_views
        );
    }
}
