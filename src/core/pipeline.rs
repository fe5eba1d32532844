use crate::core::aggregate::{CategoryStat, VideoRecord, build_records, category_stats};
use crate::core::ideas::IdeaSource;
use crate::core::mailer::ReportDelivery;
use crate::core::ranking::rank_categories;
use crate::core::spreadsheet::{build_workbook, save_report};
use crate::core::trending::{TrendService, distinct_category_ids};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub region: String,
    pub top_n: usize,
    pub output: PathBuf,
}

/// Records, per-category statistics and the ranked category names for one batch.
#[derive(Debug, Clone)]
pub struct TrendSnapshot {
    pub records: Vec<VideoRecord>,
    pub stats: Vec<CategoryStat>,
    pub top_categories: Vec<String>,
    pub categories_resolved: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub snapshot: TrendSnapshot,
    pub report_path: PathBuf,
    pub delivered: bool,
    pub finished_at: DateTime<Utc>,
}

/// Fetch, resolve, aggregate and rank. Only the fetch can fail; nothing here talks to
/// the generative service or the mail relay.
pub async fn collect_trends(
    trends: &TrendService,
    region: &str,
    top_n: usize,
) -> Result<TrendSnapshot> {
    let videos = trends.fetch_trending(region).await?;

    let category_ids = distinct_category_ids(&videos);
    let categories = trends.resolve_categories(&category_ids, region).await;

    let records = build_records(&videos, &categories);
    let stats = category_stats(&records);
    let top_categories = rank_categories(&stats, top_n);
    info!(
        records = records.len(),
        categories = stats.len(),
        top = ?top_categories,
        "aggregated trending videos"
    );

    Ok(TrendSnapshot {
        records,
        stats,
        top_categories,
        categories_resolved: categories.is_resolved(),
    })
}

pub struct Pipeline<I, D> {
    trends: TrendService,
    ideas: I,
    delivery: Option<D>,
    options: RunOptions,
}

impl<I, D> Pipeline<I, D>
where
    I: IdeaSource,
    D: ReportDelivery,
{
    pub fn new(trends: TrendService, ideas: I, delivery: Option<D>, options: RunOptions) -> Self {
        Self {
            trends,
            ideas,
            delivery,
            options,
        }
    }

    pub async fn collect_trends(&self) -> Result<TrendSnapshot> {
        collect_trends(&self.trends, &self.options.region, self.options.top_n).await
    }

    /// Runs every stage in order. Any failure stops the run before later stages start,
    /// so a failed generation leaves no report on disk and sends no mail.
    pub async fn run(&self) -> Result<RunSummary> {
        let snapshot = self.collect_trends().await?;

        let ideas = self.ideas.generate_ideas(&snapshot.top_categories).await?;

        let document = build_workbook(&snapshot.records, &snapshot.stats, &ideas)?;
        let report_path = save_report(&self.options.output, &document).await?;

        let delivered = match &self.delivery {
            Some(delivery) => {
                delivery.deliver(&report_path).await?;
                true
            }
            None => {
                info!("delivery disabled, report kept on disk only");
                false
            }
        };

        Ok(RunSummary {
            snapshot,
            report_path,
            delivered,
            finished_at: Utc::now(),
        })
    }
}
