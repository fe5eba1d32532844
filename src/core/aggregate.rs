use crate::core::trending::{CategoryLookup, RawVideo};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub category: String,
    pub view_count: u64,
    pub like_count: u64,
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub video_count: usize,
    pub avg_views: f64,
}

/// Normalizes a fetched batch into records, preserving platform order.
///
/// Items without an id are dropped, as are repeats of an id already seen in the batch.
pub fn build_records(videos: &[RawVideo], categories: &CategoryLookup) -> Vec<VideoRecord> {
    let mut seen = HashSet::new();
    let mut records = Vec::with_capacity(videos.len());

    for video in videos {
        let video_id = video.id.trim();
        if video_id.is_empty() {
            debug!(title = %video.snippet.title, "skipping video without id");
            continue;
        }
        if !seen.insert(video_id) {
            debug!(video_id, "skipping duplicate video id");
            continue;
        }

        let category = video
            .snippet
            .category_id
            .as_deref()
            .and_then(|id| categories.name_of(id.trim()))
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNKNOWN_CATEGORY);

        records.push(VideoRecord {
            video_id: video_id.to_string(),
            title: video.snippet.title.clone(),
            category: category.to_string(),
            view_count: video.statistics.view_count.unwrap_or(0),
            like_count: video.statistics.like_count.unwrap_or(0),
            published_at: video.snippet.published_at.clone(),
        });
    }

    records
}

/// Per-category count and mean view count, ordered by category name.
pub fn category_stats(records: &[VideoRecord]) -> Vec<CategoryStat> {
    let mut groups: BTreeMap<&str, (usize, u128)> = BTreeMap::new();

    for record in records {
        let entry = groups.entry(record.category.as_str()).or_default();
        entry.0 += 1;
        entry.1 += u128::from(record.view_count);
    }

    groups
        .into_iter()
        .map(|(category, (video_count, total_views))| CategoryStat {
            category: category.to_string(),
            video_count,
            avg_views: total_views as f64 / video_count as f64,
        })
        .collect()
}
