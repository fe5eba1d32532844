use crate::core::aggregate::{CategoryStat, VideoRecord};
use crate::error::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

pub const REPORT_FILE_NAME: &str = "yt_trend_channel_ideas.xlsx";
pub const XLSX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub const RAW_VIDEOS_SHEET: &str = "RawVideos";
pub const CATEGORY_STATS_SHEET: &str = "CategoryStats";
pub const CHANNEL_IDEAS_SHEET: &str = "ChannelIdeas";

const RAW_VIDEO_HEADERS: [&str; 6] = [
    "VideoID",
    "Title",
    "Category",
    "ViewCount",
    "LikeCount",
    "PublishedAt",
];
const CATEGORY_STAT_HEADERS: [&str; 3] = ["Category", "VideoCount", "AvgViews"];

/// Serializes the three report sheets into an in-memory xlsx document.
pub fn build_workbook(
    records: &[VideoRecord],
    stats: &[CategoryStat],
    ideas: &str,
) -> Result<Vec<u8>> {
    render(records, stats, ideas)
        .map_err(|e| Error::Report(format!("xlsx generation failed: {e}")))
}

fn render(
    records: &[VideoRecord],
    stats: &[CategoryStat],
    ideas: &str,
) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet().set_name(RAW_VIDEOS_SHEET)?;
    write_headers(sheet, &RAW_VIDEO_HEADERS, &header)?;
    for (idx, record) in records.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &record.video_id)?;
        sheet.write_string(row, 1, &record.title)?;
        sheet.write_string(row, 2, &record.category)?;
        sheet.write_number(row, 3, record.view_count as f64)?;
        sheet.write_number(row, 4, record.like_count as f64)?;
        sheet.write_string(row, 5, &record.published_at)?;
    }

    let sheet = workbook.add_worksheet().set_name(CATEGORY_STATS_SHEET)?;
    write_headers(sheet, &CATEGORY_STAT_HEADERS, &header)?;
    for (idx, stat) in stats.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, &stat.category)?;
        sheet.write_number(row, 1, stat.video_count as f64)?;
        sheet.write_number(row, 2, stat.avg_views)?;
    }

    let sheet = workbook.add_worksheet().set_name(CHANNEL_IDEAS_SHEET)?;
    write_headers(sheet, &[CHANNEL_IDEAS_SHEET], &header)?;
    sheet.write_string(1, 0, ideas)?;

    workbook.save_to_buffer()
}

fn write_headers(
    sheet: &mut Worksheet,
    headers: &[&str],
    format: &Format,
) -> std::result::Result<(), XlsxError> {
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, format)?;
    }
    Ok(())
}

/// Writes the document to `path`, replacing any previous report there.
pub async fn save_report(path: &Path, document: &[u8]) -> Result<PathBuf> {
    fs::write(path, document)
        .await
        .map_err(|e| Error::Report(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), bytes = document.len(), "report written");
    Ok(path.to_path_buf())
}
