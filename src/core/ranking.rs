use crate::core::aggregate::CategoryStat;

pub const DEFAULT_TOP_N: usize = 5;

/// Top `top_n` category names, ordered by mean views then video count, both descending.
/// Fewer categories than `top_n` simply yields all of them.
pub fn rank_categories(stats: &[CategoryStat], top_n: usize) -> Vec<String> {
    let mut ordered: Vec<&CategoryStat> = stats.iter().collect();
    ordered.sort_by(|a, b| {
        b.avg_views
            .total_cmp(&a.avg_views)
            .then_with(|| b.video_count.cmp(&a.video_count))
    });

    let mut ranked: Vec<String> = Vec::with_capacity(top_n.min(ordered.len()));
    for stat in ordered {
        if ranked.len() == top_n {
            break;
        }
        if !ranked.contains(&stat.category) {
            ranked.push(stat.category.clone());
        }
    }
    ranked
}
