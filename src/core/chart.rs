use crate::core::stats::{quantile, sorted, AgeStatistics};
use serde::Serialize;
use std::fmt::Write;

// 年齡分佈的直方圖與箱形圖，終端機上以文字呈現
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
const BAR_WIDTH: usize = 40;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl Bin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
}

impl Histogram {
    /// 等寬分箱，最後一箱包含上界；所有值相同時範圍為 ±0.5
    pub fn new(values: &[f64], bin_count: usize) -> Option<Self> {
        if bin_count == 0 {
            return None;
        }
        let sorted = sorted(values);
        let (mut low, mut high) = (*sorted.first()?, *sorted.last()?);
        if low == high {
            low -= 0.5;
            high += 0.5;
        }
        let width = (high - low) / bin_count as f64;

        let mut bins: Vec<Bin> = (0..bin_count)
            .map(|i| Bin {
                lower: low + width * i as f64,
                upper: if i + 1 == bin_count {
                    high
                } else {
                    low + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for value in sorted {
            let index = (((value - low) / width) as usize).min(bin_count - 1);
            bins[index].count += 1;
        }

        Some(Self { bins })
    }

    /// 趨勢線的點：(bin center, count)
    pub fn trend_line(&self) -> Vec<(f64, usize)> {
        self.bins.iter().map(|b| (b.center(), b.count)).collect()
    }

    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlot {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxPlot {
    /// 鬚線延伸到 1.5 × IQR 內最極端的值
    pub fn new(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values);
        let q1 = quantile(&sorted, 0.25)?;
        let median = quantile(&sorted, 0.5)?;
        let q3 = quantile(&sorted, 0.75)?;
        let reach = 1.5 * (q3 - q1);
        let (fence_low, fence_high) = (q1 - reach, q3 + reach);

        let (inside, outliers): (Vec<f64>, Vec<f64>) = sorted
            .iter()
            .partition(|v| **v >= fence_low && **v <= fence_high);
        let whisker_low = inside.first().copied().unwrap_or(q1);
        let whisker_high = inside.last().copied().unwrap_or(q3);

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// 兩個面板：左邊直方圖（含 mean/median 標記），右邊箱形圖摘要
pub fn render(stats: &AgeStatistics, histogram: &Histogram, box_plot: &BoxPlot) -> String {
    let mut out = String::new();
    let max_count = histogram.max_count().max(1);

    let _ = writeln!(out, "Age Distribution of AGM Participants");
    let _ = writeln!(out, "{:>15} | Frequency", "Age (years)");
    let last = histogram.bins.len().saturating_sub(1);
    for (i, bin) in histogram.bins.iter().enumerate() {
        let bar_len = bin.count * BAR_WIDTH / max_count;
        let mut markers = String::new();
        if contains(bin, stats.mean, i == last) {
            markers.push_str(&format!(" <- Mean: {:.1} years", stats.mean));
        }
        if contains(bin, stats.median, i == last) {
            markers.push_str(&format!(" <- Median: {:.1} years", stats.median));
        }
        let _ = writeln!(
            out,
            "{:>6.1} - {:>6.1} | {:<width$} {:>3}{}",
            bin.lower,
            bin.upper,
            "#".repeat(bar_len),
            bin.count,
            markers,
            width = BAR_WIDTH
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Age Distribution (Box Plot)");
    let _ = writeln!(
        out,
        "  |{:.1}|---[ {:.1} | {:.1} | {:.1} ]---|{:.1}|",
        box_plot.whisker_low, box_plot.q1, box_plot.median, box_plot.q3, box_plot.whisker_high
    );
    if !box_plot.outliers.is_empty() {
        let outliers: Vec<String> = box_plot.outliers.iter().map(|o| format!("{:.0}", o)).collect();
        let _ = writeln!(out, "  outliers: {}", outliers.join(", "));
    }
    let _ = writeln!(out, "  Mean: {:.1}", stats.mean);
    let _ = writeln!(out, "  Median: {:.1}", stats.median);
    let _ = write!(out, "  Std: {}", format_std(stats.std_dev));

    out
}

pub fn format_std(std_dev: Option<f64>) -> String {
    std_dev
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "nan".to_string())
}

// 只有最後一箱是閉區間
fn contains(bin: &Bin, value: f64, is_last: bool) -> bool {
    value >= bin.lower && (value < bin.upper || (is_last && value <= bin.upper))
}
