//! Dataset aggregations
//!
//! The numbers behind the exploratory panels: category shares (bar/pie),
//! histograms, two-way counts and a Pearson correlation matrix. Rendering is
//! plain text.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::Result;

use super::GamingDataset;

/// One category and how often it occurs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// Fraction of non-empty cells (0-1)
    pub share: f64,
}

/// Category frequencies, most common first; empty cells are ignored
pub fn value_counts(values: &[&str]) -> Vec<ValueCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values.iter().copied().filter(|v| !v.is_empty()) {
        *counts.entry(v).or_insert(0) += 1;
    }
    let total: usize = counts.values().sum();

    let mut out: Vec<ValueCount> = counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.to_string(),
            count,
            share: count as f64 / total as f64,
        })
        .collect();
    // BTreeMap order breaks ties alphabetically
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Describe-style summary of a numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (0 for a single value)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn summarize(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let m = mean(values);
    let std = if values.len() > 1 {
        let ss = values.iter().map(|x| (x - m).powi(2)).sum::<f64>();
        (ss / (values.len() - 1) as f64).sqrt()
    } else {
        0.0
    };

    Some(NumericSummary {
        count: values.len(),
        mean: m,
        std,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    })
}

/// Equal-width histogram over [min, max]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Lower edge of every bin followed by the upper edge of the last
    pub fn edges(&self) -> Vec<f64> {
        (0..=self.counts.len())
            .map(|i| self.min + i as f64 * self.bin_width)
            .collect()
    }
}

/// Bucket values into `bins` equal-width bins; the last bin includes `max`
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut counts = vec![0usize; bins];

    if max == min {
        counts[0] = values.len();
        return Some(Histogram {
            min,
            max,
            bin_width: 0.0,
            counts,
        });
    }

    let bin_width = (max - min) / bins as f64;
    for v in values {
        let idx = (((v - min) / bin_width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    Some(Histogram {
        min,
        max,
        bin_width,
        counts,
    })
}

/// Two-way frequency table (e.g. engagement level by gender)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crosstab {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// counts[row][column]
    pub counts: Vec<Vec<usize>>,
}

impl Crosstab {
    pub fn get(&self, row: &str, column: &str) -> usize {
        let r = self.rows.iter().position(|x| x == row);
        let c = self.columns.iter().position(|x| x == column);
        match (r, c) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }
}

/// Count co-occurrences of two aligned categorical columns; pairs with an
/// empty cell are skipped
pub fn crosstab(rows: &[&str], columns: &[&str]) -> Crosstab {
    let mut table: BTreeMap<&str, BTreeMap<&str, usize>> = BTreeMap::new();
    let mut column_labels: Vec<&str> = Vec::new();

    for (&r, &c) in rows.iter().zip(columns) {
        if r.is_empty() || c.is_empty() {
            continue;
        }
        *table.entry(r).or_default().entry(c).or_insert(0) += 1;
        if !column_labels.contains(&c) {
            column_labels.push(c);
        }
    }
    column_labels.sort_unstable();

    let counts = table
        .values()
        .map(|row| {
            column_labels
                .iter()
                .map(|c| row.get(c).copied().unwrap_or(0))
                .collect()
        })
        .collect();

    Crosstab {
        rows: table.keys().map(|s| s.to_string()).collect(),
        columns: column_labels.into_iter().map(String::from).collect(),
        counts,
    }
}

/// Pearson correlation over rows where both values are present
///
/// None when fewer than two pairs exist or either side has zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Symmetric correlation matrix over named numeric columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

pub fn correlation_matrix(dataset: &GamingDataset, columns: &[String]) -> Result<CorrelationMatrix> {
    let data = columns
        .iter()
        .map(|c| dataset.numeric_column(c))
        .collect::<Result<Vec<_>>>()?;

    let n = columns.len();
    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        for j in i..n {
            let r = pearson(&data[i], &data[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    Ok(CorrelationMatrix {
        columns: columns.to_vec(),
        values,
    })
}

/// Everything the overview screen shows for a dataset
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub rows: usize,
    pub categorical: BTreeMap<String, Vec<ValueCount>>,
    pub numeric: BTreeMap<String, NumericSummary>,
    pub correlation: CorrelationMatrix,
}

impl DatasetReport {
    pub fn build(dataset: &GamingDataset) -> Result<Self> {
        let mut categorical = BTreeMap::new();
        for name in dataset.categorical_columns() {
            categorical.insert(name.clone(), value_counts(&dataset.column(&name)?));
        }

        let numeric_columns = dataset.numeric_columns();
        let mut numeric = BTreeMap::new();
        for name in &numeric_columns {
            let values: Vec<f64> = dataset.numeric_column(name)?.into_iter().flatten().collect();
            if let Some(summary) = summarize(&values) {
                numeric.insert(name.clone(), summary);
            }
        }

        Ok(DatasetReport {
            rows: dataset.len(),
            categorical,
            numeric,
            correlation: correlation_matrix(dataset, &numeric_columns)?,
        })
    }
}

const BAR_WIDTH: usize = 40;

fn bar(count: usize, max: usize) -> String {
    let len = if max == 0 { 0 } else { count * BAR_WIDTH / max };
    "█".repeat(len)
}

/// Horizontal bar chart of category shares
pub fn render_value_counts(name: &str, counts: &[ValueCount]) -> String {
    let mut out = String::new();
    let width = counts.iter().map(|c| c.value.len()).max().unwrap_or(0).max(8);
    let max = counts.iter().map(|c| c.count).max().unwrap_or(0);

    let _ = writeln!(out, "{}", name);
    for c in counts {
        let _ = writeln!(
            out,
            "  {:<width$} {:>7} {:>6.1}%  {}",
            c.value,
            c.count,
            c.share * 100.0,
            bar(c.count, max),
            width = width
        );
    }
    out
}

pub fn render_histogram(name: &str, hist: &Histogram) -> String {
    let mut out = String::new();
    let max = hist.counts.iter().copied().max().unwrap_or(0);
    let edges = hist.edges();

    let _ = writeln!(out, "{} ({} bins)", name, hist.counts.len());
    for (i, count) in hist.counts.iter().enumerate() {
        let _ = writeln!(
            out,
            "  [{:>9.2}, {:>9.2}{} {:>7}  {}",
            edges[i],
            edges[i + 1],
            if i + 1 == hist.counts.len() { "]" } else { ")" },
            count,
            bar(*count, max)
        );
    }
    out
}

pub fn render_crosstab(row_name: &str, column_name: &str, table: &Crosstab) -> String {
    let mut out = String::new();
    let width = table
        .rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(row_name.len()))
        .max()
        .unwrap_or(0);

    let _ = write!(out, "{:<width$}", row_name, width = width);
    for c in &table.columns {
        let _ = write!(out, " {:>10}", c);
    }
    let _ = writeln!(out, "   ({} across)", column_name);
    for (r, counts) in table.rows.iter().zip(&table.counts) {
        let _ = write!(out, "{:<width$}", r, width = width);
        for n in counts {
            let _ = write!(out, " {:>10}", n);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn render_numeric(numeric: &BTreeMap<String, NumericSummary>) -> String {
    let mut out = String::new();
    let width = numeric.keys().map(|k| k.len()).max().unwrap_or(0);
    let _ = writeln!(
        out,
        "{:<width$} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "column", "count", "mean", "std", "min", "max",
        width = width
    );
    for (name, s) in numeric {
        let _ = writeln!(
            out,
            "{:<width$} {:>8} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            name, s.count, s.mean, s.std, s.min, s.max,
            width = width
        );
    }
    out
}

/// Correlation heatmap as a numeric grid
pub fn render_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    let width = matrix.columns.iter().map(|c| c.len()).max().unwrap_or(0);

    let _ = write!(out, "{:<width$}", "", width = width);
    for i in 0..matrix.columns.len() {
        let _ = write!(out, " {:>6}", format!("c{}", i));
    }
    let _ = writeln!(out);
    for (i, (name, row)) in matrix.columns.iter().zip(&matrix.values).enumerate() {
        let _ = write!(out, "{:<width$}", name, width = width);
        for v in row {
            match v {
                Some(r) => {
                    let _ = write!(out, " {:>6.2}", r);
                }
                None => {
                    let _ = write!(out, " {:>6}", "-");
                }
            }
        }
        let _ = writeln!(out, "   c{}", i);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::sample;

    #[test]
    fn test_value_counts() {
        let counts = value_counts(&["Medium", "High", "Medium", "", "Low", "Medium"]);
        assert_eq!(counts[0].value, "Medium");
        assert_eq!(counts[0].count, 3);
        assert!((counts[0].share - 0.6).abs() < 1e-9);
        // Ties keep alphabetical order
        assert_eq!(counts[1].value, "High");
        assert_eq!(counts[2].value, "Low");
        let total: f64 = counts.iter().map(|c| c.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize() {
        let s = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.count, 8);
        assert!((s.mean - 5.0).abs() < 1e-9);
        assert!((s.std - 2.138089935).abs() < 1e-6);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
        assert!(summarize(&[]).is_none());
        assert_eq!(summarize(&[3.0]).unwrap().std, 0.0);
    }

    #[test]
    fn test_histogram() {
        let h = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0, 10.0], 5).unwrap();
        assert_eq!(h.bin_width, 2.0);
        assert_eq!(h.counts, vec![2, 2, 1, 0, 1]);
        assert_eq!(h.edges().len(), 6);
        assert_eq!(*h.edges().last().unwrap(), 10.0);
        assert_eq!(h.counts.iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_histogram_constant_and_empty() {
        let h = histogram(&[4.0, 4.0, 4.0], 3).unwrap();
        assert_eq!(h.counts, vec![3, 0, 0]);
        assert!(histogram(&[], 3).is_none());
        assert!(histogram(&[1.0], 0).is_none());
    }

    #[test]
    fn test_crosstab() {
        let engagement = ["Medium", "Medium", "High", "Low", ""];
        let gender = ["Male", "Female", "Female", "Male", "Male"];
        let t = crosstab(&engagement, &gender);
        assert_eq!(t.rows, vec!["High", "Low", "Medium"]);
        assert_eq!(t.columns, vec!["Female", "Male"]);
        assert_eq!(t.get("Medium", "Male"), 1);
        assert_eq!(t.get("High", "Female"), 1);
        assert_eq!(t.get("High", "Male"), 0);
        assert_eq!(t.get("Unknown", "Male"), 0);
    }

    #[test]
    fn test_pearson() {
        let x = [Some(1.0), Some(2.0), Some(3.0), None];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(100.0)];
        let neg = [Some(3.0), Some(2.0), Some(1.0), None];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-9);
        assert!((pearson(&x, &neg).unwrap() + 1.0).abs() < 1e-9);

        let constant = [Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert!(pearson(&x, &constant).is_none());
        assert!(pearson(&[Some(1.0)], &[Some(1.0)]).is_none());
    }

    #[test]
    fn test_correlation_matrix_diagonal() {
        let ds = sample();
        let columns = vec!["Age".to_string(), "PlayerLevel".to_string()];
        let m = correlation_matrix(&ds, &columns).unwrap();
        assert!((m.values[0][0].unwrap() - 1.0).abs() < 1e-9);
        assert!((m.values[1][1].unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(m.values[0][1], m.values[1][0]);
    }

    #[test]
    fn test_report_and_rendering() {
        let ds = sample();
        let report = DatasetReport::build(&ds).unwrap();
        assert_eq!(report.rows, 6);
        assert_eq!(report.categorical["EngagementLevel"][0].value, "Medium");
        assert_eq!(report.numeric["Age"].count, 6);
        assert!(!report.numeric.contains_key("PlayerID"));

        let text = render_value_counts("EngagementLevel", &report.categorical["EngagementLevel"]);
        assert!(text.contains("Medium"));
        assert!(text.contains("66.7%"));
        assert!(render_numeric(&report.numeric).contains("PlayTimeHours"));
        assert!(render_correlation(&report.correlation).contains("1.00"));

        let h = histogram(&[1.0, 2.0, 3.0], 2).unwrap();
        assert!(render_histogram("Age", &h).contains("Age (2 bins)"));
    }
}
