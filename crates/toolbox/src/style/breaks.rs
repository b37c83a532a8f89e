//! Class break computation for graduated styles.
//!
//! Every function returns ascending breaks starting at the minimum and
//! ending at the maximum of the finite input values; `classes` classes need
//! `classes + 1` breaks, fewer when the data cannot support that many.

use super::ClassificationFunction;

/// Jenks is quadratic in the number of values; larger inputs are sampled.
const JENKS_SAMPLE_LIMIT: usize = 2000;

pub fn class_breaks(function: ClassificationFunction, values: &[f64], classes: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || classes == 0 {
        return Vec::new();
    }
    sorted.sort_by(|a, b| a.total_cmp(b));

    match function {
        ClassificationFunction::EqualInterval => equal_interval(&sorted, classes),
        ClassificationFunction::Quantile => quantile(&sorted, classes),
        ClassificationFunction::StandardDeviation => standard_deviation(&sorted, classes),
        ClassificationFunction::JenksNaturalBreaks => jenks(&sorted, classes),
        ClassificationFunction::None => Vec::new(),
    }
}

fn equal_interval(sorted: &[f64], classes: usize) -> Vec<f64> {
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    if min == max {
        return vec![min, max];
    }
    let interval = (max - min) / classes as f64;
    let mut breaks: Vec<f64> = (0..classes).map(|i| min + i as f64 * interval).collect();
    breaks.push(max);
    breaks
}

fn quantile(sorted: &[f64], classes: usize) -> Vec<f64> {
    let n = sorted.len();
    let mut breaks = vec![sorted[0]];
    for i in 1..classes {
        let index = (i * n / classes).min(n - 1);
        breaks.push(sorted[index]);
    }
    breaks.push(sorted[n - 1]);
    breaks.dedup();
    breaks
}

fn standard_deviation(sorted: &[f64], classes: usize) -> Vec<f64> {
    let n = sorted.len() as f64;
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let mean = sorted.iter().sum::<f64>() / n;
    let std = (sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std == 0.0 {
        return vec![min, max];
    }

    let half = classes as f64 / 2.0;
    let mut breaks = vec![min];
    breaks.extend(
        (1..classes)
            .map(|k| mean + (k as f64 - half) * std)
            .filter(|b| *b > min && *b < max),
    );
    breaks.push(max);
    breaks
}

fn jenks(sorted: &[f64], classes: usize) -> Vec<f64> {
    let mut distinct = sorted.to_vec();
    distinct.dedup();
    if distinct.len() <= classes {
        return distinct;
    }

    let data: Vec<f64> = if sorted.len() > JENKS_SAMPLE_LIMIT {
        let step = sorted.len() as f64 / JENKS_SAMPLE_LIMIT as f64;
        let mut sample: Vec<f64> = (0..JENKS_SAMPLE_LIMIT)
            .map(|i| sorted[(i as f64 * step) as usize])
            .collect();
        sample.push(sorted[sorted.len() - 1]);
        sample
    } else {
        sorted.to_vec()
    };

    let n = data.len();
    let k = classes;
    // lower[l][j]: 1-based index of the first value of the last class when
    // the first l values are split into j classes
    let mut lower = vec![vec![0usize; k + 1]; n + 1];
    let mut variance = vec![vec![f64::INFINITY; k + 1]; n + 1];
    for j in 1..=k {
        lower[1][j] = 1;
        variance[1][j] = 0.0;
    }

    for l in 2..=n {
        let (mut sum, mut sum_sq, mut count) = (0.0, 0.0, 0.0);
        let mut v = 0.0;
        for m in 1..=l {
            let first = l - m + 1;
            let value = data[first - 1];
            sum += value;
            sum_sq += value * value;
            count += 1.0;
            v = sum_sq - sum * sum / count;
            let before = first - 1;
            if before != 0 {
                for j in 2..=k {
                    let candidate = v + variance[before][j - 1];
                    if variance[l][j] >= candidate {
                        lower[l][j] = first;
                        variance[l][j] = candidate;
                    }
                }
            }
        }
        lower[l][1] = 1;
        variance[l][1] = v;
    }

    let mut breaks = vec![0.0; k + 1];
    breaks[0] = data[0];
    breaks[k] = data[n - 1];
    let mut upper = n;
    for j in (2..=k).rev() {
        let first = lower[upper][j].max(2);
        breaks[j - 1] = data[first - 2];
        upper = first - 1;
    }
    breaks.dedup();
    breaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ClassificationFunction as CF;

    #[test]
    fn equal_interval_breaks() {
        let values = [0.0, 3.0, 10.0, 7.5, 2.0];
        assert_eq!(class_breaks(CF::EqualInterval, &values, 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    }

    #[test]
    fn quantile_breaks() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(class_breaks(CF::Quantile, &values, 5), vec![1.0, 3.0, 5.0, 7.0, 9.0, 10.0]);
    }

    #[test]
    fn standard_deviation_breaks_center_on_mean() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        // mean 5, population std 2
        let breaks = class_breaks(CF::StandardDeviation, &values, 4);
        assert_eq!(breaks.len(), 5);
        assert_relative_eq!(breaks[0], 2.0);
        assert_relative_eq!(breaks[1], 3.0);
        assert_relative_eq!(breaks[2], 5.0);
        assert_relative_eq!(breaks[3], 7.0);
        assert_relative_eq!(breaks[4], 9.0);
    }

    #[test]
    fn jenks_finds_natural_groups() {
        let values = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 20.0, 21.0, 22.0];
        assert_eq!(class_breaks(CF::JenksNaturalBreaks, &values, 3), vec![1.0, 3.0, 12.0, 22.0]);
    }

    #[test]
    fn jenks_with_few_distinct_values() {
        let values = [4.0, 4.0, 1.0, 1.0];
        assert_eq!(class_breaks(CF::JenksNaturalBreaks, &values, 5), vec![1.0, 4.0]);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(class_breaks(CF::Quantile, &[], 5).is_empty());
        assert!(class_breaks(CF::Quantile, &[f64::NAN], 5).is_empty());
        assert!(class_breaks(CF::None, &[1.0, 2.0], 5).is_empty());
        assert_eq!(class_breaks(CF::EqualInterval, &[3.0, 3.0], 5), vec![3.0, 3.0]);
    }
}
