//! Mean absolute error between ground-truth scores and predictions.

use serde::{Deserialize, Serialize};

use crate::io::records::{first_f64, Record};

/// Prediction fields tried, in order, when none are configured
pub const DEFAULT_PREDICTION_KEYS: [&str; 3] = ["prediction", "pred_score", "predict_score"];

/// Mean of `|truth - prediction|`, ignoring pairs with a non-finite side.
///
/// `None` when no pair is usable.
pub fn mean_absolute_error<I>(pairs: I) -> Option<f64>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (sum, count) = pairs
        .into_iter()
        .filter(|(truth, prediction)| truth.is_finite() && prediction.is_finite())
        .fold((0.0, 0usize), |(sum, count), (truth, prediction)| {
            (sum + (truth - prediction).abs(), count + 1)
        });

    (count > 0).then(|| sum / count as f64)
}

/// MAE over records with the rows that contributed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaeSummary {
    /// The error, when any row was usable
    pub mae: Option<f64>,
    /// Rows with both a truth and a prediction
    pub used: usize,
    /// Rows missing one side
    pub skipped: usize,
}

/// MAE between `truth_field` and the first present prediction field.
pub fn records_mae<S: AsRef<str>>(
    records: &[Record],
    truth_field: &str,
    prediction_keys: &[S],
) -> MaeSummary {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|record| {
            let truth = first_f64(record, &[truth_field])?;
            let prediction = first_f64(record, prediction_keys)?;
            Some((truth, prediction))
        })
        .collect();

    MaeSummary {
        mae: mean_absolute_error(pairs.iter().copied()),
        used: pairs.len(),
        skipped: records.len() - pairs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::{json, Value};

    #[test]
    fn test_mae_basic() {
        let mae = mean_absolute_error([(1.0, 0.5), (0.0, 0.5), (0.2, 0.2)]).unwrap();
        assert_relative_eq!(mae, 1.0 / 3.0);
    }

    #[test]
    fn test_mae_ignores_non_finite() {
        let mae = mean_absolute_error([(1.0, f64::NAN), (0.5, 0.25), (f64::INFINITY, 0.0)]);
        assert_eq!(mae, Some(0.25));
    }

    #[test]
    fn test_mae_empty_is_none() {
        assert_eq!(mean_absolute_error(std::iter::empty()), None);
        assert_eq!(mean_absolute_error([(f64::NAN, 1.0)]), None);
    }

    #[test]
    fn test_records_mae_uses_first_prediction_key() {
        let records: Vec<Record> = [
            json!({"score": 1.0, "prediction": 0.5, "pred_score": 0.0}),
            json!({"score": "0.0", "predict_score": 0.25}),
            json!({"score": 1.0}),
        ]
        .into_iter()
        .filter_map(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect();

        let summary = records_mae(&records, "score", &DEFAULT_PREDICTION_KEYS);
        assert_eq!(summary.used, 2);
        assert_eq!(summary.skipped, 1);
        assert_relative_eq!(summary.mae.unwrap(), 0.375);
    }
}
