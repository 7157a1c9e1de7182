//! Runs a command-line learned scorer through request/response JSONL files.
//!
//! The scorer is optional: every failure (spawn error, non-zero exit,
//! timeout, unreadable response, missing or non-numeric prediction) turns
//! into `None` for the affected pairs and a warning, never an error.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::core::config::ExternalScorerConfig;
use crate::core::errors::{Result, ResultExt, SurfaceSimError};
use crate::io::records::{first_f64, read_jsonl, Record};

#[derive(Serialize)]
struct ScoreRequest<'a> {
    id: String,
    golden_code: &'a str,
    generated_code: &'a str,
}

/// Client for one configured external scorer
#[derive(Debug, Clone)]
pub struct ExternalScorer {
    config: ExternalScorerConfig,
}

impl ExternalScorer {
    /// Wrap a validated config
    pub fn new(config: ExternalScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    pub fn config(&self) -> &ExternalScorerConfig {
        &self.config
    }

    /// Predict a score for every (reference, candidate) pair, in input order.
    pub async fn score_pairs<R, C>(&self, pairs: &[(R, C)]) -> Vec<Option<f64>>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        if pairs.is_empty() {
            return Vec::new();
        }
        match self.run(pairs).await {
            Ok(predictions) => predictions,
            Err(e) => {
                warn!(program = %self.config.program, error = %e, "external scorer failed");
                vec![None; pairs.len()]
            }
        }
    }

    async fn run<R, C>(&self, pairs: &[(R, C)]) -> Result<Vec<Option<f64>>>
    where
        R: AsRef<str>,
        C: AsRef<str>,
    {
        let workdir = tempfile::tempdir().context("Failed to create scorer workspace")?;
        let request_path = workdir.path().join("request.jsonl");
        let response_path = workdir.path().join("response.jsonl");

        write_requests(&request_path, pairs).await?;
        self.invoke(&request_path, &response_path).await?;

        let responses = read_jsonl(&response_path).context("Unreadable scorer response")?;
        Ok(collect_predictions(
            &responses,
            pairs.len(),
            &self.config.prediction_keys,
        ))
    }

    async fn invoke(&self, request: &Path, response: &Path) -> Result<()> {
        let program = &self.config.program;
        let mut child = Command::new(program)
            .args(&self.config.args)
            .arg("--test_file")
            .arg(request)
            .arg("--out_file")
            .arg(response)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SurfaceSimError::external(format!("failed to start: {e}"), program.clone())
            })?;

        debug!(program = %program, timeout_secs = self.config.timeout_secs, "external scorer started");
        let limit = Duration::from_secs(self.config.timeout_secs);
        let status = match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status.context("Failed waiting for external scorer")?,
            Err(_) => {
                // dropping the child kills it
                return Err(SurfaceSimError::external(
                    format!("timed out after {}s", self.config.timeout_secs),
                    program.clone(),
                ));
            }
        };

        if !status.success() {
            return Err(SurfaceSimError::external(
                format!("exited with {status}"),
                program.clone(),
            ));
        }
        Ok(())
    }
}

async fn write_requests<R, C>(path: &Path, pairs: &[(R, C)]) -> Result<()>
where
    R: AsRef<str>,
    C: AsRef<str>,
{
    let mut content = String::new();
    for (index, (reference, candidate)) in pairs.iter().enumerate() {
        let request = ScoreRequest {
            id: index.to_string(),
            golden_code: reference.as_ref(),
            generated_code: candidate.as_ref(),
        };
        content.push_str(&serde_json::to_string(&request)?);
        content.push('\n');
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Map response rows back onto request indices.
pub fn collect_predictions<S: AsRef<str>>(
    responses: &[Record],
    expected: usize,
    prediction_keys: &[S],
) -> Vec<Option<f64>> {
    let by_id: HashMap<usize, f64> = responses
        .iter()
        .filter_map(|row| {
            let id = match row.get("id")? {
                serde_json::Value::String(s) => s.trim().parse::<usize>().ok()?,
                serde_json::Value::Number(n) => usize::try_from(n.as_u64()?).ok()?,
                _ => return None,
            };
            let score = first_f64(row, prediction_keys)?;
            Some((id, score))
        })
        .collect();

    let predictions: Vec<Option<f64>> = (0..expected).map(|i| by_id.get(&i).copied()).collect();
    let missing = predictions.iter().filter(|p| p.is_none()).count();
    if missing > 0 {
        warn!(missing, expected, "external scorer returned no prediction for some pairs");
    }
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn keys() -> Vec<String> {
        ExternalScorerConfig::new("unused").prediction_keys
    }

    #[test]
    fn test_collect_predictions_by_id() {
        let responses = vec![
            record(json!({"id": "1", "pred_score": 0.25})),
            record(json!({"id": 0, "predict_score": "0.75"})),
            record(json!({"id": "2", "prediction": "n/a"})),
        ];
        let predictions = collect_predictions(&responses, 4, &keys());
        assert_eq!(predictions, vec![Some(0.75), Some(0.25), None, None]);
    }

    #[test]
    fn test_first_prediction_key_wins() {
        let responses = vec![record(json!({"id": "0", "score": 0.1, "predict_score": 0.9}))];
        assert_eq!(collect_predictions(&responses, 1, &keys()), vec![Some(0.9)]);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ExternalScorerConfig {
            timeout_secs: 0,
            ..ExternalScorerConfig::new("scorer")
        };
        assert!(ExternalScorer::new(config).is_err());
    }

    #[tokio::test]
    async fn test_missing_program_yields_none() {
        let scorer =
            ExternalScorer::new(ExternalScorerConfig::new("/nonexistent/surface-sim-scorer")).unwrap();
        let predictions = scorer.score_pairs(&[("a", "b"), ("c", "d")]).await;
        assert_eq!(predictions, vec![None, None]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_process() {
        let scorer =
            ExternalScorer::new(ExternalScorerConfig::new("/nonexistent/surface-sim-scorer")).unwrap();
        let pairs: Vec<(String, String)> = Vec::new();
        assert!(scorer.score_pairs(&pairs).await.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shell_scorer_round_trip() {
        // $1 = --test_file, $2 = request, $3 = --out_file, $4 = response
        let script = r#"
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed 's/^{"id":"\([0-9]*\)".*/\1/')
  printf '{"id":"%s","predict_score":0.5}\n' "$id"
done < "$2" > "$4"
"#;
        let config = ExternalScorerConfig {
            args: vec!["-c".to_string(), script.to_string(), "scorer".to_string()],
            ..ExternalScorerConfig::new("sh")
        };
        let scorer = ExternalScorer::new(config).unwrap();
        let predictions = scorer
            .score_pairs(&[("x = 1", "x = 2"), ("y = 1", "y = 2")])
            .await;
        assert_eq!(predictions, vec![Some(0.5), Some(0.5)]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_scorer_yields_none() {
        let config = ExternalScorerConfig {
            args: vec!["-c".to_string(), "exit 3".to_string(), "scorer".to_string()],
            ..ExternalScorerConfig::new("sh")
        };
        let scorer = ExternalScorer::new(config).unwrap();
        assert_eq!(scorer.score_pairs(&[("a", "b")]).await, vec![None]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_yields_none() {
        let config = ExternalScorerConfig {
            args: vec!["-c".to_string(), "sleep 5".to_string(), "scorer".to_string()],
            timeout_secs: 1,
            ..ExternalScorerConfig::new("sh")
        };
        let scorer = ExternalScorer::new(config).unwrap();
        assert_eq!(scorer.score_pairs(&[("a", "b")]).await, vec![None]);
    }
}
