//! Persisted signal classifier
//!
//! Artifacts in the model directory:
//! - `features_order.json`: JSON array of the feature column names, in the
//!   order the booster was fitted on
//! - `signal_model.json`: the serialized booster

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::gbm::{Booster, GbmParams};
use crate::features::{FeatureTable, TableError};

pub const FEATURES_FILE: &str = "features_order.json";
pub const MODEL_FILE: &str = "signal_model.json";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("gradient boosting backend is not available in this build")]
    UntrainedDependency,

    #[error("model is not trained")]
    NotTrained,

    #[error("missing feature columns: {missing:?}")]
    FeatureMismatch { missing: Vec<String> },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    pub rows: usize,
    pub positives: usize,
    pub features: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SignalModel {
    dir: PathBuf,
    params: GbmParams,
    feature_names: Vec<String>,
    booster: Option<Booster>,
}

impl SignalModel {
    /// Loads whatever artifacts exist in `dir`; a missing file leaves that
    /// part empty.
    pub fn load(dir: impl Into<PathBuf>) -> Result<Self, ModelError> {
        let dir = dir.into();

        let features_path = dir.join(FEATURES_FILE);
        let feature_names: Vec<String> = if features_path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&features_path)?)?
        } else {
            Vec::new()
        };

        let model_path = dir.join(MODEL_FILE);
        let booster: Option<Booster> = if model_path.exists() {
            Some(serde_json::from_str(&std::fs::read_to_string(&model_path)?)?)
        } else {
            None
        };

        if let Some(b) = &booster {
            b.validate().map_err(|e| {
                ModelError::InvalidData(format!("{} is malformed: {}", MODEL_FILE, e))
            })?;
            if b.n_features() != feature_names.len() {
                return Err(ModelError::InvalidData(format!(
                    "booster expects {} features, {} lists {}",
                    b.n_features(),
                    FEATURES_FILE,
                    feature_names.len()
                )));
            }
        }

        info!(
            "Signal model loaded from {} (features: {}, trained: {})",
            dir.display(),
            feature_names.len(),
            booster.is_some()
        );

        Ok(Self {
            dir,
            params: GbmParams::default(),
            feature_names,
            booster,
        })
    }

    pub fn with_params(mut self, params: GbmParams) -> Self {
        self.params = params;
        self
    }

    /// Whether this build can fit a booster
    pub fn is_available() -> bool {
        cfg!(feature = "gbm")
    }

    pub fn is_trained(&self) -> bool {
        self.booster.is_some() && !self.feature_names.is_empty()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fits on every column except `label` and writes both artifacts.
    /// Rows whose label is NaN are skipped; other labels must be 0 or 1.
    pub fn train(&mut self, table: &FeatureTable, label: &str) -> Result<TrainSummary, ModelError> {
        if !Self::is_available() {
            return Err(ModelError::UntrainedDependency);
        }

        let labels = table
            .column(label)
            .ok_or_else(|| ModelError::InvalidData(format!("label column {} not found", label)))?;
        let feature_names: Vec<String> = table
            .column_names()
            .iter()
            .filter(|name| name.as_str() != label)
            .cloned()
            .collect();
        if feature_names.is_empty() {
            return Err(ModelError::InvalidData("no feature columns".to_string()));
        }

        let matrix = table.rows_for(&feature_names).map_err(table_error)?;
        let mut rows = Vec::with_capacity(matrix.len());
        let mut y = Vec::with_capacity(matrix.len());
        for (row, &value) in matrix.into_iter().zip(labels) {
            if value.is_nan() {
                continue;
            }
            if value != 0.0 && value != 1.0 {
                return Err(ModelError::InvalidData(format!(
                    "label {} is not binary: {}",
                    label, value
                )));
            }
            rows.push(row);
            y.push(value);
        }
        if y.is_empty() {
            return Err(ModelError::InvalidData("no labelled rows".to_string()));
        }

        debug!("Fitting booster on {} rows x {} features", rows.len(), feature_names.len());
        let booster = fit(&rows, &y, &self.params)?;

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(
            self.dir.join(FEATURES_FILE),
            serde_json::to_string_pretty(&feature_names)?,
        )?;
        std::fs::write(self.dir.join(MODEL_FILE), serde_json::to_string(&booster)?)?;

        let summary = TrainSummary {
            rows: y.len(),
            positives: y.iter().filter(|&&v| v == 1.0).count(),
            features: feature_names.clone(),
        };
        info!(
            "Signal model trained on {} rows ({} positive), saved to {}",
            summary.rows,
            summary.positives,
            self.dir.display()
        );

        self.feature_names = feature_names;
        self.booster = Some(booster);
        Ok(summary)
    }

    /// Probability of an up move for every row, in row order. Columns are
    /// picked by name; extra columns are ignored.
    pub fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>, ModelError> {
        let booster = match &self.booster {
            Some(b) if !self.feature_names.is_empty() => b,
            _ => return Err(ModelError::NotTrained),
        };
        let rows = table.rows_for(&self.feature_names).map_err(table_error)?;
        Ok(booster.predict_proba(&rows))
    }
}

fn table_error(err: TableError) -> ModelError {
    match err {
        TableError::MissingColumns(missing) => ModelError::FeatureMismatch { missing },
        other => ModelError::InvalidData(other.to_string()),
    }
}

#[cfg(feature = "gbm")]
fn fit(rows: &[Vec<f64>], labels: &[f64], params: &GbmParams) -> Result<Booster, ModelError> {
    Ok(Booster::fit(rows, labels, params.clone()))
}

#[cfg(not(feature = "gbm"))]
fn fit(_rows: &[Vec<f64>], _labels: &[f64], _params: &GbmParams) -> Result<Booster, ModelError> {
    Err(ModelError::UntrainedDependency)
}
