//! Fixture utilities for the deterministic CLI harness.
//!
//! This module loads mono WAV recordings, writes synthetic recordings back
//! to disk, and compares computed cycle tables against reference JSON
//! tables. It is desktop-focused to support CI and regression workflows.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::CycleTable;

/// Decoded single-channel recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub fs: f64,
    pub samples: Vec<f64>,
}

/// Read a mono WAV file; integer PCM is scaled to [-1, 1].
pub fn read_wav(path: &Path) -> Result<Recording> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        return Err(anyhow!(
            "Recording {} must be mono (found {} channels)",
            path.display(),
            spec.channels
        ));
    }

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|sample| sample.map(f64::from).map_err(|err| anyhow!(err)))
            .collect::<Result<Vec<f64>>>()?,
        hound::SampleFormat::Int => {
            let max = ((1i64 << (spec.bits_per_sample - 1)) - 1) as f64;
            match spec.bits_per_sample {
                16 => reader
                    .samples::<i16>()
                    .map(|sample| {
                        sample
                            .map(|value| f64::from(value) / max)
                            .map_err(|err| anyhow!(err))
                    })
                    .collect::<Result<Vec<f64>>>()?,
                24 | 32 => reader
                    .samples::<i32>()
                    .map(|sample| {
                        sample
                            .map(|value| f64::from(value) / max)
                            .map_err(|err| anyhow!(err))
                    })
                    .collect::<Result<Vec<f64>>>()?,
                other => {
                    return Err(anyhow!(
                        "Unsupported bits per sample {} in {}",
                        other,
                        path.display()
                    ))
                }
            }
        }
    };

    Ok(Recording {
        fs: f64::from(spec.sample_rate),
        samples,
    })
}

/// Write a mono 32-bit float WAV file.
pub fn write_wav(path: &Path, samples: &[f64], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample as f32)?;
    }
    writer
        .finalize()
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Reference cycle table: expected values per exported column.
///
/// `null` entries expect NaN. Columns not listed are not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub columns: BTreeMap<String, Vec<Option<f64>>>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    1e-6
}

impl ReferenceTable {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading reference {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Snapshot `table` (every exported column) as a reference.
    pub fn from_table(table: &CycleTable, tolerance: f64) -> Self {
        let columns = table
            .column_names()
            .into_iter()
            .filter_map(|name| {
                let values = table.column_f64(name)?;
                let values = values
                    .into_iter()
                    .map(|v| if v.is_nan() { None } else { Some(v) })
                    .collect();
                Some((name.to_string(), values))
            })
            .collect();
        Self { columns, tolerance }
    }

    pub fn verify(&self, actual: &CycleTable) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (name, expected) in &self.columns {
            let Some(values) = actual.column_f64(name) else {
                failures.push(ExpectationFailure::MissingColumn {
                    column: name.clone(),
                });
                continue;
            };

            if values.len() != expected.len() {
                failures.push(ExpectationFailure::LengthMismatch {
                    column: name.clone(),
                    expected: expected.len(),
                    actual: values.len(),
                });
                continue;
            }

            for (index, (want, got)) in expected.iter().zip(&values).enumerate() {
                let matches = match want {
                    None => got.is_nan(),
                    Some(want) => (want - got).abs() <= self.tolerance,
                };
                if !matches {
                    failures.push(ExpectationFailure::ValueMismatch {
                        column: name.clone(),
                        index,
                        expected: *want,
                        actual: (!got.is_nan()).then_some(*got),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Outcome of comparing a cycle table with a reference.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "failures": self.failures })
    }
}

/// Detailed diff entry for a single failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectationFailure {
    MissingColumn {
        column: String,
    },
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    ValueMismatch {
        column: String,
        index: usize,
        expected: Option<f64>,
        actual: Option<f64>,
    },
}
