// Cycle table - geometry + burst label per cycle, exported with named columns
//
// Records are stored in the peak-centred frame. For trough-centred analysis
// the signal was negated before segmentation, so export swaps the
// peak/trough and rise/decay roles, negates the extremum voltages and
// complements the symmetry ratios. Column order follows the peak-centred
// layout with the renamed labels in place.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt::Write as _;

use crate::analysis::burst::{BurstDiagnostics, BurstLabel, BurstMethod};
use crate::analysis::cycles::CycleGeometry;
use crate::config::Centering;
use crate::telemetry::DiagnosticEvent;

/// One analysed cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cycle {
    pub geometry: CycleGeometry,
    pub burst: BurstLabel,
}

/// A single exported value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Index(usize),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            CellValue::Index(i) => i as f64,
            CellValue::Float(v) => v,
            CellValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    fn to_csv_field(self) -> String {
        match self {
            CellValue::Index(i) => i.to_string(),
            CellValue::Float(v) if v.is_nan() => String::new(),
            CellValue::Float(v) => v.to_string(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SamplePeak,
    SampleZeroxDecay,
    SampleZeroxRise,
    SampleLastTrough,
    SampleNextTrough,
    Period,
    TimePeak,
    TimeTrough,
    VoltPeak,
    VoltTrough,
    TimeDecay,
    TimeRise,
    VoltDecay,
    VoltRise,
    VoltAmp,
    TimeRdsym,
    TimePtsym,
    BandAmp,
    AmpFraction,
    AmpConsistency,
    PeriodConsistency,
    Monotonicity,
    BurstFraction,
    IsBurst,
}

/// Value change applied when exporting trough-centred tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transform {
    Identity,
    Negate,
    Complement,
}

struct Column {
    field: Field,
    peak_name: &'static str,
    trough_name: &'static str,
    trough_transform: Transform,
}

const fn column(
    field: Field,
    peak_name: &'static str,
    trough_name: &'static str,
    trough_transform: Transform,
) -> Column {
    Column {
        field,
        peak_name,
        trough_name,
        trough_transform,
    }
}

const fn same(field: Field, name: &'static str) -> Column {
    column(field, name, name, Transform::Identity)
}

const GEOMETRY_COLUMNS: [Column; 18] = [
    column(Field::SamplePeak, "sample_peak", "sample_trough", Transform::Identity),
    column(Field::SampleZeroxDecay, "sample_zerox_decay", "sample_zerox_rise", Transform::Identity),
    column(Field::SampleZeroxRise, "sample_zerox_rise", "sample_zerox_decay", Transform::Identity),
    column(Field::SampleLastTrough, "sample_last_trough", "sample_last_peak", Transform::Identity),
    column(Field::SampleNextTrough, "sample_next_trough", "sample_next_peak", Transform::Identity),
    same(Field::Period, "period"),
    column(Field::TimePeak, "time_peak", "time_trough", Transform::Identity),
    column(Field::TimeTrough, "time_trough", "time_peak", Transform::Identity),
    column(Field::VoltPeak, "volt_peak", "volt_trough", Transform::Negate),
    column(Field::VoltTrough, "volt_trough", "volt_peak", Transform::Negate),
    column(Field::TimeDecay, "time_decay", "time_rise", Transform::Identity),
    column(Field::TimeRise, "time_rise", "time_decay", Transform::Identity),
    column(Field::VoltDecay, "volt_decay", "volt_rise", Transform::Identity),
    column(Field::VoltRise, "volt_rise", "volt_decay", Transform::Identity),
    same(Field::VoltAmp, "volt_amp"),
    column(Field::TimeRdsym, "time_rdsym", "time_rdsym", Transform::Complement),
    column(Field::TimePtsym, "time_ptsym", "time_ptsym", Transform::Complement),
    same(Field::BandAmp, "band_amp"),
];

const CONSISTENCY_COLUMNS: [Column; 5] = [
    same(Field::AmpFraction, "amp_fraction"),
    same(Field::AmpConsistency, "amp_consistency"),
    same(Field::PeriodConsistency, "period_consistency"),
    same(Field::Monotonicity, "monotonicity"),
    same(Field::IsBurst, "is_burst"),
];

const AMPLITUDE_COLUMNS: [Column; 2] = [
    same(Field::BurstFraction, "burst_fraction"),
    same(Field::IsBurst, "is_burst"),
];

impl Field {
    fn raw(self, cycle: &Cycle) -> CellValue {
        let g = &cycle.geometry;
        let diagnostics = cycle.burst.diagnostics;
        let score = |pick: fn(&crate::analysis::burst::ConsistencyScores) -> f64| match diagnostics {
            BurstDiagnostics::Cycles(ref scores) => CellValue::Float(pick(scores)),
            BurstDiagnostics::Amp { .. } => CellValue::Float(f64::NAN),
        };
        match self {
            Field::SamplePeak => CellValue::Index(g.sample_peak),
            Field::SampleZeroxDecay => CellValue::Index(g.sample_zerox_decay),
            Field::SampleZeroxRise => CellValue::Index(g.sample_zerox_rise),
            Field::SampleLastTrough => CellValue::Index(g.sample_last_trough),
            Field::SampleNextTrough => CellValue::Index(g.sample_next_trough),
            Field::Period => CellValue::Index(g.period),
            Field::TimePeak => CellValue::Index(g.time_peak),
            Field::TimeTrough => CellValue::Index(g.time_trough),
            Field::VoltPeak => CellValue::Float(g.volt_peak),
            Field::VoltTrough => CellValue::Float(g.volt_trough),
            Field::TimeDecay => CellValue::Index(g.time_decay),
            Field::TimeRise => CellValue::Index(g.time_rise),
            Field::VoltDecay => CellValue::Float(g.volt_decay),
            Field::VoltRise => CellValue::Float(g.volt_rise),
            Field::VoltAmp => CellValue::Float(g.volt_amp),
            Field::TimeRdsym => CellValue::Float(g.time_rdsym),
            Field::TimePtsym => CellValue::Float(g.time_ptsym),
            Field::BandAmp => CellValue::Float(g.band_amp),
            Field::AmpFraction => score(|s| s.amp_fraction),
            Field::AmpConsistency => score(|s| s.amp_consistency),
            Field::PeriodConsistency => score(|s| s.period_consistency),
            Field::Monotonicity => score(|s| s.monotonicity),
            Field::BurstFraction => match diagnostics {
                BurstDiagnostics::Amp { burst_fraction } => CellValue::Float(burst_fraction),
                BurstDiagnostics::Cycles(_) => CellValue::Float(f64::NAN),
            },
            Field::IsBurst => CellValue::Bool(cycle.burst.is_burst),
        }
    }
}

impl Transform {
    fn apply(self, value: CellValue) -> CellValue {
        match (self, value) {
            (Transform::Negate, CellValue::Float(v)) => CellValue::Float(-v),
            (Transform::Complement, CellValue::Float(v)) => CellValue::Float(1.0 - v),
            (_, other) => other,
        }
    }
}

/// Per-cycle features and burst labels for one recording
#[derive(Debug, Clone, PartialEq)]
pub struct CycleTable {
    centering: Centering,
    method: BurstMethod,
    cycles: Vec<Cycle>,
    diagnostics: Vec<DiagnosticEvent>,
}

impl CycleTable {
    /// Assemble a table from peak-frame geometry and matching burst labels
    pub fn new(
        centering: Centering,
        method: BurstMethod,
        geometry: Vec<CycleGeometry>,
        labels: Vec<BurstLabel>,
        diagnostics: Vec<DiagnosticEvent>,
    ) -> Self {
        debug_assert_eq!(geometry.len(), labels.len());
        let cycles = geometry
            .into_iter()
            .zip(labels)
            .map(|(geometry, burst)| Cycle { geometry, burst })
            .collect();
        Self {
            centering,
            method,
            cycles,
            diagnostics,
        }
    }

    pub fn centering(&self) -> Centering {
        self.centering
    }

    pub fn burst_method(&self) -> BurstMethod {
        self.method
    }

    /// Cycles in the peak-centred frame of the analysed (possibly negated) signal
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn diagnostics(&self) -> &[DiagnosticEvent] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.cycles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn is_burst(&self) -> Vec<bool> {
        self.cycles.iter().map(|c| c.burst.is_burst).collect()
    }

    fn columns(&self) -> impl Iterator<Item = &'static Column> {
        let burst: &'static [Column] = match self.method {
            BurstMethod::Cycles => &CONSISTENCY_COLUMNS,
            BurstMethod::Amp => &AMPLITUDE_COLUMNS,
        };
        GEOMETRY_COLUMNS.iter().chain(burst.iter())
    }

    fn exported_name(&self, column: &Column) -> &'static str {
        match self.centering {
            Centering::Peak => column.peak_name,
            Centering::Trough => column.trough_name,
        }
    }

    fn exported_value(&self, column: &Column, cycle: &Cycle) -> CellValue {
        let raw = column.field.raw(cycle);
        match self.centering {
            Centering::Peak => raw,
            Centering::Trough => column.trough_transform.apply(raw),
        }
    }

    /// Exported column names, in order
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns().map(|c| self.exported_name(c)).collect()
    }

    /// Values of the named exported column
    pub fn column(&self, name: &str) -> Option<Vec<CellValue>> {
        let column = self.columns().find(|c| self.exported_name(c) == name)?;
        Some(
            self.cycles
                .iter()
                .map(|cycle| self.exported_value(column, cycle))
                .collect(),
        )
    }

    /// Named exported column as floats (indices converted, booleans as 0/1)
    pub fn column_f64(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .map(|values| values.iter().map(CellValue::as_f64).collect())
    }

    /// One exported row as (column, value) pairs
    pub fn row(&self, index: usize) -> Option<Vec<(&'static str, CellValue)>> {
        let cycle = self.cycles.get(index)?;
        Some(
            self.columns()
                .map(|c| (self.exported_name(c), self.exported_value(c, cycle)))
                .collect(),
        )
    }

    /// Rows as JSON objects; NaN becomes `null`
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.len())
            .filter_map(|i| self.row(i))
            .map(|row| {
                row.into_iter()
                    .map(|(name, value)| (name.to_string(), cell_to_json(value)))
                    .collect()
            })
            .collect()
    }

    /// Full document: metadata, records and diagnostics
    pub fn to_json(&self) -> Value {
        json!({
            "center_extrema": self.centering,
            "burst_method": self.method,
            "n_cycles": self.len(),
            "columns": self.column_names(),
            "cycles": self.to_records(),
            "diagnostics": self.diagnostics,
        })
    }

    /// Header plus one line per cycle; NaN is an empty field
    pub fn to_csv(&self) -> String {
        let mut out = self.column_names().join(",");
        out.push('\n');
        for i in 0..self.len() {
            if let Some(row) = self.row(i) {
                let fields: Vec<String> = row.into_iter().map(|(_, v)| v.to_csv_field()).collect();
                let _ = writeln!(out, "{}", fields.join(","));
            }
        }
        out
    }
}

fn cell_to_json(value: CellValue) -> Value {
    match value {
        CellValue::Index(i) => json!(i),
        CellValue::Float(v) if v.is_finite() => json!(v),
        CellValue::Float(_) => Value::Null,
        CellValue::Bool(b) => json!(b),
    }
}
