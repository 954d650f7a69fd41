//! Chart description wrapper: plotly-style figure JSON plus its sampled x-axis.

#![forbid(unsafe_code)]

use serde_json::{json, Value as Json};
use tracing::debug;

use crate::axis::{Axis, AxisValue};
use crate::frame::{Column, Frame};
use crate::CoreError;

/// Trace attribute naming which key holds the x samples.
const XAXIS_ATTR: &str = "xaxis";
const DEFAULT_XAXIS: &str = "x";

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    spec: Json,
    axis: Axis,
}

impl Figure {
    /// Wrap raw figure JSON. The axis comes from the first trace and is bare
    /// (no series container backs it).
    pub fn from_json(spec: Json) -> Result<Self, CoreError> {
        let values = first_trace_axis(&spec)?;
        debug!(samples = values.len(), "axis extracted from figure json");
        Ok(Self { spec, axis: Axis::bare(values) })
    }

    /// Build a single line trace from two frame columns. The axis is indexed by the
    /// frame, so results carry a derived series.
    pub fn line(frame: &Frame, x: &str, y: &str) -> Result<Self, CoreError> {
        let xs = frame.axis(x).map_err(|e| CoreError::MalformedChart(e.to_string()))?;
        let ys = match frame.column(y) {
            Some(col @ (Column::Axis(_) | Column::Float(_))) => col.to_json(),
            Some(_) => return Err(CoreError::MalformedChart(format!("column {y} is not plottable"))),
            None => return Err(CoreError::MalformedChart(format!("missing column: {y}"))),
        };
        let xs_json: Vec<Json> = xs.iter().map(AxisValue::to_json).collect();
        let spec = json!({
            "data": [{
                "type": "scatter",
                "mode": "lines",
                "name": y,
                "x": xs_json,
                "y": ys,
                "xaxis": DEFAULT_XAXIS,
                "yaxis": "y",
            }],
            "layout": {
                "xaxis": { "title": { "text": x } },
                "yaxis": { "title": { "text": y } },
            },
        });
        Ok(Self { spec, axis: Axis::indexed(xs.to_vec()) })
    }

    pub fn spec(&self) -> &Json {
        &self.spec
    }

    pub fn axis(&self) -> &Axis {
        &self.axis
    }
}

fn first_trace_axis(spec: &Json) -> Result<Vec<AxisValue>, CoreError> {
    let data = spec
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| CoreError::MalformedChart("missing data array".into()))?;
    let trace = data.first().ok_or_else(|| CoreError::MalformedChart("figure has no traces".into()))?;
    let key = trace.get(XAXIS_ATTR).and_then(|v| v.as_str()).unwrap_or(DEFAULT_XAXIS);
    let samples = trace
        .get(key)
        .and_then(|v| v.as_array())
        .ok_or_else(|| CoreError::MalformedChart(format!("first trace has no {key} samples")))?;
    samples
        .iter()
        .enumerate()
        .map(|(i, v)| {
            AxisValue::from_json(v)
                .ok_or_else(|| CoreError::MalformedChart(format!("unsupported {key} sample at index {i}: {v}")))
        })
        .collect()
}
