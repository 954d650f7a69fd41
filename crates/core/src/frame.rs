//! Minimal ordered columnar frame used as the sampled-series container.

#![forbid(unsafe_code)]

use serde_json::{Map, Value as Json};

use crate::axis::AxisValue;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FrameError {
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("column {0} does not hold axis values")]
    NotAxis(String),
    #[error("column {column} has {found} rows, frame has {expected}")]
    LengthMismatch { column: String, expected: usize, found: usize },
    #[error("column {0} is not decodable: {1}")]
    Undecodable(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Axis(Vec<AxisValue>),
    Float(Vec<f64>),
    Category(Vec<Option<String>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Axis(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Category(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_axis(&self) -> Option<&[AxisValue]> {
        match self {
            Column::Axis(v) => Some(v),
            _ => None,
        }
    }

    /// Keep rows where `mask` is true. `mask` must be as long as the column.
    fn filter(&self, mask: &[bool]) -> Column {
        fn keep<T: Clone>(v: &[T], mask: &[bool]) -> Vec<T> {
            v.iter().zip(mask).filter(|(_, m)| **m).map(|(x, _)| x.clone()).collect()
        }
        match self {
            Column::Axis(v) => Column::Axis(keep(v, mask)),
            Column::Float(v) => Column::Float(keep(v, mask)),
            Column::Category(v) => Column::Category(keep(v, mask)),
        }
    }

    pub fn to_json(&self) -> Vec<Json> {
        match self {
            Column::Axis(v) => v.iter().map(AxisValue::to_json).collect(),
            Column::Float(v) => v
                .iter()
                .map(|f| serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null))
                .collect(),
            Column::Category(v) => v.iter().map(|c| c.clone().map(Json::String).unwrap_or(Json::Null)).collect(),
        }
    }

    /// Decode a JSON array: all numbers/timestamps make an axis column, all
    /// strings/nulls a category column.
    fn from_json(name: &str, values: &[Json]) -> Result<Column, FrameError> {
        let axis: Option<Vec<AxisValue>> = values.iter().map(AxisValue::from_json).collect();
        if let Some(axis) = axis {
            return Ok(Column::Axis(axis));
        }
        let cats: Option<Vec<Option<String>>> = values
            .iter()
            .map(|v| match v {
                Json::String(s) => Some(Some(s.clone())),
                Json::Null => Some(None),
                _ => None,
            })
            .collect();
        cats.map(Column::Category)
            .ok_or_else(|| FrameError::Undecodable(name.to_string(), "mixed value types".into()))
    }
}

/// Named columns of equal length, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column. Replacing keeps the column's position.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self, FrameError> {
        let name = name.into();
        if let Some((_, first)) = self.columns.iter().find(|(n, _)| *n != name) {
            if first.len() != column.len() {
                return Err(FrameError::LengthMismatch { column: name, expected: first.len(), found: column.len() });
            }
        }
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// The named column's samples, if it is an axis column.
    pub fn axis(&self, name: &str) -> Result<&[AxisValue], FrameError> {
        let col = self.column(name).ok_or_else(|| FrameError::MissingColumn(name.to_string()))?;
        col.as_axis().ok_or_else(|| FrameError::NotAxis(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(|(_, c)| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New frame holding only the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Frame, FrameError> {
        if mask.len() != self.len() {
            return Err(FrameError::LengthMismatch { column: "<mask>".into(), expected: self.len(), found: mask.len() });
        }
        Ok(Frame { columns: self.columns.iter().map(|(n, c)| (n.clone(), c.filter(mask))).collect() })
    }

    /// Decode `{"col": [..], ...}`. Columns keep their document order.
    pub fn from_json(v: &Json) -> Result<Frame, FrameError> {
        let obj = v
            .as_object()
            .ok_or_else(|| FrameError::Undecodable("<frame>".into(), "expected an object of columns".into()))?;
        let mut frame = Frame::new();
        for (name, values) in obj {
            let values = values
                .as_array()
                .ok_or_else(|| FrameError::Undecodable(name.clone(), "expected an array".into()))?;
            frame = frame.with_column(name.clone(), Column::from_json(name, values)?)?;
        }
        Ok(frame)
    }

    pub fn to_json(&self) -> Json {
        let mut out = Map::new();
        for (name, col) in &self.columns {
            out.insert(name.clone(), Json::Array(col.to_json()));
        }
        Json::Object(out)
    }
}
