//! Label graph edit payload codec.
//!
//! Outbound: chart, chart options, label config and current labels, each rendered as
//! a JSON document for the editing surface. Time-based bounds travel as milliseconds
//! since epoch.
//!
//! Inbound: the surface's edited batch. A missing answer (first render) becomes the
//! prior labels with empty selection/deletions; numeric bounds are read back in the
//! axis domain of the current invocation.

#![forbid(unsafe_code)]

use labelgraph_core::{AxisDomain, AxisValue, EditedBatch, Figure, KeySet, Label, LabelConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encoding {what}: {source}")]
    Encode { what: &'static str, #[source] source: serde_json::Error },
    #[error("malformed editor response: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("label {key}: unsupported {side} bound {value}")]
    InvalidBound { key: String, side: &'static str, value: String },
    #[error("label {key}: unknown category {category}")]
    UnknownCategory { key: String, category: String },
}

/// Arguments handed to the editing surface. Every field is a JSON document in text
/// form, matching the component protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    pub plotly_spec: String,
    pub plotly_config: String,
    pub config: String,
    pub labels: String,
}

/// Outbound label: bounds already in wire form.
#[derive(Debug, Clone, Serialize)]
struct WireLabelOut<'a> {
    key: &'a str,
    category: &'a str,
    left: f64,
    right: f64,
}

/// Inbound label: bounds kept raw until the domain is applied. Extra fields the
/// surface echoes back (e.g. a host-side `group`) are ignored.
#[derive(Debug, Deserialize)]
struct WireLabelIn {
    key: String,
    category: String,
    left: Json,
    right: Json,
}

#[derive(Debug, Default, Deserialize)]
struct WireBatch {
    #[serde(default)]
    labels: Option<Vec<WireLabelIn>>,
    #[serde(default)]
    selection: Option<KeySet>,
    #[serde(default)]
    deleted: Option<KeySet>,
}

/// Chart options with the surface defaults; caller flags are merged in verbatim
/// and win over the defaults.
pub fn chart_options(flags: &Map<String, Json>) -> Map<String, Json> {
    let mut out = Map::new();
    out.insert("showLink".into(), Json::Bool(false));
    out.insert("linkText".into(), Json::Bool(false));
    for (k, v) in flags {
        out.insert(k.clone(), v.clone());
    }
    out
}

/// Wire form of a label list.
pub fn encode_labels(labels: &[Label]) -> Result<String, CodecError> {
    let wire: Vec<WireLabelOut<'_>> = labels
        .iter()
        .map(|l| WireLabelOut { key: &l.key, category: &l.category, left: l.left.to_wire(), right: l.right.to_wire() })
        .collect();
    serde_json::to_string(&wire).map_err(|source| CodecError::Encode { what: "labels", source })
}

pub fn encode_request(
    figure: &Figure,
    flags: &Map<String, Json>,
    config: &LabelConfig,
    labels: &[Label],
) -> Result<SurfaceRequest, CodecError> {
    let plotly_spec =
        serde_json::to_string(figure.spec()).map_err(|source| CodecError::Encode { what: "chart", source })?;
    let plotly_config = serde_json::to_string(&chart_options(flags))
        .map_err(|source| CodecError::Encode { what: "chart options", source })?;
    let config = serde_json::to_string(config).map_err(|source| CodecError::Encode { what: "label config", source })?;
    let labels = encode_labels(labels)?;
    Ok(SurfaceRequest { plotly_spec, plotly_config, config, labels })
}

/// Context needed to read a response back.
#[derive(Debug, Clone, Copy)]
pub struct Inbound<'a> {
    /// Labels the surface was asked to display.
    pub prior: &'a [Label],
    pub domain: Option<AxisDomain>,
    /// When set, every returned label must reference one of these categories.
    pub strict: Option<&'a LabelConfig>,
}

pub fn decode_response(value: Option<Json>, inbound: &Inbound<'_>) -> Result<EditedBatch, CodecError> {
    let value = match value {
        None | Some(Json::Null) => {
            debug!(labels = inbound.prior.len(), "no editor value; using prior labels");
            return Ok(EditedBatch::seeded(inbound.prior.to_vec()));
        }
        Some(v) => v,
    };
    let wire: WireBatch = serde_json::from_value(value).map_err(CodecError::Malformed)?;
    let labels = match wire.labels {
        Some(ls) => {
            let labels = ls.into_iter().map(|l| decode_label(l, inbound.domain)).collect::<Result<Vec<_>, _>>()?;
            if let Some(cfg) = inbound.strict {
                check_categories(&labels, cfg)?;
            }
            labels
        }
        None => {
            warn!("editor response without labels; keeping prior labels");
            inbound.prior.to_vec()
        }
    };
    Ok(EditedBatch { labels, selection: wire.selection.unwrap_or_default(), deleted: wire.deleted.unwrap_or_default() })
}

/// Only labels coming back from the surface are checked; prior labels are the
/// caller's and pass through as given.
fn check_categories(labels: &[Label], cfg: &LabelConfig) -> Result<(), CodecError> {
    match labels.iter().find(|l| !cfg.has_category(&l.category)) {
        Some(bad) => Err(CodecError::UnknownCategory { key: bad.key.clone(), category: bad.category.clone() }),
        None => Ok(()),
    }
}

fn decode_label(l: WireLabelIn, domain: Option<AxisDomain>) -> Result<Label, CodecError> {
    let left = decode_bound(&l.key, "left", &l.left, domain)?;
    let right = decode_bound(&l.key, "right", &l.right, domain)?;
    Ok(Label { key: l.key, category: l.category, left, right })
}

/// Numbers follow the domain; strings are taken as already-native timestamps.
fn decode_bound(key: &str, side: &'static str, v: &Json, domain: Option<AxisDomain>) -> Result<AxisValue, CodecError> {
    let decoded = match v {
        Json::Number(n) => n.as_f64().and_then(|raw| AxisValue::from_wire(raw, domain)),
        Json::String(_) => AxisValue::from_json(v),
        _ => None,
    };
    decoded.ok_or_else(|| CodecError::InvalidBound { key: key.to_string(), side, value: v.to_string() })
}
