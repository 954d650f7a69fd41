//! Label graph public façade.
//!
//! [`label_graph`] sends a chart and its current labels to an editing surface,
//! reads the edits back and derives a per-sample category series. [`label_group`]
//! does the same for one group of a caller-owned [`LabelStore`], reconciling the
//! edits into it.

#![forbid(unsafe_code)]

use labelgraph_codec::{decode_response, encode_request, Inbound};
use tracing::{debug, info};

pub mod settings;
pub mod surface;

pub use labelgraph_codec::{CodecError, SurfaceRequest};
pub use labelgraph_core::axis;
pub use labelgraph_core::prelude::*;
pub use labelgraph_project::{apply_label_column, project, slice_by_labels, DEFAULT_OUTPUT_COLUMN};
pub use labelgraph_store::{Entry, LabelStore, PrunePolicy, Reconciled};
pub use settings::Settings;
pub use surface::{EditingSurface, ScriptedSurface};

#[derive(Debug, thiserror::Error)]
pub enum LabelGraphError {
    #[error(transparent)]
    Chart(#[from] CoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("editing surface: {0:#}")]
    Surface(anyhow::Error),
}

pub type LabelGraphResult<T> = Result<T, LabelGraphError>;

/// Show `labels` on `figure` for editing and return the edited state.
///
/// `key` tells apart several widgets in one session. `series` is present only when
/// the figure's axis is backed by a frame column and has samples.
pub fn label_graph<S: EditingSurface + ?Sized>(
    surface: &mut S,
    figure: &Figure,
    config: &LabelConfig,
    labels: Option<&[Label]>,
    key: Option<&str>,
    settings: &Settings,
) -> LabelGraphResult<LabelResult> {
    let batch = exchange(surface, figure, config, labels.unwrap_or(&[]), key, settings)?;
    Ok(finish(batch, figure.axis()))
}

/// [`label_graph`] for one group of `store`: the group's labels seed the surface,
/// the edits are reconciled back, and the result carries the reconciled set.
pub fn label_group<S: EditingSurface + ?Sized>(
    surface: &mut S,
    store: &mut LabelStore,
    group: &str,
    figure: &Figure,
    config: &LabelConfig,
    settings: &Settings,
) -> LabelGraphResult<LabelResult> {
    let initial = store.get(group);
    let batch = exchange(surface, figure, config, &initial, Some(group), settings)?;
    let reconciled = store.reconcile_with(group, &batch, settings.prune);
    info!(
        group,
        labels = reconciled.labels.len(),
        upserted = reconciled.upserted,
        deleted = reconciled.deleted + reconciled.pruned,
        "label group updated"
    );
    let batch = EditedBatch { labels: reconciled.labels, selection: batch.selection, deleted: batch.deleted };
    Ok(finish(batch, figure.axis()))
}

fn exchange<S: EditingSurface + ?Sized>(
    surface: &mut S,
    figure: &Figure,
    config: &LabelConfig,
    labels: &[Label],
    key: Option<&str>,
    settings: &Settings,
) -> LabelGraphResult<EditedBatch> {
    let domain = figure.axis().domain();
    debug!(?domain, samples = figure.axis().len(), labels = labels.len(), "rendering label graph");
    let request = encode_request(figure, &settings.chart_flags, config, labels)?;
    let value = surface.render(key, &request).map_err(LabelGraphError::Surface)?;
    let inbound = Inbound { prior: labels, domain, strict: settings.strict_categories.then_some(config) };
    Ok(decode_response(value, &inbound)?)
}

fn finish(batch: EditedBatch, axis: &Axis) -> LabelResult {
    let series = (axis.indexed && !axis.is_empty()).then(|| project(&batch.labels, &axis.values));
    LabelResult::from_batch(batch, series)
}
