//! The editing surface seam: one synchronous round trip per invocation.

use std::collections::VecDeque;

use anyhow::Result;
use labelgraph_codec::SurfaceRequest;
use serde_json::Value as Json;

/// Renders the chart for editing and hands back the user's edits.
///
/// `Ok(None)` means the surface has no value yet (first render); callers substitute
/// the prior state.
pub trait EditingSurface {
    fn render(&mut self, key: Option<&str>, request: &SurfaceRequest) -> Result<Option<Json>>;
}

/// Replays queued responses in order, then answers `None`. Records every request.
#[derive(Debug, Default)]
pub struct ScriptedSurface {
    responses: VecDeque<Option<Json>>,
    requests: Vec<(Option<String>, SurfaceRequest)>,
}

impl ScriptedSurface {
    pub fn new(responses: impl IntoIterator<Item = Option<Json>>) -> Self {
        Self { responses: responses.into_iter().collect(), requests: Vec::new() }
    }

    pub fn push(&mut self, response: Option<Json>) {
        self.responses.push_back(response);
    }

    pub fn requests(&self) -> &[(Option<String>, SurfaceRequest)] {
        &self.requests
    }
}

impl EditingSurface for ScriptedSurface {
    fn render(&mut self, key: Option<&str>, request: &SurfaceRequest) -> Result<Option<Json>> {
        self.requests.push((key.map(str::to_string), request.clone()));
        Ok(self.responses.pop_front().flatten())
    }
}
