//! Assembly of graphs from independently decoded fragments.
//!
//! Asset formats commonly describe a single mesh as several primitives, each of
//! which is decoded into its own graph. Assembly merges these fragments in
//! order into one graph. Each fragment owns its own key space, so fragments can
//! be decoded independently (such as on separate threads) and only merging
//! requires exclusive ownership.

use log::{debug, warn};

use crate::encoding::EncodingError;
use crate::graph::MeshGraph;

/// Handling of fragments that fail to decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConversionMode {
    /// Aborts assembly on the first failed fragment.
    Strict,
    /// Skips failed fragments and reports them in the [`Assembly`].
    Lenient,
}

impl Default for ConversionMode {
    fn default() -> Self {
        ConversionMode::Strict
    }
}

/// Graph assembled from fragments and the fragments that were skipped.
#[derive(Debug)]
pub struct Assembly {
    pub graph: MeshGraph,
    /// Indices and errors of fragments that failed to decode.
    ///
    /// This is always empty in strict mode.
    pub skipped: Vec<(usize, EncodingError)>,
}

impl Assembly {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn into_graph(self) -> MeshGraph {
        self.graph
    }
}

/// Merges decoded fragments into a single graph.
///
/// Fragments are merged in order, so the keys of each fragment are translated
/// past the keys of all previous (merged) fragments.
///
/// # Errors
///
/// In strict mode, returns the error of the first failed fragment. In either
/// mode, returns an error if merging a fragment exhausts the key space.
pub fn assemble<I>(fragments: I, mode: ConversionMode) -> Result<Assembly, EncodingError>
where
    I: IntoIterator<Item = Result<MeshGraph, EncodingError>>,
{
    let mut graph = MeshGraph::new();
    let mut skipped = Vec::new();
    for (index, fragment) in fragments.into_iter().enumerate() {
        match (fragment, mode) {
            (Ok(fragment), _) => {
                graph = graph.merge(fragment)?;
            }
            (Err(error), ConversionMode::Strict) => {
                return Err(error);
            }
            (Err(error), ConversionMode::Lenient) => {
                warn!("skipping fragment {}: {}", index, error);
                skipped.push((index, error));
            }
        }
    }
    debug!(
        "assembled {} faces from fragments; skipped {}",
        graph.face_count(),
        skipped.len(),
    );
    Ok(Assembly { graph, skipped })
}
