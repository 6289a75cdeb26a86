//! Uniform synchronizer: rebinds sub-surfaces to the chunks around them.
//!
//! Every pass overwrites each visited binding state wholesale, so a state
//! can never keep chunk references from an earlier level or pose.

use crate::binding::{BindingState, MAX_CHUNKS};
use crate::error::{PlaneError, Result};
use crate::plane::{ProjectionPlane, WorldBounds};

/// Counters of one synchronization pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Sub-surfaces whose binding state was rewritten.
    pub visited: usize,
    /// Of those, how many received at least one chunk.
    pub populated: usize,
    /// Of those, how many ended up with no chunk at all.
    pub empty: usize,
    /// Queries where the provider returned more than eight chunks.
    pub truncated: usize,
}

impl ProjectionPlane {
    /// Rebinds every sub-surface, row-major.
    ///
    /// Fails with [`PlaneError::ProviderUnavailable`] before touching any
    /// state when no provider is attached.
    pub fn synchronize(&mut self) -> Result<SyncReport> {
        let all = 0..self.grid().len();
        let report = self.synchronize_indices(all)?;
        self.mark_synchronized();

        log::debug!(
            "Synchronized {} sub-surfaces at level {} ({} populated, {} empty)",
            report.visited,
            self.resolution_level(),
            report.populated,
            report.empty
        );
        Ok(report)
    }

    /// Rebinds only the sub-surfaces whose world footprint intersects `view`.
    ///
    /// This is a partial refresh; `needs_synchronize` stays set.
    pub fn synchronize_within(&mut self, view: &WorldBounds) -> Result<SyncReport> {
        let visible: Vec<usize> = (0..self.grid().len())
            .filter(|&i| {
                self.sub_surface_world_bounds(i)
                    .is_some_and(|b| b.intersects(view))
            })
            .collect();

        self.synchronize_indices(visible)
    }

    /// Rebinds an explicit set of sub-surfaces, in the order given.
    /// Out-of-range indices are skipped.
    pub fn synchronize_indices<I>(&mut self, indices: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = usize>,
    {
        let provider = self.provider().cloned().ok_or(PlaneError::ProviderUnavailable)?;

        let level = self.resolution_level();
        let chunk_size = provider.chunk_edge_length_world(level);
        let mut report = SyncReport::default();

        for index in indices {
            let Some(center) = self.sub_surface_world_center(index) else {
                continue;
            };

            let chunks = provider.closest_chunks(center, level);
            if chunks.len() > MAX_CHUNKS {
                log::warn!(
                    "Provider returned {} chunks for sub-surface {} at level {}; keeping the first {}.",
                    chunks.len(),
                    index,
                    level,
                    MAX_CHUNKS
                );
                report.truncated += 1;
            }

            let state = BindingState::from_chunks(&chunks, chunk_size);
            if state.is_empty() {
                report.empty += 1;
            } else {
                report.populated += 1;
            }
            report.visited += 1;

            log::trace!(
                "sub-surface {} center=({:.4},{:.4},{:.4}) chunks={}",
                index,
                center.x,
                center.y,
                center.z,
                state.valid_count()
            );

            self.grid_mut().write_binding(index, state);
        }

        Ok(report)
    }
}
