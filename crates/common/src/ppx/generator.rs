//! Fetch, allocate, render

use crate::instances::InstanceStore;
use crate::ppx::allocate::{apply_allocation, plan_allocation, Allocation};
use crate::ppx::render::{render_profile, ProfileSummary, RenderedProfile};
use crate::ppx::DEFAULT_ID_BASELINE;
use crate::Result;
use serde::Serialize;
use tracing::info;

/// Result of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedProfile {
    pub xml: String,
    /// Ids handed out (and persisted) during this run
    pub allocated: Vec<Allocation>,
    pub summary: ProfileSummary,
}

/// What a generation run would do, computed without writing
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePlan {
    pub pending: Vec<Allocation>,
    pub summary: ProfileSummary,
}

/// Generates Proxifier profiles from an instance store.
///
/// Runs are sequential and uncoordinated: two concurrent runs can read the
/// same maximum id and hand out the same value twice.
pub struct ProfileGenerator<S> {
    store: S,
    id_baseline: i64,
}

impl<S: InstanceStore> ProfileGenerator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            id_baseline: DEFAULT_ID_BASELINE,
        }
    }

    pub fn with_id_baseline(mut self, id_baseline: i64) -> Self {
        self.id_baseline = id_baseline;
        self
    }

    /// Allocate missing ids, persist them, and render the profile.
    ///
    /// Any fetch or write error aborts the run without output. Writes that
    /// succeeded before the failure are kept.
    pub fn generate(&self) -> Result<GeneratedProfile> {
        let records = self.store.list_instances_ordered()?;
        let plan = plan_allocation(records, self.id_baseline)?;

        apply_allocation(&self.store, &plan.writes)?;
        if !plan.writes.is_empty() {
            info!("Allocated {} new ppx ids", plan.writes.len());
        }

        let rendered = render_profile(&plan.records)?;
        Ok(GeneratedProfile {
            xml: rendered.xml,
            allocated: plan.writes,
            summary: rendered.summary,
        })
    }

    /// Render the profile from the ids already stored, without allocating.
    ///
    /// Records still waiting for an id are left out of both sections.
    pub fn render_existing(&self) -> Result<RenderedProfile> {
        let records = self.store.list_instances_ordered()?;
        render_profile(&records)
    }

    /// Report pending allocations and per-section coverage without writing.
    pub fn preview(&self) -> Result<ProfilePlan> {
        let records = self.store.list_instances_ordered()?;
        let plan = plan_allocation(records, self.id_baseline)?;
        let rendered = render_profile(&plan.records)?;

        Ok(ProfilePlan {
            pending: plan.writes,
            summary: rendered.summary,
        })
    }
}
