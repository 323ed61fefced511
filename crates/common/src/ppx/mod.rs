//! Proxifier (PPX) profile generation
//!
//! A profile is produced in three steps over the canonical instance order:
//! - allocate stable proxy ids for instances that have none, persisting each
//! - render one `<Proxy>` per instance with a complete proxy definition
//! - render one `<Rule>` per instance with both PIDs bound, followed by the
//!   fixed static rules
//!
//! Ids are never reassigned, so regenerating without data changes yields the
//! same document byte for byte.

pub mod allocate;
pub mod generator;
pub mod render;
pub mod template;

pub use allocate::{apply_allocation, plan_allocation, Allocation, AllocationPlan};
pub use generator::{GeneratedProfile, ProfileGenerator, ProfilePlan};
pub use render::{render_profile, xml_escape, ProfileSummary, RenderedProfile, Section, SkipReason, SkippedRecord};
pub use template::fill_slots;

/// First allocated id is one above this when no instance has an id yet.
pub const DEFAULT_ID_BASELINE: i64 = 99;

/// Upper bound for a configured baseline, leaving room below `i32::MAX`
/// for the ids allocated above it.
pub const MAX_ID_BASELINE: i64 = 1_000_000_000;
