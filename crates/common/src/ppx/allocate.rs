//! Stable proxy id allocation

use crate::instances::InstanceStore;
use crate::types::InstanceRecord;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One id handed out to an instance that had none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub instance_id: String,
    pub ppx_proxy_id: i64,
}

/// Records with every missing id filled in, plus the writes that persist them.
#[derive(Debug, Clone)]
pub struct AllocationPlan {
    pub records: Vec<InstanceRecord>,
    pub writes: Vec<Allocation>,
}

/// Assign ids to records lacking one, in sequence order, continuing from
/// `max(baseline, highest existing id)`. Existing ids are left untouched.
///
/// Fails without assigning anything when the id space would overflow.
pub fn plan_allocation(mut records: Vec<InstanceRecord>, baseline: i64) -> Result<AllocationPlan> {
    let mut next = records
        .iter()
        .filter_map(|r| r.ppx_proxy_id)
        .fold(baseline, i64::max);

    let mut writes = Vec::new();
    for record in records.iter_mut().filter(|r| r.ppx_proxy_id.is_none()) {
        next = next.checked_add(1).ok_or_else(|| {
            Error::Internal(format!(
                "ppx id space exhausted after {} (instance {})",
                next, record.id
            ))
        })?;
        record.ppx_proxy_id = Some(next);
        writes.push(Allocation {
            instance_id: record.id.clone(),
            ppx_proxy_id: next,
        });
    }

    Ok(AllocationPlan { records, writes })
}

/// Persist allocations one at a time, in order.
///
/// Stops at the first failed write. Earlier writes stay committed, which is
/// safe: a rerun skips instances that already carry an id.
pub fn apply_allocation<S: InstanceStore>(store: &S, writes: &[Allocation]) -> Result<()> {
    for write in writes {
        store.set_ppx_proxy_id(&write.instance_id, write.ppx_proxy_id)?;
        debug!(
            instance_id = %write.instance_id,
            ppx_proxy_id = write.ppx_proxy_id,
            "persisted ppx id"
        );
    }
    Ok(())
}
