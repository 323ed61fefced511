//! Core types for Proxydeck

use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use std::cmp::Ordering;

/// PID value the dashboard stores when a process slot is not bound yet.
pub const PID_UNSET: &str = "0000";

/// A managed proxy/instance pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    /// User-facing ordinal. Not unique, not contiguous.
    pub instance_number: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pid1: Option<String>,
    #[serde(default)]
    pub pid2: Option<String>,
    #[serde(default)]
    pub proxy_name: Option<String>,
    #[serde(default)]
    pub proxy_ip: Option<String>,
    #[serde(default)]
    pub proxy_port: Option<u16>,
    #[serde(default)]
    pub proxy_login: Option<String>,
    #[serde(default)]
    pub proxy_password: Option<String>,
    /// Stable id in the exported profile. Never changes once set.
    #[serde(default)]
    pub ppx_proxy_id: Option<i64>,
    #[serde(default)]
    pub ppx_rule_order: Option<i64>,
    /// Epoch milliseconds
    pub created_at: i64,
    pub updated_at: i64,
}

impl InstanceRecord {
    /// Both PIDs, when bound. Blank values and the `0000` sentinel count as unset.
    pub fn pids(&self) -> Option<(&str, &str)> {
        Some((bound_pid(self.pid1.as_deref())?, bound_pid(self.pid2.as_deref())?))
    }

    /// Display name used for routing rules.
    pub fn rule_name(&self) -> String {
        non_blank(self.proxy_name.as_deref())
            .or_else(|| non_blank(self.name.as_deref()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("Instance {}", self.instance_number))
    }
}

fn bound_pid(pid: Option<&str>) -> Option<&str> {
    non_blank(pid).filter(|p| *p != PID_UNSET)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Canonical instance ordering: rule order (nulls last), instance number,
/// creation time, then id so the order is total.
pub fn cmp_canonical(a: &InstanceRecord, b: &InstanceRecord) -> Ordering {
    let rule_order = match (a.ppx_rule_order, b.ppx_rule_order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    rule_order
        .then(a.instance_number.cmp(&b.instance_number))
        .then(a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Fields accepted when creating an instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewInstance {
    pub instance_number: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pid1: Option<String>,
    #[serde(default)]
    pub pid2: Option<String>,
    #[serde(default)]
    pub proxy_name: Option<String>,
    #[serde(default)]
    pub proxy_ip: Option<String>,
    #[serde(default)]
    pub proxy_port: Option<u16>,
    #[serde(default)]
    pub proxy_login: Option<String>,
    #[serde(default)]
    pub proxy_password: Option<String>,
    #[serde(default)]
    pub ppx_rule_order: Option<i64>,
}

/// Partial update of an instance.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it (JSON `null`).
/// `ppx_proxy_id` is deliberately absent: only the profile generator assigns it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstancePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_number: Option<i64>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub name: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub pid1: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub pid2: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub proxy_name: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub proxy_ip: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<Option<u16>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub proxy_login: Option<Option<String>>,
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<Option<String>>,
}

impl InstancePatch {
    pub fn is_empty(&self) -> bool {
        self.instance_number.is_none()
            && self.name.is_none()
            && self.pid1.is_none()
            && self.pid2.is_none()
            && self.proxy_name.is_none()
            && self.proxy_ip.is_none()
            && self.proxy_port.is_none()
            && self.proxy_login.is_none()
            && self.proxy_password.is_none()
    }

    pub(crate) fn apply(&self, record: &mut InstanceRecord) {
        if let Some(n) = self.instance_number {
            record.instance_number = n;
        }
        let text_fields = [
            (&self.name, &mut record.name),
            (&self.pid1, &mut record.pid1),
            (&self.pid2, &mut record.pid2),
            (&self.proxy_name, &mut record.proxy_name),
            (&self.proxy_ip, &mut record.proxy_ip),
            (&self.proxy_login, &mut record.proxy_login),
            (&self.proxy_password, &mut record.proxy_password),
        ];
        for (patch, field) in text_fields {
            if let Some(value) = patch {
                field.clone_from(value);
            }
        }
        if let Some(port) = self.proxy_port {
            record.proxy_port = port;
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::InstanceRecord;

    /// A record with a complete proxy and both PIDs bound.
    pub fn complete(id: &str, instance_number: i64) -> InstanceRecord {
        InstanceRecord {
            id: id.to_string(),
            instance_number,
            name: Some(format!("acct-{instance_number}")),
            pid1: Some(format!("{instance_number}1")),
            pid2: Some(format!("{instance_number}2")),
            proxy_name: Some(format!("proxy-{instance_number}")),
            proxy_ip: Some(format!("10.0.0.{instance_number}")),
            proxy_port: Some(1080),
            proxy_login: Some("user".to_string()),
            proxy_password: Some("secret".to_string()),
            ppx_proxy_id: None,
            ppx_rule_order: None,
            created_at: 1_700_000_000_000 + instance_number,
            updated_at: 1_700_000_000_000 + instance_number,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::complete;
    use super::*;

    #[test]
    fn test_pids_treat_sentinel_as_unset() {
        let mut record = complete("a", 1);
        assert_eq!(record.pids(), Some(("11", "12")));

        record.pid2 = Some(PID_UNSET.to_string());
        assert_eq!(record.pids(), None);

        record.pid2 = Some("  ".to_string());
        assert_eq!(record.pids(), None);
    }

    #[test]
    fn test_rule_name_fallback() {
        let mut record = complete("a", 7);
        assert_eq!(record.rule_name(), "proxy-7");

        record.proxy_name = None;
        assert_eq!(record.rule_name(), "acct-7");

        record.name = Some(String::new());
        assert_eq!(record.rule_name(), "Instance 7");
    }

    #[test]
    fn test_canonical_order_puts_unordered_last() {
        let mut ordered_late = complete("a", 9);
        ordered_late.ppx_rule_order = Some(2);
        let mut ordered_early = complete("b", 5);
        ordered_early.ppx_rule_order = Some(1);
        let unordered_low = complete("c", 1);
        let mut same_number_older = complete("d", 1);
        same_number_older.created_at -= 10;

        let mut records = vec![
            unordered_low.clone(),
            ordered_late.clone(),
            same_number_older.clone(),
            ordered_early.clone(),
        ];
        records.sort_by(cmp_canonical);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn test_patch_leaves_ppx_state_alone() {
        let mut record = complete("a", 1);
        record.ppx_proxy_id = Some(120);

        let patch = InstancePatch {
            proxy_ip: Some(Some("192.168.1.1".to_string())),
            proxy_port: Some(Some(9050)),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut record);

        assert_eq!(record.proxy_ip.as_deref(), Some("192.168.1.1"));
        assert_eq!(record.proxy_port, Some(9050));
        assert_eq!(record.proxy_login.as_deref(), Some("user"));
        assert_eq!(record.ppx_proxy_id, Some(120));
    }

    #[test]
    fn test_patch_can_clear_fields() {
        let mut record = complete("a", 1);
        let patch: InstancePatch =
            serde_json::from_str(r#"{"proxy_port": null, "name": null, "pid1": "555"}"#).unwrap();
        assert_eq!(patch.proxy_port, Some(None));
        assert_eq!(patch.proxy_ip, None);
        patch.apply(&mut record);

        assert_eq!(record.proxy_port, None);
        assert_eq!(record.name, None);
        assert_eq!(record.pid1.as_deref(), Some("555"));
        assert_eq!(record.proxy_ip.as_deref(), Some("10.0.0.1"));
    }
}
