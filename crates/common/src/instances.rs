//! Instance records and the store the profile generator reads from.

use crate::types::{InstancePatch, InstanceRecord, NewInstance};
use crate::{Database, Error, Result};
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Storage operations the profile generator depends on.
pub trait InstanceStore {
    /// All instances in canonical order (see [`crate::types::cmp_canonical`]).
    fn list_instances_ordered(&self) -> Result<Vec<InstanceRecord>>;

    /// Persist a freshly allocated ppx id for one instance.
    fn set_ppx_proxy_id(&self, instance_id: &str, ppx_proxy_id: i64) -> Result<()>;
}

impl<S: InstanceStore + ?Sized> InstanceStore for &S {
    fn list_instances_ordered(&self) -> Result<Vec<InstanceRecord>> {
        (**self).list_instances_ordered()
    }

    fn set_ppx_proxy_id(&self, instance_id: &str, ppx_proxy_id: i64) -> Result<()> {
        (**self).set_ppx_proxy_id(instance_id, ppx_proxy_id)
    }
}

const SELECT_COLUMNS: &str = "id, instance_number, name, pid1, pid2, proxy_name, proxy_ip, \
     proxy_port, proxy_login, proxy_password, ppx_proxy_id, ppx_rule_order, created_at, updated_at";

const CANONICAL_ORDER: &str =
    "ppx_rule_order IS NULL, ppx_rule_order ASC, instance_number ASC, created_at ASC, id ASC";

/// SQLite-backed instance repository
#[derive(Clone)]
pub struct InstanceRepo {
    db: Database,
}

impl InstanceRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create_instance(&self, new: NewInstance) -> Result<InstanceRecord> {
        let now = now_epoch_millis();
        let record = InstanceRecord {
            id: Uuid::new_v4().to_string(),
            instance_number: new.instance_number,
            name: new.name,
            pid1: new.pid1,
            pid2: new.pid2,
            proxy_name: new.proxy_name,
            proxy_ip: new.proxy_ip,
            proxy_port: new.proxy_port,
            proxy_login: new.proxy_login,
            proxy_password: new.proxy_password,
            ppx_proxy_id: None,
            ppx_rule_order: new.ppx_rule_order,
            created_at: now,
            updated_at: now,
        };

        let conn = self.db.connection();
        let conn = conn.lock();
        conn.execute(
            &format!("INSERT INTO instances ({SELECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"),
            params![
                record.id,
                record.instance_number,
                record.name,
                record.pid1,
                record.pid2,
                record.proxy_name,
                record.proxy_ip,
                record.proxy_port,
                record.proxy_login,
                record.proxy_password,
                record.ppx_proxy_id,
                record.ppx_rule_order,
                record.created_at,
                record.updated_at,
            ],
        )?;

        info!("Created instance #{} ({})", record.instance_number, record.id);
        Ok(record)
    }

    pub fn get_instance(&self, id: &str) -> Result<Option<InstanceRecord>> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let record = conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM instances WHERE id = ?1"),
                params![id],
                instance_from_row,
            )
            .optional()?;
        Ok(record)
    }

    /// List instances in canonical order
    pub fn list_instances(&self) -> Result<Vec<InstanceRecord>> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM instances ORDER BY {CANONICAL_ORDER}"
        ))?;

        let rows = stmt.query_map([], instance_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    pub fn update_instance(&self, id: &str, patch: &InstancePatch) -> Result<InstanceRecord> {
        let mut record = self
            .get_instance(id)?
            .ok_or_else(|| Error::instance_not_found(id))?;

        if patch.is_empty() {
            return Ok(record);
        }

        patch.apply(&mut record);
        record.updated_at = now_epoch_millis();

        let conn = self.db.connection();
        let conn = conn.lock();
        conn.execute(
            "UPDATE instances SET instance_number = ?1, name = ?2, pid1 = ?3, pid2 = ?4, \
             proxy_name = ?5, proxy_ip = ?6, proxy_port = ?7, proxy_login = ?8, \
             proxy_password = ?9, updated_at = ?10 WHERE id = ?11",
            params![
                record.instance_number,
                record.name,
                record.pid1,
                record.pid2,
                record.proxy_name,
                record.proxy_ip,
                record.proxy_port,
                record.proxy_login,
                record.proxy_password,
                record.updated_at,
                id,
            ],
        )?;

        debug!("Updated instance {}", id);
        Ok(record)
    }

    /// Set or clear the explicit rule order of an instance
    pub fn set_rule_order(&self, id: &str, order: Option<i64>) -> Result<()> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let rows = conn.execute(
            "UPDATE instances SET ppx_rule_order = ?1, updated_at = ?2 WHERE id = ?3",
            params![order, now_epoch_millis(), id],
        )?;

        if rows == 0 {
            return Err(Error::instance_not_found(id));
        }
        debug!("Set rule order of instance {} to {:?}", id, order);
        Ok(())
    }

    pub fn delete_instance(&self, id: &str) -> Result<bool> {
        let conn = self.db.connection();
        let conn = conn.lock();
        let rows = conn.execute("DELETE FROM instances WHERE id = ?1", params![id])?;

        if rows > 0 {
            info!("Deleted instance {}", id);
        }
        Ok(rows > 0)
    }
}

impl InstanceStore for InstanceRepo {
    fn list_instances_ordered(&self) -> Result<Vec<InstanceRecord>> {
        self.list_instances()
    }

    fn set_ppx_proxy_id(&self, instance_id: &str, ppx_proxy_id: i64) -> Result<()> {
        let conn = self.db.connection();
        let conn = conn.lock();
        // Only fill an empty slot; an assigned id is never rewritten.
        let rows = conn.execute(
            "UPDATE instances SET ppx_proxy_id = ?1, updated_at = ?2 \
             WHERE id = ?3 AND ppx_proxy_id IS NULL",
            params![ppx_proxy_id, now_epoch_millis(), instance_id],
        )?;

        if rows == 0 {
            return Err(Error::AllocationConflict {
                instance_id: instance_id.to_string(),
                ppx_proxy_id,
            });
        }
        debug!("Assigned ppx id {} to instance {}", ppx_proxy_id, instance_id);
        Ok(())
    }
}

fn instance_from_row(row: &Row<'_>) -> rusqlite::Result<InstanceRecord> {
    Ok(InstanceRecord {
        id: row.get(0)?,
        instance_number: row.get(1)?,
        name: row.get(2)?,
        pid1: row.get(3)?,
        pid2: row.get(4)?,
        proxy_name: row.get(5)?,
        proxy_ip: row.get(6)?,
        proxy_port: row.get(7)?,
        proxy_login: row.get(8)?,
        proxy_password: row.get(9)?,
        ppx_proxy_id: row.get(10)?,
        ppx_rule_order: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn now_epoch_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
