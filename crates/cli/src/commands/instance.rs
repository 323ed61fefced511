//! Instance Commands

use anyhow::{bail, Result};
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use proxydeck_common::{InstancePatch, InstanceRecord, NewInstance};

use super::Context;
use crate::output::{print_item, print_list, print_success, TableDisplay};

#[derive(Subcommand)]
pub enum InstanceCommands {
    /// List all instances in profile order
    List,

    /// Get instance details
    Get {
        /// Instance ID
        id: String,
    },

    /// Add a new instance
    Add {
        /// Instance number shown in the dashboard
        #[arg(short, long)]
        number: i64,

        /// Explicit position in the generated rule list
        #[arg(long)]
        order: Option<i64>,

        #[command(flatten)]
        fields: InstanceFields,
    },

    /// Edit an instance
    Edit {
        /// Instance ID
        id: String,

        /// Instance number shown in the dashboard
        #[arg(short, long)]
        number: Option<i64>,

        #[command(flatten)]
        fields: InstanceFields,

        /// Fields to clear (repeatable)
        #[arg(long, value_enum)]
        clear: Vec<ClearField>,
    },

    /// Remove an instance
    Remove {
        /// Instance ID
        id: String,
    },

    /// Pin an instance to a position in the rule list
    Order {
        /// Instance ID
        id: String,

        /// Sort key; lower comes first
        order: i64,
    },

    /// Clear the explicit rule position of an instance
    Unorder {
        /// Instance ID
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct InstanceFields {
    /// Instance display name
    #[arg(long)]
    pub name: Option<String>,

    /// First process id ("0000" means unset)
    #[arg(long)]
    pub pid1: Option<String>,

    /// Second process id ("0000" means unset)
    #[arg(long)]
    pub pid2: Option<String>,

    /// Proxy label
    #[arg(long)]
    pub proxy_name: Option<String>,

    /// Proxy address
    #[arg(long)]
    pub proxy_ip: Option<String>,

    /// Proxy port
    #[arg(long)]
    pub proxy_port: Option<u16>,

    /// Proxy username
    #[arg(long)]
    pub proxy_login: Option<String>,

    /// Proxy password
    #[arg(long)]
    pub proxy_password: Option<String>,
}

/// Optional instance fields that `edit --clear` can unset
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClearField {
    Name,
    Pid1,
    Pid2,
    ProxyName,
    ProxyIp,
    ProxyPort,
    ProxyLogin,
    ProxyPassword,
}

/// Instance display wrapper for serialization
#[derive(Serialize)]
pub struct InstanceDisplay {
    pub id: String,
    pub number: i64,
    pub name: String,
    pub pids: String,
    pub proxy: String,
    pub address: String,
    pub ppx_id: String,
    pub order: String,
}

fn or_dash(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

impl From<&InstanceRecord> for InstanceDisplay {
    fn from(record: &InstanceRecord) -> Self {
        let address = match (record.proxy_ip.as_deref(), record.proxy_port) {
            (Some(ip), Some(port)) => format!("{}:{}", ip, port),
            (Some(ip), None) => ip.to_string(),
            _ => "-".to_string(),
        };

        Self {
            id: record.id.clone(),
            number: record.instance_number,
            name: or_dash(record.name.as_deref()),
            pids: format!(
                "{} / {}",
                or_dash(record.pid1.as_deref()),
                or_dash(record.pid2.as_deref())
            ),
            proxy: or_dash(record.proxy_name.as_deref()),
            address,
            ppx_id: record
                .ppx_proxy_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            order: record
                .ppx_rule_order
                .map(|o| o.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

impl TableDisplay for InstanceDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "#", "Name", "PIDs", "Proxy", "Address", "PPX ID", "Order"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.number.to_string(),
            self.name.clone(),
            self.pids.clone(),
            self.proxy.clone(),
            self.address.clone(),
            self.ppx_id.clone(),
            self.order.clone(),
        ]
    }
}

fn new_instance(number: i64, order: Option<i64>, fields: InstanceFields) -> NewInstance {
    NewInstance {
        instance_number: number,
        name: fields.name,
        pid1: fields.pid1,
        pid2: fields.pid2,
        proxy_name: fields.proxy_name,
        proxy_ip: fields.proxy_ip,
        proxy_port: fields.proxy_port,
        proxy_login: fields.proxy_login,
        proxy_password: fields.proxy_password,
        ppx_rule_order: order,
    }
}

fn patch(number: Option<i64>, fields: InstanceFields, clear: &[ClearField]) -> Result<InstancePatch> {
    let mut changes = InstancePatch {
        instance_number: number,
        name: fields.name.map(Some),
        pid1: fields.pid1.map(Some),
        pid2: fields.pid2.map(Some),
        proxy_name: fields.proxy_name.map(Some),
        proxy_ip: fields.proxy_ip.map(Some),
        proxy_port: fields.proxy_port.map(Some),
        proxy_login: fields.proxy_login.map(Some),
        proxy_password: fields.proxy_password.map(Some),
    };

    for field in clear {
        let already_set = match field {
            ClearField::Name => changes.name.replace(None).is_some(),
            ClearField::Pid1 => changes.pid1.replace(None).is_some(),
            ClearField::Pid2 => changes.pid2.replace(None).is_some(),
            ClearField::ProxyName => changes.proxy_name.replace(None).is_some(),
            ClearField::ProxyIp => changes.proxy_ip.replace(None).is_some(),
            ClearField::ProxyPort => changes.proxy_port.replace(None).is_some(),
            ClearField::ProxyLogin => changes.proxy_login.replace(None).is_some(),
            ClearField::ProxyPassword => changes.proxy_password.replace(None).is_some(),
        };
        if already_set {
            bail!("{:?} is both set and cleared", field);
        }
    }

    Ok(changes)
}

pub fn execute(cmd: InstanceCommands, ctx: &Context) -> Result<()> {
    let repo = ctx.repo()?;

    match cmd {
        InstanceCommands::List => {
            let displays: Vec<InstanceDisplay> =
                repo.list_instances()?.iter().map(InstanceDisplay::from).collect();
            print_list(&displays, ctx.format);
        }

        InstanceCommands::Get { id } => match repo.get_instance(&id)? {
            Some(record) => print_item(&InstanceDisplay::from(&record), ctx.format),
            None => bail!("Instance {} not found", id),
        },

        InstanceCommands::Add {
            number,
            order,
            fields,
        } => {
            let record = repo.create_instance(new_instance(number, order, fields))?;
            print_success(&format!("Instance #{} created", record.instance_number));
            print_item(&InstanceDisplay::from(&record), ctx.format);
        }

        InstanceCommands::Edit {
            id,
            number,
            fields,
            clear,
        } => {
            let changes = patch(number, fields, &clear)?;
            if changes.is_empty() {
                bail!("Nothing to change; pass at least one field");
            }
            let record = repo.update_instance(&id, &changes)?;
            print_success(&format!("Instance {} updated", id));
            print_item(&InstanceDisplay::from(&record), ctx.format);
        }

        InstanceCommands::Remove { id } => {
            if !repo.delete_instance(&id)? {
                bail!("Instance {} not found", id);
            }
            print_success(&format!("Instance {} removed", id));
        }

        InstanceCommands::Order { id, order } => {
            repo.set_rule_order(&id, Some(order))?;
            print_success(&format!("Instance {} pinned at rule order {}", id, order));
        }

        InstanceCommands::Unorder { id } => {
            repo.set_rule_order(&id, None)?;
            print_success(&format!("Instance {} rule order cleared", id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats_missing_fields() {
        let record = InstanceRecord {
            id: "abc".into(),
            instance_number: 3,
            name: None,
            pid1: Some("1234".into()),
            pid2: None,
            proxy_name: None,
            proxy_ip: Some("10.0.0.1".into()),
            proxy_port: Some(1080),
            proxy_login: None,
            proxy_password: None,
            ppx_proxy_id: Some(104),
            ppx_rule_order: None,
            created_at: 0,
            updated_at: 0,
        };

        let display = InstanceDisplay::from(&record);
        assert_eq!(display.name, "-");
        assert_eq!(display.pids, "1234 / -");
        assert_eq!(display.address, "10.0.0.1:1080");
        assert_eq!(display.ppx_id, "104");
        assert_eq!(display.order, "-");
        assert_eq!(display.row().len(), InstanceDisplay::headers().len());
    }

    #[test]
    fn test_empty_edit_is_detected() {
        assert!(patch(None, InstanceFields::default(), &[]).unwrap().is_empty());
        assert!(!patch(Some(2), InstanceFields::default(), &[]).unwrap().is_empty());
    }

    #[test]
    fn test_clear_fields() {
        let fields = InstanceFields {
            proxy_ip: Some("10.0.0.9".into()),
            ..Default::default()
        };
        let changes = patch(None, fields, &[ClearField::ProxyPort]).unwrap();
        assert_eq!(changes.proxy_port, Some(None));
        assert_eq!(changes.proxy_ip, Some(Some("10.0.0.9".to_string())));
        assert_eq!(changes.name, None);

        let fields = InstanceFields {
            proxy_port: Some(1080),
            ..Default::default()
        };
        assert!(patch(None, fields, &[ClearField::ProxyPort]).is_err());
    }
}
