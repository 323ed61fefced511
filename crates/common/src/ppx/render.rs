//! Proxifier profile rendering

use crate::ppx::template::fill_slots;
use crate::types::InstanceRecord;
use crate::Result;
use serde::Serialize;
use std::borrow::Cow;
use tracing::{info, warn};

const PROFILE_TEMPLATE: &str = include_str!("profile_template.xml");
const STATIC_RULES: &str = include_str!("static_rules.xml");

const PROXY_TYPE: &str = "SOCKS5";
const PROXY_OPTIONS: u32 = 48;

/// Profile section a record can be emitted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Proxy,
    Rule,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Proxy => write!(f, "proxy"),
            Section::Rule => write!(f, "rule"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum SkipReason {
    MissingProxyField(&'static str),
    MissingPids,
    MissingPpxId,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingProxyField(field) => write!(f, "missing {}", field),
            SkipReason::MissingPids => write!(f, "pid1/pid2 not bound"),
            SkipReason::MissingPpxId => write!(f, "no ppx id allocated"),
        }
    }
}

/// A record left out of one profile section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub instance_id: String,
    pub instance_number: i64,
    pub section: Section,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub instances: usize,
    pub proxies: usize,
    pub rules: usize,
    pub skipped: Vec<SkippedRecord>,
}

#[derive(Debug, Clone)]
pub struct RenderedProfile {
    pub xml: String,
    pub summary: ProfileSummary,
}

/// Escape `&`, `<`, `>` and `"` for element text and attribute values.
pub fn xml_escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(value);
    }

    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Render the full profile for records already in canonical order.
///
/// Incomplete records are left out of the affected section only; they never
/// fail the render.
pub fn render_profile(records: &[InstanceRecord]) -> Result<RenderedProfile> {
    let mut proxies = String::new();
    let mut rules = String::new();
    let mut summary = ProfileSummary {
        instances: records.len(),
        ..Default::default()
    };

    for record in records {
        match proxy_fragment(record) {
            Ok(fragment) => {
                proxies.push_str(&fragment);
                summary.proxies += 1;
            }
            Err(reason) => summary.skipped.push(skip(record, Section::Proxy, reason)),
        }

        match rule_fragment(record) {
            Ok(fragment) => {
                rules.push_str(&fragment);
                summary.rules += 1;
            }
            Err(reason) => summary.skipped.push(skip(record, Section::Rule, reason)),
        }
    }

    let xml = fill_slots(
        PROFILE_TEMPLATE,
        &[
            ("proxies", proxies.as_str()),
            ("rules", rules.as_str()),
            ("static_rules", STATIC_RULES),
        ],
    )?;

    info!(
        instances = summary.instances,
        proxies = summary.proxies,
        rules = summary.rules,
        skipped = summary.skipped.len(),
        "rendered ppx profile"
    );

    Ok(RenderedProfile { xml, summary })
}

fn skip(record: &InstanceRecord, section: Section, reason: SkipReason) -> SkippedRecord {
    warn!(
        instance_id = %record.id,
        instance_number = record.instance_number,
        %section,
        %reason,
        "instance left out of profile section"
    );
    SkippedRecord {
        instance_id: record.id.clone(),
        instance_number: record.instance_number,
        section,
        reason,
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> std::result::Result<&'a str, SkipReason> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(SkipReason::MissingProxyField(field)),
    }
}

fn proxy_fragment(record: &InstanceRecord) -> std::result::Result<String, SkipReason> {
    let address = required(record.proxy_ip.as_deref(), "proxy_ip")?;
    let port = record
        .proxy_port
        .ok_or(SkipReason::MissingProxyField("proxy_port"))?;
    let username = required(record.proxy_login.as_deref(), "proxy_login")?;
    let password = required(record.proxy_password.as_deref(), "proxy_password")?;
    let label = required(record.proxy_name.as_deref(), "proxy_name")?;
    let id = record.ppx_proxy_id.ok_or(SkipReason::MissingPpxId)?;

    Ok(format!(
        r#"    <Proxy id="{id}" type="{kind}">
      <Authentication enabled="true">
        <Password>{password}</Password>
        <Username>{username}</Username>
      </Authentication>
      <Options>{options}</Options>
      <Port>{port}</Port>
      <Address>{address}</Address>
      <Label>{label}</Label>
    </Proxy>
"#,
        id = id,
        kind = PROXY_TYPE,
        password = xml_escape(password),
        username = xml_escape(username),
        options = PROXY_OPTIONS,
        port = port,
        address = xml_escape(address),
        label = xml_escape(label),
    ))
}

fn rule_fragment(record: &InstanceRecord) -> std::result::Result<String, SkipReason> {
    let (pid1, pid2) = record.pids().ok_or(SkipReason::MissingPids)?;
    let id = record.ppx_proxy_id.ok_or(SkipReason::MissingPpxId)?;

    Ok(format!(
        r#"    <Rule enabled="true">
      <Action type="Proxy">{id}</Action>
      <Applications>pid={pid1};pid={pid2}</Applications>
      <Name>{name}</Name>
    </Rule>
"#,
        id = id,
        pid1 = xml_escape(pid1),
        pid2 = xml_escape(pid2),
        name = xml_escape(&record.rule_name()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::complete;

    fn allocated(id: &str, number: i64, ppx_id: i64) -> InstanceRecord {
        let mut record = complete(id, number);
        record.ppx_proxy_id = Some(ppx_id);
        record
    }

    fn rule_names(xml: &str) -> Vec<String> {
        xml.split("<Name>")
            .skip(1)
            .filter_map(|s| s.split("</Name>").next())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_escape() {
        assert_eq!(xml_escape("plain"), "plain");
        assert!(matches!(xml_escape("plain"), Cow::Borrowed(_)));
        assert_eq!(
            xml_escape(r#"O'Brien & Co <VPN> "x""#),
            "O'Brien &amp; Co &lt;VPN&gt; &quot;x&quot;"
        );
    }

    #[test]
    fn test_proxy_fragment_layout() {
        let fragment = proxy_fragment(&allocated("a", 4, 100)).unwrap();
        assert_eq!(
            fragment,
            "    <Proxy id=\"100\" type=\"SOCKS5\">\n\
             \x20     <Authentication enabled=\"true\">\n\
             \x20       <Password>secret</Password>\n\
             \x20       <Username>user</Username>\n\
             \x20     </Authentication>\n\
             \x20     <Options>48</Options>\n\
             \x20     <Port>1080</Port>\n\
             \x20     <Address>10.0.0.4</Address>\n\
             \x20     <Label>proxy-4</Label>\n\
             \x20   </Proxy>\n"
        );
    }

    #[test]
    fn test_rule_fragment_layout() {
        let fragment = rule_fragment(&allocated("a", 4, 100)).unwrap();
        assert!(fragment.contains("<Action type=\"Proxy\">100</Action>"));
        assert!(fragment.contains("<Applications>pid=41;pid=42</Applications>"));
        assert!(fragment.contains("<Name>proxy-4</Name>"));
    }

    #[test]
    fn test_label_is_escaped() {
        let mut record = allocated("a", 1, 100);
        record.proxy_name = Some("O'Brien & Co <VPN>".to_string());

        let profile = render_profile(&[record]).unwrap();
        assert!(profile.xml.contains("<Label>O'Brien &amp; Co &lt;VPN&gt;</Label>"));
        assert!(profile.xml.contains("<Name>O'Brien &amp; Co &lt;VPN&gt;</Name>"));
        assert!(!profile.xml.contains("<VPN>"));
    }

    #[test]
    fn test_missing_ip_still_emits_rule() {
        let mut record = allocated("a", 1, 100);
        record.proxy_ip = None;

        let profile = render_profile(&[record]).unwrap();
        assert!(!profile.xml.contains("<Proxy id="));
        assert!(profile.xml.contains("<Action type=\"Proxy\">100</Action>"));
        assert_eq!(profile.summary.proxies, 0);
        assert_eq!(profile.summary.rules, 1);
        assert_eq!(
            profile.summary.skipped,
            vec![SkippedRecord {
                instance_id: "a".into(),
                instance_number: 1,
                section: Section::Proxy,
                reason: SkipReason::MissingProxyField("proxy_ip"),
            }]
        );
    }

    #[test]
    fn test_missing_pid_drops_rule_only() {
        let mut record = allocated("a", 1, 100);
        record.pid1 = None;
        let mut sentinel = allocated("b", 2, 101);
        sentinel.pid2 = Some("0000".into());

        let profile = render_profile(&[record, sentinel]).unwrap();
        assert_eq!(profile.summary.proxies, 2);
        assert_eq!(profile.summary.rules, 0);
        assert!(!profile.xml.contains("<Action type=\"Proxy\">"));
        assert_eq!(rule_names(&profile.xml), vec!["Localhost", "Default"]);
    }

    #[test]
    fn test_blank_fields_count_as_missing() {
        let mut record = allocated("a", 1, 100);
        record.proxy_password = Some(String::new());

        let profile = render_profile(&[record]).unwrap();
        assert_eq!(profile.summary.proxies, 0);
        assert_eq!(
            profile.summary.skipped[0].reason,
            SkipReason::MissingProxyField("proxy_password")
        );
    }

    #[test]
    fn test_required_field_checks() {
        assert_eq!(required(Some("10.0.0.1"), "proxy_ip"), Ok("10.0.0.1"));
        assert_eq!(required(Some(" user "), "proxy_login"), Ok(" user "));
        assert_eq!(
            required(Some("   "), "proxy_login"),
            Err(SkipReason::MissingProxyField("proxy_login"))
        );
        assert_eq!(
            required(None, "proxy_name"),
            Err(SkipReason::MissingProxyField("proxy_name"))
        );
    }

    #[test]
    fn test_unallocated_record_is_skipped_everywhere() {
        let profile = render_profile(&[complete("a", 1)]).unwrap();
        assert_eq!(profile.summary.proxies, 0);
        assert_eq!(profile.summary.rules, 0);
        assert!(profile
            .summary
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::MissingPpxId));
    }

    #[test]
    fn test_static_rules_always_last() {
        let empty = render_profile(&[]).unwrap();
        assert_eq!(rule_names(&empty.xml), vec!["Localhost", "Default"]);
        assert!(empty.xml.contains("<ProxyList>\n  </ProxyList>"));

        let records = vec![allocated("a", 1, 100), allocated("b", 2, 101)];
        let full = render_profile(&records).unwrap();
        assert_eq!(
            rule_names(&full.xml),
            vec!["proxy-1", "proxy-2", "Localhost", "Default"]
        );
        assert_eq!(full.xml.matches("<Action type=\"Direct\" />").count(), 2);
    }

    #[test]
    fn test_document_shape() {
        let profile = render_profile(&[allocated("a", 1, 100)]).unwrap();
        let xml = &profile.xml;

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n"));
        assert!(xml.contains("<ProxifierProfile version=\"102\" platform=\"Windows\""));
        assert!(xml.contains("<ChainList />"));
        assert!(xml.ends_with("</ProxifierProfile>\n"));

        let proxy_list = xml.find("<ProxyList>").unwrap();
        let chain_list = xml.find("<ChainList />").unwrap();
        let rule_list = xml.find("<RuleList>").unwrap();
        assert!(proxy_list < chain_list && chain_list < rule_list);
        assert!(!xml.contains("{{"));
    }

    #[test]
    fn test_emission_follows_input_order() {
        let records = vec![allocated("z", 9, 300), allocated("a", 1, 100)];
        let profile = render_profile(&records).unwrap();

        let first = profile.xml.find("<Proxy id=\"300\"").unwrap();
        let second = profile.xml.find("<Proxy id=\"100\"").unwrap();
        assert!(first < second);
    }
}
