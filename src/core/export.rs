//! CSV and JSON export of cached resources.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use crate::core::domain::{CachedResource, CredentialConnection, Provider};
use crate::error::Result;

/// CSV header row.
pub const CSV_HEADER: [&str; 7] = [
    "Resource Type",
    "Resource ID",
    "Name",
    "Region",
    "Connection",
    "Provider",
    "Discovered At",
];

/// A resource with the connection it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ExportRow<'a> {
    pub resource: &'a CachedResource,
    pub connection: &'a CredentialConnection,
}

#[derive(Serialize)]
struct Record<'a> {
    resource_type: &'a str,
    resource_id: &'a str,
    resource_name: Option<&'a str>,
    region: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<Provider>,
    discovered_at: String,
    raw_data: &'a Value,
}

impl<'a> Record<'a> {
    fn bare(resource: &'a CachedResource) -> Self {
        Self {
            resource_type: &resource.resource_type,
            resource_id: &resource.resource_id,
            resource_name: resource.resource_name.as_deref(),
            region: resource.region.as_deref(),
            connection: None,
            provider: None,
            discovered_at: resource.discovered_at.to_rfc3339(),
            raw_data: &resource.raw_data,
        }
    }

    fn row(row: &ExportRow<'a>) -> Self {
        Self {
            connection: Some(&row.connection.name),
            provider: Some(row.connection.provider),
            ..Self::bare(row.resource)
        }
    }
}

/// Render rows as RFC 4180 CSV with a header line.
pub fn to_csv(rows: &[ExportRow<'_>]) -> String {
    let mut out = String::new();
    push_line(&mut out, CSV_HEADER.iter().copied());
    for row in rows {
        let r = row.resource;
        let discovered = r.discovered_at.to_rfc3339();
        push_line(
            &mut out,
            [
                r.resource_type.as_str(),
                r.resource_id.as_str(),
                r.resource_name.as_deref().unwrap_or(""),
                r.region.as_deref().unwrap_or(""),
                row.connection.name.as_str(),
                row.connection.provider.as_str(),
                discovered.as_str(),
            ],
        );
    }
    out
}

/// Render rows as a pretty JSON array including raw payloads.
pub fn to_json(rows: &[ExportRow<'_>]) -> Result<String> {
    let records: Vec<_> = rows.iter().map(Record::row).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Render one resource as a pretty JSON object.
pub fn resource_json(resource: &CachedResource) -> Result<String> {
    Ok(serde_json::to_string_pretty(&Record::bare(resource))?)
}

fn push_line<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push_str("\r\n");
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
