use serde_json::Value;
use site_quota_engine::TenantQuotaRecord;

use super::OutputError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaColumn {
    BlogId,
    Url,
    Quota,
    QuotaUsed,
    QuotaUsedPercent,
}

pub const DEFAULT_COLUMNS: [QuotaColumn; 5] = [
    QuotaColumn::BlogId,
    QuotaColumn::Url,
    QuotaColumn::Quota,
    QuotaColumn::QuotaUsed,
    QuotaColumn::QuotaUsedPercent,
];

impl QuotaColumn {
    pub fn name(self) -> &'static str {
        match self {
            QuotaColumn::BlogId => "blog_id",
            QuotaColumn::Url => "url",
            QuotaColumn::Quota => "quota",
            QuotaColumn::QuotaUsed => "quota_used",
            QuotaColumn::QuotaUsedPercent => "quota_used_percent",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DEFAULT_COLUMNS
            .into_iter()
            .find(|column| column.name() == name)
    }

    pub fn json_value(self, record: &TenantQuotaRecord) -> Value {
        match self {
            QuotaColumn::BlogId => Value::from(record.tenant_id),
            QuotaColumn::Url => Value::from(record.url.clone()),
            QuotaColumn::Quota => Value::from(record.allocation_mb),
            QuotaColumn::QuotaUsed => Value::from(record.used_mb),
            QuotaColumn::QuotaUsedPercent => Value::from(record.used_percent),
        }
    }

    pub fn display(self, record: &TenantQuotaRecord) -> String {
        match self {
            QuotaColumn::BlogId => record.tenant_id.to_string(),
            QuotaColumn::Url => record.url.clone(),
            QuotaColumn::Quota => record.allocation_mb.to_string(),
            QuotaColumn::QuotaUsed => record.used_mb.to_string(),
            QuotaColumn::QuotaUsedPercent => record.used_percent.to_string(),
        }
    }
}

/// Parses a comma separated field list such as `blog_id,quota`.
pub fn parse_fields(list: &str) -> Result<Vec<QuotaColumn>, OutputError> {
    let columns = list
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            QuotaColumn::from_name(name).ok_or_else(|| OutputError::UnknownField(name.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(OutputError::UnknownField(list.to_string()));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fields_keeps_requested_order() {
        let columns = parse_fields("quota, blog_id").unwrap();
        assert_eq!(columns, vec![QuotaColumn::Quota, QuotaColumn::BlogId]);
    }

    #[test]
    fn parse_fields_rejects_unknown_names() {
        assert!(matches!(
            parse_fields("blog_id,size"),
            Err(OutputError::UnknownField(name)) if name == "size"
        ));
        assert!(parse_fields(" , ").is_err());
    }

    #[test]
    fn display_prints_whole_floats_without_fraction() {
        let record = TenantQuotaRecord::from_raw(4, "http://net.test/", 10_000, 9_850.0);
        assert_eq!(QuotaColumn::QuotaUsed.display(&record), "9850");
        assert_eq!(QuotaColumn::QuotaUsedPercent.display(&record), "98.5");
    }
}
