use std::iter::FusedIterator;

use serde::Serialize;
use tracing::trace;

use crate::record::TenantQuotaRecord;
use crate::{QuotaEngineError, Result};

/// Usage thresholds for listing. Unset thresholds do not participate.
///
/// Built through [`ThresholdFilter::new`], which rejects non-finite and
/// out-of-range values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ThresholdFilter {
    min_used_mb: Option<f64>,
    min_used_percent: Option<f64>,
}

impl ThresholdFilter {
    pub fn new(min_used_mb: Option<f64>, min_used_percent: Option<f64>) -> Result<Self> {
        if let Some(mb) = min_used_mb {
            if !mb.is_finite() || mb < 0.0 {
                return Err(QuotaEngineError::InvalidThreshold(format!(
                    "min_used_mb must be a non-negative number, got {mb}"
                )));
            }
        }
        if let Some(percent) = min_used_percent {
            if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                return Err(QuotaEngineError::InvalidThreshold(format!(
                    "min_used_percent must be between 0 and 100, got {percent}"
                )));
            }
        }

        Ok(Self {
            min_used_mb,
            min_used_percent,
        })
    }

    pub fn min_used_mb(&self) -> Option<f64> {
        self.min_used_mb
    }

    pub fn min_used_percent(&self) -> Option<f64> {
        self.min_used_percent
    }

    pub fn is_unbounded(&self) -> bool {
        self.min_used_mb.is_none() && self.min_used_percent.is_none()
    }
}

/// Selects records that clear at least one configured threshold.
///
/// Configuring both thresholds widens the accepted set: a record passes when
/// its usage in megabytes reaches `min_used_mb` or its usage percentage
/// reaches `min_used_percent`. With no thresholds every record passes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageFilter {
    config: ThresholdFilter,
}

impl UsageFilter {
    pub fn new(config: ThresholdFilter) -> Self {
        Self { config }
    }

    pub fn accepts(&self, record: &TenantQuotaRecord) -> bool {
        if self.config.is_unbounded() {
            return true;
        }

        let by_size = self
            .config
            .min_used_mb
            .is_some_and(|min| record.used_mb >= min);
        let by_percent = self
            .config
            .min_used_percent
            .is_some_and(|min| record.used_percent >= min);

        let accepted = by_size || by_percent;
        if !accepted {
            trace!(
                tenant_id = record.tenant_id,
                used_mb = record.used_mb,
                used_percent = record.used_percent,
                "record below usage thresholds"
            );
        }
        accepted
    }

    /// Wraps `source` in a lazy, order-preserving filtering adapter.
    pub fn apply<I>(self, source: I) -> FilteredRecords<I::IntoIter>
    where
        I: IntoIterator<Item = TenantQuotaRecord>,
    {
        FilteredRecords {
            inner: source.into_iter(),
            filter: self,
        }
    }

    /// Like [`UsageFilter::apply`] for sources whose items may have failed.
    ///
    /// Errors are never filtered out and keep their position in the stream.
    pub fn apply_fallible<I, E>(self, source: I) -> FilteredResults<I::IntoIter>
    where
        I: IntoIterator<Item = std::result::Result<TenantQuotaRecord, E>>,
    {
        FilteredResults {
            inner: source.into_iter(),
            filter: self,
        }
    }
}

/// Iterator returned by [`UsageFilter::apply`] and [`filter`].
#[derive(Debug, Clone)]
pub struct FilteredRecords<I> {
    inner: I,
    filter: UsageFilter,
}

impl<I> Iterator for FilteredRecords<I>
where
    I: Iterator<Item = TenantQuotaRecord>,
{
    type Item = TenantQuotaRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.inner.find(|record| filter.accepts(record))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.inner.size_hint();
        if self.filter.config.is_unbounded() {
            self.inner.size_hint()
        } else {
            (0, upper)
        }
    }
}

impl<I> FusedIterator for FilteredRecords<I> where I: FusedIterator<Item = TenantQuotaRecord> {}

/// Iterator returned by [`UsageFilter::apply_fallible`].
#[derive(Debug, Clone)]
pub struct FilteredResults<I> {
    inner: I,
    filter: UsageFilter,
}

impl<I, E> Iterator for FilteredResults<I>
where
    I: Iterator<Item = std::result::Result<TenantQuotaRecord, E>>,
{
    type Item = std::result::Result<TenantQuotaRecord, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = &self.filter;
        self.inner.find(|item| match item {
            Ok(record) => filter.accepts(record),
            Err(_) => true,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (_, upper) = self.inner.size_hint();
        if self.filter.config.is_unbounded() {
            self.inner.size_hint()
        } else {
            (0, upper)
        }
    }
}

impl<I, E> FusedIterator for FilteredResults<I> where
    I: FusedIterator<Item = std::result::Result<TenantQuotaRecord, E>>
{
}

pub fn filter<I>(source: I, config: ThresholdFilter) -> FilteredRecords<I::IntoIter>
where
    I: IntoIterator<Item = TenantQuotaRecord>,
{
    UsageFilter::new(config).apply(source)
}
