use core::fmt;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use energy_model::day::{end_of_day, format_day, previous_day};
use energy_model::{DailyConsumption, ModelError, total_power_consumption};
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::cache::{BlockSizeCache, CacheError, CacheLookup};
use crate::net::{BlockSource, FetchError};
use crate::store::SizeStore;

/// Errors that abort a daily consumption computation.
#[derive(Debug)]
pub enum AggregateError {
    /// The requested number of days was negative. Raised before any I/O.
    Validation { number_of_days: i64 },
    /// The block listing for `date` could not be fetched.
    Listing { date: String, source: FetchError },
    /// A block listed for `date` could not be resolved.
    Block { date: String, source: CacheError },
    Time(ModelError),
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateError::Validation { number_of_days } => write!(
                f,
                "the number of days has to be equal or greater than 0, got {number_of_days}"
            ),
            AggregateError::Listing { date, source } => {
                write!(f, "failed to list blocks for {date}: {source}")
            }
            AggregateError::Block { date, source } => write!(f, "{date}: {source}"),
            AggregateError::Time(e) => write!(f, "date error: {e}"),
        }
    }
}

impl std::error::Error for AggregateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AggregateError::Validation { .. } => None,
            AggregateError::Listing { source, .. } => Some(source),
            AggregateError::Block { source, .. } => Some(source),
            AggregateError::Time(e) => Some(e),
        }
    }
}

impl From<ModelError> for AggregateError {
    fn from(e: ModelError) -> Self {
        AggregateError::Time(e)
    }
}

/// Walks backwards from today one calendar day at a time and estimates the
/// energy spent on each day's blocks.
pub struct DailyConsumptionAggregator<B, S> {
    source: Arc<B>,
    cache: Arc<BlockSizeCache<S>>,
}

impl<B, S> Clone for DailyConsumptionAggregator<B, S> {
    fn clone(&self) -> Self {
        DailyConsumptionAggregator {
            source: Arc::clone(&self.source),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<B: BlockSource, S: SizeStore> DailyConsumptionAggregator<B, S> {
    pub fn new(source: Arc<B>, cache: Arc<BlockSizeCache<S>>) -> Self {
        DailyConsumptionAggregator { source, cache }
    }

    /// Returns `number_of_days + 1` records, today first, in the local time zone.
    pub async fn compute_daily_consumption(
        &self,
        number_of_days: i64,
    ) -> Result<Vec<DailyConsumption>, AggregateError> {
        self.compute_daily_consumption_from(number_of_days, Local::now())
            .await
    }

    /// Same as `compute_daily_consumption`, starting from the day of `now`.
    ///
    /// Every window ends at 23:59:59.999 of its day, including the first one,
    /// so day 0 covers the whole current day rather than the 24 hours before
    /// `now`. Days are processed strictly one after another; the blocks of a
    /// day are resolved concurrently and the first failure aborts the call.
    pub async fn compute_daily_consumption_from<Tz: TimeZone>(
        &self,
        number_of_days: i64,
        now: DateTime<Tz>,
    ) -> Result<Vec<DailyConsumption>, AggregateError> {
        if number_of_days < 0 {
            return Err(AggregateError::Validation { number_of_days });
        }

        let mut records = Vec::new();
        let mut reference_time = now;

        for day in 0..=number_of_days {
            reference_time = end_of_day(&reference_time)?;
            let date = format_day(&reference_time);
            let upper_bound = reference_time.timestamp_millis();

            debug!(day, %date, upper_bound, "listing blocks");
            let summaries = self
                .source
                .list_blocks_up_to(upper_bound)
                .await
                .map_err(|source| AggregateError::Listing {
                    date: date.clone(),
                    source,
                })?;

            let source = self.source.as_ref();
            let resolutions = summaries.iter().map(|summary| {
                self.cache.resolve(&summary.hash, move |hash| async move {
                    source.fetch_block_size(&hash).await
                })
            });
            let resolved = try_join_all(resolutions)
                .await
                .map_err(|source| AggregateError::Block {
                    date: date.clone(),
                    source,
                })?;

            let cached = resolved
                .iter()
                .filter(|(_, lookup)| *lookup == CacheLookup::Hit)
                .count();
            let consumption = total_power_consumption(resolved.iter().map(|(r, _)| r.size));
            info!(%date, blocks = resolved.len(), cached, consumption, "day estimated");

            records.push(DailyConsumption { date, consumption });

            reference_time = previous_day(&reference_time)?;
        }

        Ok(records)
    }
}
