use std::path::{Path, PathBuf};

use stats_core::types::PoolSummary;
use stats_core::{Result, StatsError};
use tracing::info;

use crate::atomic::AtomicFile;

pub const SUMMARY_HEADER: [&str; 13] = [
    "id",
    "x_denom",
    "y_denom",
    "x",
    "y",
    "offer_x",
    "offer_x_fee",
    "demand_y",
    "demand_y_fee",
    "offer_y",
    "offer_y_fee",
    "demand_x",
    "demand_x_fee",
];

/// One table row: reserves, then side 0 (offers x) and side 1 (offers y)
fn summary_record(pool: &PoolSummary) -> [String; 13] {
    let [x, y] = &pool.reserve_coins;
    let [side_x, side_y] = &pool.swaps;
    [
        pool.id.to_string(),
        x.denom.clone(),
        y.denom.clone(),
        x.amount.to_string(),
        y.amount.to_string(),
        side_x.offer_coin.amount.to_string(),
        side_x.offer_coin_fee.amount.to_string(),
        side_x.demand_coin.amount.to_string(),
        side_x.demand_coin_fee.amount.to_string(),
        side_y.offer_coin.amount.to_string(),
        side_y.offer_coin_fee.amount.to_string(),
        side_y.demand_coin.amount.to_string(),
        side_y.demand_coin_fee.amount.to_string(),
    ]
}

/// Write the pool table to `path`, rows in the given order
pub fn write_pool_summaries<'a, I>(path: impl AsRef<Path>, rows: I) -> Result<PathBuf>
where
    I: IntoIterator<Item = &'a PoolSummary>,
{
    let mut file = AtomicFile::create(path)?;
    let mut count = 0usize;
    {
        let mut writer = csv::Writer::from_writer(file.writer());
        writer.write_record(SUMMARY_HEADER).map_err(csv_error)?;
        for pool in rows {
            writer.write_record(summary_record(pool)).map_err(csv_error)?;
            count += 1;
        }
        writer.flush()?;
    }
    let path = file.commit()?;
    info!(path = %path.display(), pools = count, "Wrote pool summary table");
    Ok(path)
}

fn csv_error(e: csv::Error) -> StatsError {
    StatsError::Output(format!("csv: {e}"))
}
