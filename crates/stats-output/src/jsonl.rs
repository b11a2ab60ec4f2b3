use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stats_core::events::{BlockSwaps, SwapFill, SwapTransacted};
use stats_core::types::Coin;
use stats_core::{Result, StatsError};
use tracing::info;

use crate::atomic::AtomicFile;

#[derive(Serialize)]
struct BlockRecord<'a> {
    height: u64,
    events: Vec<SwapRecord<'a>>,
}

/// A failed swap serializes only its offer side
#[derive(Serialize)]
struct SwapRecord<'a> {
    pool_id: u64,
    success: bool,
    swap_requester: &'a str,
    offer_coin: &'a Coin,
    #[serde(flatten)]
    fill: Option<&'a SwapFill>,
}

impl<'a> From<&'a SwapTransacted> for SwapRecord<'a> {
    fn from(swap: &'a SwapTransacted) -> Self {
        Self {
            pool_id: swap.pool_id,
            success: swap.is_success(),
            swap_requester: &swap.swap_requester,
            offer_coin: &swap.offer_coin,
            fill: swap.fill.as_ref(),
        }
    }
}

/// Line-delimited JSON dump, one line per height
pub struct JsonlWriter {
    file: AtomicFile,
    lines: u64,
}

impl JsonlWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            file: AtomicFile::create(path)?,
            lines: 0,
        })
    }

    pub fn write_block(&mut self, block: &BlockSwaps) -> Result<()> {
        let record = BlockRecord {
            height: block.height,
            events: block.events.iter().map(SwapRecord::from).collect(),
        };
        serde_json::to_writer(self.file.writer(), &record)
            .map_err(|e| StatsError::Output(format!("json: {e}")))?;
        self.file.writer().write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<PathBuf> {
        let lines = self.lines;
        let path = self.file.commit()?;
        info!(path = %path.display(), heights = lines, "Wrote swap event dump");
        Ok(path)
    }
}
