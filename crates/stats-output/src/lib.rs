//! Report files. Nothing appears at the target path until a report is
//! complete; an abandoned writer removes its temporary file.

pub mod atomic;
pub mod csv_table;
pub mod jsonl;

pub use atomic::AtomicFile;
pub use csv_table::{write_pool_summaries, SUMMARY_HEADER};
pub use jsonl::JsonlWriter;
