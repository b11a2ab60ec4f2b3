pub mod engine;
pub mod pagination;
pub mod resolver;
pub mod scanner;

#[cfg(test)]
mod testing;

pub use engine::{swap_query, SummaryEngine, SummaryReport};
pub use pagination::PaginatedQueryWalker;
pub use resolver::BlockHeightResolver;
pub use scanner::{BlockScanner, ScanStats};
