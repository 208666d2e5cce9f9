//! Statistics over a fetched series: descriptive summaries, moving averages,
//! the column correlation matrix and a seasonal decomposition of closes.

pub mod correlation;
pub mod decompose;
pub mod describe;
pub mod rolling;

pub use correlation::*;
pub use decompose::*;
pub use describe::*;
pub use rolling::*;
