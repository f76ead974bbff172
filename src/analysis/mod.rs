pub mod engine;
pub mod pipeline;
pub mod scan;

pub use engine::{ANALYSIS_DELAY, AnalysisEngine, AnalysisEvent, AnalysisOracle, CoinFlipOracle};
pub use pipeline::{AnalysisPhase, AnalysisRequest, ScanPipeline};
pub use scan::{ScanFile, UploadError};
