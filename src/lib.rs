pub mod cli;
pub mod config;
pub mod constants;
pub mod endpoint;
pub mod error;
pub mod formats;
pub mod job;
pub mod orchestrator;
pub mod processing;
pub mod progress;
pub mod render;
pub mod server;
pub mod state;
pub mod transport;
pub mod upload;
pub mod utils;

pub use config::ServerConfig;
pub use endpoint::{compress, ApiError, EndpointState, ErrorBody};
pub use error::{CompressionError, Result};
pub use formats::TargetFormat;
pub use job::{FileJob, JobStatus, ResultHandle};
pub use orchestrator::{BatchSummary, Orchestrator};
pub use processing::{decode_image, EncodeLevel, EncodeSpec, ImageEncoder, RasterEncoder};
pub use progress::{start_fake_progress, ProgressSettings, ProgressTicker};
pub use server::{build_router, run_server, serve_with_shutdown};
pub use state::{BatchObserver, BatchState};
pub use transport::{CompressionTransport, HttpTransport};
pub use upload::{collect_upload_files, declared_content_type, read_upload_files, UploadFile};
