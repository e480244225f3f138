pub mod api;
pub mod input_file;
pub mod job;

pub use api::{HealthResponse, StatusResponse, TaskState, UploadResponse};
pub use input_file::InputFile;
pub use job::{FailureKind, Job, JobFailure, JobState, JobStatus};
