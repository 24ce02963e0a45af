pub mod artifact_store;
pub mod js_executor;
pub mod pacer;

pub use artifact_store::{ensure_output_dir, ArtifactStore};
pub use js_executor::JsExecutor;
pub use pacer::{JitterPacer, NoopPacer, Pacer};
