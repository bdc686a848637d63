pub mod config;
pub mod limits;
pub mod orchestrator;
pub mod paginate;
pub mod result;
pub mod state;
pub mod step;

pub use config::{
    CaptureClip, CaptureStep, ConfigError, ContainsSelector, ElementAction, ElementStep,
    FlowConfig, Step, TableStep, TakeParse, TakeStep, WaitForStep,
};
pub use orchestrator::{Directories, EngineContext};
pub use result::{
    ResultContent, ResultPage, ResultTable, ResultTableData, ResultTableHead, ResultUsage,
    RunResult,
};
pub use state::{LoopIndices, RunState};
