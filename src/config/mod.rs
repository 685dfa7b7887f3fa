mod settings;

pub use settings::{EngineConfig, RenderConfig, Settings, SetupConfig, SourceConfig, SourceMode};
