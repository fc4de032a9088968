/// Settings file looked up when `--settings` is not given.
pub const DEFAULT_SETTINGS_PATH: &str = "fortiflat.yaml";

/// Default bound of the pipeline worker's command and event channels,
/// overridable via `pipeline.channel_capacity` in the settings file.
pub const PIPELINE_CHANNEL_CAPACITY: usize = 16;
