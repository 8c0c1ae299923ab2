mod settings;

pub use settings::{Config, ConfigError, FigureConfig, EXAMPLE_CONFIG};
