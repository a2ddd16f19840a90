pub mod config;
pub mod format;
pub mod logging;
pub mod publish;
pub mod sampler;
pub mod system;
