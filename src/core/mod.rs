pub mod browser;
pub mod exporter;
pub mod loader;
pub mod output;
pub mod renderer;
pub mod result;
pub mod session;
pub mod template;
