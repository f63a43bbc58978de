pub mod config;

// Re-export commonly used items for convenience
pub use config::Config;
