//! CLI command implementations.

pub mod build;
pub mod dev;
pub mod init;

pub use build::build_site;
pub use dev::{dev_server, DevOptions};
pub use init::init_project;
