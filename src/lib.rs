//! # plugin-sorter
//!
//! Inspects Bukkit/Spigot plugin jars and keeps them in a versioned repository.
//!
//! ## Architecture
//!
//! - **archive**: Memory-mapped, read-only zip access
//! - **manifest**: `plugin.yml` decoding into a typed name/version pair
//! - **nms**: Streaming scan of class files for server-internals version markers
//! - **record**: A jar's manifest plus its lazily scanned version markers
//! - **paths**: Root-confined path joining
//! - **placer**: Hash-aware placement into `plugins/<Name>/<version>/<name>.jar`
//! - **prompt**: Interactive overwrite confirmation
//! - **sort**: Sequential sort of the staging folder
//! - **scan**: Jar discovery
//! - **report**: Parallel per-jar version report
//! - **config**: Root, staging, repository and worker settings from CLI and env
//! - **cli**: Command-line arguments (`sort`, `report`)
//! - **logging**: tracing subscriber setup
//! - **error**: Typed failure kinds shared by every module

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod nms;
pub mod paths;
pub mod placer;
pub mod prompt;
pub mod record;
pub mod report;
pub mod scan;
pub mod sort;
