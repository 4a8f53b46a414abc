//! Output files written by the pipeline.
//!
//! # Submodules
//!
//! - [`corpus_file`]: one flat text file per collected window, one article per line
//! - [`json`]: the drift series as JSON, ready for charting
//!
//! # Output Structure
//!
//! ```text
//! articles/
//! ├── africa 2022-01-01 2022-01-21.txt
//! └── africa 2022-01-22 2022-02-11.txt
//!
//! drift.json
//! ```

pub mod corpus_file;
pub mod json;
