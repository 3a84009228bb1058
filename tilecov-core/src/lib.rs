#![deny(missing_docs)]
//! Tileset coverage core library.
//!
//! This crate decodes game object and tileset data and classifies how well a
//! tileset covers the game's objects with sprites.

pub mod config;
pub mod coverage;
pub mod decode;
pub mod error;
pub mod filter;
pub mod fs;
pub mod record;
pub mod report;
pub mod store;
pub mod tileset;
pub mod tree;

pub use config::{CONFIG_FILENAME, TilecovConfig, parse_properties};
pub use coverage::{
    CoverageStats, CoverageType, FileCoverage, LooksLikeIndex, TilesetCoverage,
    TilesetCoverageBuilder, classify_file, resolve_looks_like,
};
pub use decode::{FieldTable, NestedValue, Record, RecordDecoder, normalize_list};
pub use error::{Result, TilecovError};
pub use filter::{Filter, Identifiable, OVERLAY_PREFIX, is_excluded};
pub use fs::{FileSystem, StdFileSystem, is_hidden};
pub use record::{DisplayText, GameObject};
pub use report::{
    COVERAGE_CSS, coverage_color, render_json, render_summary_text, render_tileset_html,
    total_stats,
};
pub use store::{Arity, Decoded, RecordStore};
pub use tileset::{TILESET_METADATA, TileAtlas, TileConfig, TileEntry, TileInfo, Tileset};
pub use tree::JsonFileTree;
