//! Build pipeline for stitch sites.
//!
//! Renders the template tree against the aggregated content context and
//! mirrors the result into the site's output tree.

pub mod assets;
pub mod builder;
pub mod output;
pub mod render;

pub use assets::{AssetData, AssetError, AssetMode, AssetOptions, AssetPipeline, TemplateAsset};
pub use builder::{AssetIssue, BuildConfig, BuildError, BuildPipeline, BuildReport};
pub use output::{OutputError, OutputFile};
pub use render::{render_twice, unescape_html, HandlebarsRenderer, RenderError, Renderer};
