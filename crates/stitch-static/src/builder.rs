//! Build pipeline: scan, parse, aggregate, render, write.

use std::path::PathBuf;
use std::time::Instant;

use stitch_content::{aggregate, parse, scan, ExcludeRules, ParseError, ReadMode, ScanError};

use crate::assets::{AssetData, AssetError, AssetOptions, AssetPipeline, TemplateAsset};
use crate::output::{self, OutputError, OutputFile};
use crate::render::{render_twice, HandlebarsRenderer, RenderError, Renderer};

/// Directory names under the site folder.
pub const CONTENT_DIR: &str = "content";
pub const TEMPLATES_DIR: &str = "templates";
pub const OUTPUT_DIR: &str = "output";

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Site folder holding `content/`, `templates/` and `output/`
    pub site_dir: PathBuf,

    /// Site-relative exclusion patterns
    pub ignore: Vec<String>,

    /// Preprocessing settings
    pub assets: AssetOptions,
}

impl BuildConfig {
    /// Configuration with defaults for the given site folder.
    pub fn new(site_dir: impl Into<PathBuf>) -> Self {
        Self {
            site_dir: site_dir.into(),
            ignore: Vec::new(),
            assets: AssetOptions::default(),
        }
    }

    pub fn content_dir(&self) -> PathBuf {
        self.site_dir.join(CONTENT_DIR)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.site_dir.join(TEMPLATES_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.site_dir.join(OUTPUT_DIR)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// A per-asset problem that did not stop the pass.
#[derive(Debug, thiserror::Error)]
pub enum AssetIssue {
    #[error("{path}: {error}")]
    Preprocess { path: String, error: AssetError },

    #[error("{path}: {error}")]
    Render { path: String, error: RenderError },
}

impl AssetIssue {
    /// Template-relative path of the affected asset.
    pub fn path(&self) -> &str {
        match self {
            AssetIssue::Preprocess { path, .. } | AssetIssue::Render { path, .. } => path,
        }
    }
}

/// Result of a build pass.
#[derive(Debug)]
pub struct BuildReport {
    /// Number of files written
    pub written: usize,

    /// Assets that failed to preprocess or render
    pub issues: Vec<AssetIssue>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that abort a build pass.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing directories: {}", display_paths(.0))]
    DirectoryMissing(Vec<PathBuf>),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs build passes for one site.
pub struct BuildPipeline {
    config: BuildConfig,
    renderer: Box<dyn Renderer>,
}

impl BuildPipeline {
    /// Create a pipeline rendering with handlebars.
    pub fn new(config: BuildConfig) -> Self {
        Self::with_renderer(config, HandlebarsRenderer::new())
    }

    /// Create a pipeline with a custom renderer.
    pub fn with_renderer(config: BuildConfig, renderer: impl Renderer + 'static) -> Self {
        Self {
            config,
            renderer: Box::new(renderer),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Run one full build pass.
    ///
    /// Nothing is written unless both `content/` and `templates/` exist.
    /// Parse failures abort the pass before the output tree is touched;
    /// preprocessing and render failures are isolated to their asset.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        let start = Instant::now();

        let content_dir = self.config.content_dir();
        let templates_dir = self.config.templates_dir();
        let output_dir = self.config.output_dir();

        let missing: Vec<PathBuf> = [&content_dir, &templates_dir]
            .into_iter()
            .filter(|dir| !dir.is_dir())
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::DirectoryMissing(missing));
        }

        tracing::info!("Parsing '{}'...", self.config.site_dir.display());

        let rules = ExcludeRules::new(self.config.ignore.iter().cloned());

        // Content
        let content_files = scan(&content_dir, CONTENT_DIR, &rules, ReadMode::Full)?;
        let fragments = content_files
            .iter()
            .map(parse)
            .collect::<Result<Vec<_>, _>>()?;
        let context = aggregate(&fragments).to_value();

        // Templates
        let templates = scan(&templates_dir, TEMPLATES_DIR, &rules, ReadMode::Full)?;
        let mut issues = Vec::new();
        let mut outputs = Vec::with_capacity(templates.len());

        for file in templates {
            let mut asset = TemplateAsset::from(file);
            self.process_asset(&mut asset, &context, &mut issues);
            outputs.push(OutputFile {
                relative_path: asset.relative_path,
                data: asset.data.into_bytes(),
            });
        }

        // Output
        output::clear_dir(&output_dir)?;
        let written = output::write_tree(&output_dir, &outputs)?;

        let report = BuildReport {
            written,
            issues,
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir,
        };

        tracing::info!(
            "Built {} files in {}ms ({} issues)",
            report.written,
            report.duration_ms,
            report.issues.len()
        );

        Ok(report)
    }

    /// Preprocess and render one asset, recording failures.
    fn process_asset(
        &self,
        asset: &mut TemplateAsset,
        context: &serde_json::Value,
        issues: &mut Vec<AssetIssue>,
    ) {
        if let Err(error) = AssetPipeline::process(asset, &self.config.assets) {
            tracing::warn!("Failed to preprocess {}: {}", asset.relative_path, error);
            issues.push(AssetIssue::Preprocess {
                path: asset.relative_path.clone(),
                error,
            });
        }

        if !asset.parsable {
            return;
        }

        if let AssetData::Text(text) = &asset.data {
            match render_twice(self.renderer.as_ref(), text, context) {
                Ok(rendered) => asset.data = AssetData::Text(rendered),
                Err(error) => {
                    tracing::warn!("Failed to render {}: {}", asset.relative_path, error);
                    issues.push(AssetIssue::Render {
                        path: asset.relative_path.clone(),
                        error,
                    });
                }
            }
        }
    }
}
