//! Asset pipeline for stylesheet and script preprocessing.

use serde::Deserialize;
use stitch_content::{Payload, ScannedFile};

/// How a preprocessing step is configured.
///
/// Deserializes from `false`/`true` or a mode string such as `"compressed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "RawAssetMode")]
pub enum AssetMode {
    /// Leave files alone
    #[default]
    Off,
    /// Compile, but do not minify
    On,
    /// Compile and minify
    Compressed,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAssetMode {
    Flag(bool),
    Named(String),
}

impl From<RawAssetMode> for AssetMode {
    fn from(raw: RawAssetMode) -> Self {
        match raw {
            RawAssetMode::Flag(false) => AssetMode::Off,
            RawAssetMode::Flag(true) => AssetMode::On,
            RawAssetMode::Named(name) if name == "compressed" => AssetMode::Compressed,
            RawAssetMode::Named(name) if name.is_empty() || name == "off" => AssetMode::Off,
            RawAssetMode::Named(_) => AssetMode::On,
        }
    }
}

/// Preprocessing settings for one build pass.
#[derive(Debug, Clone, Default)]
pub struct AssetOptions {
    /// `.scss` compilation (and minification when compressed)
    pub sass: AssetMode,

    /// `.css` minification
    pub css: AssetMode,

    /// `.js` minification
    pub js: AssetMode,

    /// Debug passes never minify
    pub debug: bool,
}

/// Contents of a template asset as it moves through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    Text(String),
    Bytes(Vec<u8>),
}

impl AssetData {
    /// Final bytes for the output tree.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            AssetData::Text(text) => text.into_bytes(),
            AssetData::Bytes(bytes) => bytes,
        }
    }
}

/// A file from the template tree on its way to the output tree.
#[derive(Debug, Clone)]
pub struct TemplateAsset {
    /// Output path, updated when preprocessing changes the file type
    pub relative_path: String,

    /// Extension the file was scanned with
    pub extension: String,

    /// Rendered against the context when true
    pub parsable: bool,

    /// Current contents
    pub data: AssetData,
}

impl From<ScannedFile> for TemplateAsset {
    fn from(file: ScannedFile) -> Self {
        let data = match file.payload {
            Payload::Text(text) => AssetData::Text(text),
            Payload::Bytes(bytes) => AssetData::Bytes(bytes),
            Payload::Absent => AssetData::Bytes(Vec::new()),
        };

        Self {
            relative_path: file.relative_path,
            extension: file.extension,
            parsable: file.parsable,
            data,
        }
    }
}

/// Errors that can occur while preprocessing an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("SCSS compile error: {0}")]
    Sass(String),

    #[error("CSS parse error: {0}")]
    CssParse(String),

    #[error("CSS minify error: {0}")]
    CssMinify(String),

    #[error("Asset is not valid UTF-8")]
    NotText,
}

/// Asset pipeline utilities.
pub struct AssetPipeline;

impl AssetPipeline {
    /// Compile SCSS to CSS using grass.
    pub fn compile_scss(source: &str) -> Result<String, AssetError> {
        grass::from_string(source.to_string(), &grass::Options::default())
            .map_err(|e| AssetError::Sass(e.to_string()))
    }

    /// Minify CSS using lightningcss.
    pub fn minify_css(css: &str) -> Result<String, AssetError> {
        use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

        let stylesheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|e| AssetError::CssParse(e.to_string()))?;

        let minified = stylesheet
            .to_css(PrinterOptions {
                minify: true,
                ..Default::default()
            })
            .map_err(|e| AssetError::CssMinify(e.to_string()))?;

        Ok(minified.code)
    }

    /// Minify JavaScript using minifier.
    pub fn minify_js(js: &str) -> String {
        minifier::js::minify(js).to_string()
    }

    /// Apply compilation and minification to one asset, in that order.
    ///
    /// Each completed step updates the asset's data and path. On failure the
    /// asset keeps the state of the last completed step.
    pub fn process(asset: &mut TemplateAsset, options: &AssetOptions) -> Result<(), AssetError> {
        let ext = asset.extension.as_str();
        let minify = !options.debug;

        if ext == "scss" && options.sass != AssetMode::Off {
            let css = Self::compile_scss(asset_text(&asset.data)?)?;
            asset.data = AssetData::Text(css);
            asset.relative_path = replace_extension(&asset.relative_path, "css");
        }

        let css_minify = (ext == "css" && options.css == AssetMode::Compressed)
            || (ext == "scss" && options.sass == AssetMode::Compressed);

        if minify && css_minify && !asset.relative_path.ends_with(".min.css") {
            let css = Self::minify_css(asset_text(&asset.data)?)?;
            asset.data = AssetData::Text(css);
            asset.relative_path = replace_extension(&asset.relative_path, "min.css");
        } else if minify
            && ext == "js"
            && options.js == AssetMode::Compressed
            && !asset.relative_path.contains(".min.js")
        {
            let js = Self::minify_js(asset_text(&asset.data)?);
            asset.data = AssetData::Text(js);
            asset.relative_path = replace_extension(&asset.relative_path, "min.js");
        }

        Ok(())
    }
}

fn asset_text(data: &AssetData) -> Result<&str, AssetError> {
    match data {
        AssetData::Text(text) => Ok(text),
        AssetData::Bytes(bytes) => std::str::from_utf8(bytes).map_err(|_| AssetError::NotText),
    }
}

/// Swap the last extension of `path` for `ext` (which may itself contain dots).
fn replace_extension(path: &str, ext: &str) -> String {
    match path.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, ext),
        None => format!("{}.{}", path, ext),
    }
}
