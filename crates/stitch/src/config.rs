//! Site configuration (`config.json` at the site root).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use stitch_publish::PublishConfig;
use stitch_static::{AssetMode, AssetOptions, BuildConfig};

const CONFIG_FILE: &str = "config.json";

/// Configuration file structure (config.json).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Site-relative exclusion patterns
    pub ignore: Vec<String>,
    pub parse: ParseSettings,
    pub debug: bool,
    pub ftp: FtpSettings,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ParseSettings {
    pub sass: AssetMode,
    pub css: AssetMode,
    pub js: AssetMode,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FtpSettings {
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub port: u16,
}

impl Default for FtpSettings {
    fn default() -> Self {
        Self {
            host: None,
            user: None,
            password: None,
            port: 21,
        }
    }
}

/// Check that `folder` is an existing directory and return it.
pub fn site_dir(folder: &Path) -> Result<PathBuf> {
    if !folder.is_dir() {
        bail!("Site folder {} does not exist", folder.display());
    }
    Ok(folder.to_path_buf())
}

impl SiteConfig {
    /// Load `config.json` from the site folder if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(site_dir: &Path) -> Result<Self> {
        let path = site_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());

        Ok(config)
    }

    pub fn build_config(&self, site_dir: &Path) -> BuildConfig {
        BuildConfig {
            site_dir: site_dir.to_path_buf(),
            ignore: self.ignore.clone(),
            assets: AssetOptions {
                sass: self.parse.sass,
                css: self.parse.css,
                js: self.parse.js,
                debug: self.debug,
            },
        }
    }

    /// Publish settings; host, user and password must all be present.
    pub fn publish_config(&self) -> Result<PublishConfig> {
        let ftp = &self.ftp;
        let (Some(host), Some(user), Some(password)) = (&ftp.host, &ftp.user, &ftp.password)
        else {
            bail!("Authentication data for FTP is not specified in {}", CONFIG_FILE);
        };

        Ok(PublishConfig {
            host: host.clone(),
            port: ftp.port,
            user: user.clone(),
            password: password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn load(json: &str) -> Result<SiteConfig> {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(CONFIG_FILE), json).unwrap();
        SiteConfig::load(temp.path())
    }

    #[test]
    fn missing_file_gives_defaults() {
        let temp = tempdir().unwrap();
        let config = SiteConfig::load(temp.path()).unwrap();

        assert!(config.ignore.is_empty());
        assert!(!config.debug);
        assert_eq!(config.parse.sass, AssetMode::Off);
        assert_eq!(config.ftp.port, 21);
    }

    #[test]
    fn reads_every_option() {
        let config = load(
            r#"{
                "ignore": ["templates/vendor", "templates/css/raw.css"],
                "parse": { "sass": "compressed", "css": "compressed", "js": false },
                "debug": true,
                "ftp": { "host": "ftp.example.com", "user": "me", "password": "pw", "port": 2121 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.ignore, vec!["templates/vendor", "templates/css/raw.css"]);
        assert_eq!(config.parse.sass, AssetMode::Compressed);
        assert_eq!(config.parse.css, AssetMode::Compressed);
        assert_eq!(config.parse.js, AssetMode::Off);

        let build = config.build_config(Path::new("site"));
        assert_eq!(build.site_dir, PathBuf::from("site"));
        assert!(build.assets.debug);

        let publish = config.publish_config().unwrap();
        assert_eq!(publish.host, "ftp.example.com");
        assert_eq!(publish.port, 2121);
    }

    #[test]
    fn sass_accepts_a_flag() {
        let config = load(r#"{ "parse": { "sass": true } }"#).unwrap();
        assert_eq!(config.parse.sass, AssetMode::On);
    }

    #[test]
    fn malformed_file_names_the_file() {
        let err = load("{ not json").unwrap_err();
        assert!(format!("{err}").contains(CONFIG_FILE));
    }

    #[test]
    fn publish_requires_credentials() {
        let config = load(r#"{ "ftp": { "host": "ftp.example.com", "user": "me" } }"#).unwrap();
        let err = config.publish_config().unwrap_err();
        assert!(err.to_string().contains("Authentication data for FTP is not specified"));
    }

    #[test]
    fn rejects_missing_site_folder() {
        let temp = tempdir().unwrap();
        assert!(site_dir(&temp.path().join("nope")).is_err());
        assert!(site_dir(temp.path()).is_ok());
    }
}
