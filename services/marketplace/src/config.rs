//! Server settings

use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

/// HTTP server and asset settings
///
/// Loaded from `MARKETPLACE_*` environment variables, e.g.
/// `MARKETPLACE_BIND_ADDRESS=127.0.0.1:8080`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,
    /// Directory holding committed product images, one folder per vendor and product
    pub image_root: PathBuf,
    /// Directory the upload collaborator writes fresh files into
    pub staging_dir: PathBuf,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("image_root", "public/images/products")?
            .set_default("staging_dir", "public/images/tmp")?
            .set_default("secure_cookies", false)?
            .add_source(config::Environment::with_prefix("MARKETPLACE").try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        unsafe {
            std::env::remove_var("MARKETPLACE_BIND_ADDRESS");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.image_root, PathBuf::from("public/images/products"));
    }

    #[test]
    #[serial]
    fn environment_overrides_defaults() {
        unsafe {
            std::env::set_var("MARKETPLACE_BIND_ADDRESS", "127.0.0.1:8080");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");

        unsafe {
            std::env::remove_var("MARKETPLACE_BIND_ADDRESS");
        }
    }
}
