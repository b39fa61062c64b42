//! Product image storage
//!
//! Uploads land in a staging directory under the name the upload layer
//! picked. Committing a product moves them into
//! `<root>/<vendor id>/<product id>/`, keeping the file names, which are
//! all the catalog stores.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use uuid::Uuid;

/// File storage collaborator for product images
pub trait ImageStore: Send + Sync {
    /// Move staged files into the product's directory
    fn promote(
        &self,
        vendor_id: Uuid,
        product_id: Uuid,
        files: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete individual files from the product's directory
    fn discard(
        &self,
        vendor_id: Uuid,
        product_id: Uuid,
        files: &[String],
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete the product's whole directory
    fn purge(&self, vendor_id: Uuid, product_id: Uuid) -> impl Future<Output = Result<()>> + Send;
}

/// Image store on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    root: PathBuf,
    staging: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>, staging: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            staging: staging.into(),
        }
    }

    fn product_dir(&self, vendor_id: Uuid, product_id: Uuid) -> PathBuf {
        self.root
            .join(vendor_id.to_string())
            .join(product_id.to_string())
    }
}

impl ImageStore for LocalImageStore {
    async fn promote(&self, vendor_id: Uuid, product_id: Uuid, files: &[String]) -> Result<()> {
        let dir = self.product_dir(vendor_id, product_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;

        for file in files {
            let from = self.staging.join(file);
            let to = dir.join(file);
            tokio::fs::rename(&from, &to)
                .await
                .with_context(|| format!("moving {} to {}", from.display(), to.display()))?;
        }

        info!("Stored {} images for product {}", files.len(), product_id);
        Ok(())
    }

    async fn discard(&self, vendor_id: Uuid, product_id: Uuid, files: &[String]) -> Result<()> {
        let dir = self.product_dir(vendor_id, product_id);
        for file in files {
            let path = dir.join(file);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("removing {}", path.display()));
                }
            }
        }
        Ok(())
    }

    async fn purge(&self, vendor_id: Uuid, product_id: Uuid) -> Result<()> {
        let dir = self.product_dir(vendor_id, product_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!("Removed image directory {}", dir.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", dir.display())),
        }
    }
}
