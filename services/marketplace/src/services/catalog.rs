//! Product catalog: browsing, search and vendor-owned mutations

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{MarketError, MarketResult};
use crate::images::ImageStore;
use crate::models::{
    Account, NewProduct, Product, ProductDraft, ProductUpdate, Role, VendorProducts,
};
use crate::randomizer::{Randomizer, shuffled};
use crate::repositories::{AccountRepository, ProductRepository};
use crate::search;
use crate::validation::{
    validate_description, validate_price, validate_product_images, validate_product_name,
    validate_search_query,
};

/// Catalog service
pub struct CatalogService<A: AccountRepository, P: ProductRepository, I: ImageStore> {
    accounts: A,
    products: P,
    images: I,
    randomizer: Arc<dyn Randomizer>,
}

impl<A, P, I> CatalogService<A, P, I>
where
    A: AccountRepository,
    P: ProductRepository,
    I: ImageStore,
{
    pub fn new(accounts: A, products: P, images: I, randomizer: Arc<dyn Randomizer>) -> Self {
        Self {
            accounts,
            products,
            images,
            randomizer,
        }
    }

    /// Products of the vendor named `username`
    pub async fn list_by_vendor(&self, username: &str, randomize: bool) -> MarketResult<VendorProducts> {
        let vendor = self
            .accounts
            .find_by_username(username)
            .await?
            .filter(|account| account.role() == Role::Vendor)
            .ok_or_else(|| MarketError::NotFound("vendor".to_string()))?;

        let mut products = self.products.products_by_owner(vendor.id).await?;
        if randomize {
            products = shuffled(self.randomizer.as_ref(), products);
        }

        Ok(vendor_group(vendor, products))
    }

    /// Every vendor with its products, including vendors that have none
    pub async fn list_all_grouped(&self, randomize: bool) -> MarketResult<Vec<VendorProducts>> {
        let vendors = self.accounts.list_vendors().await?;

        let mut by_owner: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for product in self.products.all_products().await? {
            by_owner.entry(product.owner_id).or_default().push(product);
        }

        let mut groups: Vec<VendorProducts> = vendors
            .into_iter()
            .map(|vendor| {
                let mut products = by_owner.remove(&vendor.id).unwrap_or_default();
                if randomize {
                    products = shuffled(self.randomizer.as_ref(), products);
                }
                vendor_group(vendor, products)
            })
            .collect();

        if randomize {
            groups = shuffled(self.randomizer.as_ref(), groups);
        }
        Ok(groups)
    }

    /// Products priced within `min..=max`; vendors left without products are dropped
    pub async fn filter_by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> MarketResult<Vec<VendorProducts>> {
        if min < Decimal::ZERO || max < Decimal::ZERO {
            return Err(MarketError::Validation(
                "Price bounds must not be negative".to_string(),
            ));
        }
        if min > max {
            return Err(MarketError::Validation(
                "Minimum price must not exceed maximum price".to_string(),
            ));
        }

        let groups = self.list_all_grouped(false).await?;
        Ok(retain_products(groups, |product| {
            product.price >= min && product.price <= max
        }))
    }

    /// Products whose name fuzzy-matches `query`, grouped by vendor
    pub async fn search(&self, query: &str) -> MarketResult<Vec<VendorProducts>> {
        let query = validate_search_query(query).map_err(MarketError::Validation)?;
        let groups = self.list_all_grouped(false).await?;

        let matched: HashSet<Uuid> = search::matching(
            query,
            groups
                .iter()
                .flat_map(|group| group.products.iter())
                .map(|product| (product.id, product.name.as_str())),
        )
        .into_iter()
        .map(|(id, _)| id)
        .collect();

        info!("Search {:?} matched {} products", query, matched.len());
        Ok(retain_products(groups, |product| matched.contains(&product.id)))
    }

    pub async fn get_product(&self, id: Uuid) -> MarketResult<Product> {
        self.products
            .find_product(id)
            .await?
            .ok_or_else(|| MarketError::NotFound("product".to_string()))
    }

    /// Create a product for `vendor`, moving its staged images into place first
    pub async fn create_product(&self, vendor: &Account, draft: ProductDraft) -> MarketResult<Product> {
        if vendor.role() != Role::Vendor {
            return Err(MarketError::Forbidden);
        }

        let name = validate_product_name(&draft.name).map_err(MarketError::Validation)?;
        validate_price(draft.price).map_err(MarketError::Validation)?;
        let description =
            validate_description(draft.description.as_deref()).map_err(MarketError::Validation)?;
        validate_product_images(&draft.images).map_err(MarketError::Validation)?;

        let id = Uuid::new_v4();
        self.images.promote(vendor.id, id, &draft.images).await?;

        let inserted = self
            .products
            .insert_product(NewProduct {
                id,
                owner_id: vendor.id,
                name,
                price: draft.price,
                images: draft.images,
                description,
            })
            .await;

        match inserted {
            Ok(product) => {
                info!("Vendor {} created product {}", vendor.username, product.id);
                Ok(product)
            }
            Err(e) => {
                if let Err(cleanup) = self.images.purge(vendor.id, id).await {
                    warn!(
                        "Orphaned images for unsaved product {}: {:#}",
                        id, cleanup
                    );
                }
                Err(e.into())
            }
        }
    }

    /// Apply `update` to a product the caller owns
    pub async fn update_product(
        &self,
        vendor: &Account,
        id: Uuid,
        update: ProductUpdate,
    ) -> MarketResult<Product> {
        let current = self.get_product(id).await?;
        if current.owner_id != vendor.id {
            return Err(MarketError::Forbidden);
        }

        let update = ProductUpdate {
            name: update
                .name
                .as_deref()
                .map(validate_product_name)
                .transpose()
                .map_err(MarketError::Validation)?,
            price: match update.price {
                Some(price) => {
                    validate_price(price).map_err(MarketError::Validation)?;
                    Some(price)
                }
                None => None,
            },
            description: match update.description.as_deref() {
                Some(description) => Some(
                    validate_description(Some(description))
                        .map_err(MarketError::Validation)?
                        .unwrap_or_default(),
                ),
                None => None,
            },
            images: match update.images {
                Some(images) => {
                    validate_product_images(&images).map_err(MarketError::Validation)?;
                    Some(images)
                }
                None => None,
            },
        };

        let (added, dropped): (Vec<String>, Vec<String>) = match &update.images {
            Some(images) => (
                images
                    .iter()
                    .filter(|image| !current.images.contains(image))
                    .cloned()
                    .collect(),
                current
                    .images
                    .iter()
                    .filter(|image| !images.contains(image))
                    .cloned()
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        if !added.is_empty() {
            self.images.promote(vendor.id, id, &added).await?;
        }

        let updated = match self.products.update_product(id, update).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                self.discard_or_warn(vendor.id, id, &added).await;
                return Err(MarketError::NotFound("product".to_string()));
            }
            Err(e) => {
                self.discard_or_warn(vendor.id, id, &added).await;
                return Err(e.into());
            }
        };

        self.discard_or_warn(vendor.id, id, &dropped).await;
        info!("Vendor {} updated product {}", vendor.username, id);
        Ok(updated)
    }

    /// Delete a product the caller owns, then its images
    pub async fn delete_product(&self, vendor: &Account, id: Uuid) -> MarketResult<()> {
        let current = self.get_product(id).await?;
        if current.owner_id != vendor.id {
            return Err(MarketError::Forbidden);
        }

        if !self.products.delete_product(id).await? {
            return Err(MarketError::NotFound("product".to_string()));
        }

        if let Err(e) = self.images.purge(vendor.id, id).await {
            warn!("Orphaned images for deleted product {}: {:#}", id, e);
        }

        info!("Vendor {} deleted product {}", vendor.username, id);
        Ok(())
    }

    async fn discard_or_warn(&self, vendor_id: Uuid, product_id: Uuid, files: &[String]) {
        if files.is_empty() {
            return;
        }
        if let Err(e) = self.images.discard(vendor_id, product_id, files).await {
            warn!(
                "Orphaned images {:?} for product {}: {:#}",
                files, product_id, e
            );
        }
    }
}

fn vendor_group(vendor: Account, products: Vec<Product>) -> VendorProducts {
    VendorProducts {
        vendor_id: vendor.id,
        vendor_name: vendor.display_name().unwrap_or_default().to_string(),
        username: vendor.username,
        profile_image: vendor.profile_image,
        products,
    }
}

fn retain_products(
    groups: Vec<VendorProducts>,
    keep: impl Fn(&Product) -> bool,
) -> Vec<VendorProducts> {
    groups
        .into_iter()
        .filter_map(|mut group| {
            group.products.retain(|product| keep(product));
            (!group.products.is_empty()).then_some(group)
        })
        .collect()
}
