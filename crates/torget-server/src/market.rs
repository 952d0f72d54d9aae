//! Marketplace service coordinating the blob store and the listing tables.
//!
//! Route handlers stay thin; every listing operation and its ordering rules
//! (blobs before rows, conditional purchase, seller-only delete) live here.

use std::sync::Arc;

use torget_blob::BlobStore;
use torget_core::{Error, ListingId, Result, UserId};
use torget_db::models::{Listing, Photo};
use torget_db::pool::{get_conn, DbPool};
use torget_db::queries::listings::{self, TryBuyOutcome};
use torget_db::queries::photos;

/// A listing together with its photo rows.
#[derive(Debug, Clone)]
pub struct ListingWithPhotos {
    pub listing: Listing,
    pub photos: Vec<Photo>,
}

/// Input for creating a listing.
#[derive(Debug)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    /// Raw photo bytes, one entry per uploaded file.
    pub photos: Vec<Vec<u8>>,
}

/// Photo bytes ready to serve, with their content type.
#[derive(Debug)]
pub struct ServedPhoto {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Coordinator for all marketplace operations.
pub struct MarketplaceService {
    db: DbPool,
    blobs: Arc<BlobStore>,
}

impl MarketplaceService {
    pub fn new(db: DbPool, blobs: Arc<BlobStore>) -> Self {
        Self { db, blobs }
    }

    /// All listings still open for purchase, newest first, with photos.
    pub fn list_open(&self) -> Result<Vec<ListingWithPhotos>> {
        let conn = get_conn(&self.db)?;
        let open = listings::list_for_sale(&conn)?;
        open.into_iter()
            .map(|listing| {
                let photos = photos::list_for_listing(&conn, listing.id)?;
                Ok(ListingWithPhotos { listing, photos })
            })
            .collect()
    }

    /// Look up a single listing with its photos.
    pub fn get(&self, id: ListingId) -> Result<ListingWithPhotos> {
        let conn = get_conn(&self.db)?;
        let listing =
            listings::get_listing(&conn, id)?.ok_or_else(|| Error::not_found("listing", id))?;
        let photos = photos::list_for_listing(&conn, id)?;
        Ok(ListingWithPhotos { listing, photos })
    }

    /// Create a listing for `seller`.
    ///
    /// Photo bytes are written to the blob store first; only once every blob
    /// is durable does the listing transaction run, so a failed upload never
    /// leaves a listing pointing at a missing blob. The reverse (orphaned
    /// blobs after a failed insert) is accepted, matching the delete policy.
    pub fn create_listing(&self, new: NewListing, seller: UserId) -> Result<ListingWithPhotos> {
        let mut blob_keys = Vec::with_capacity(new.photos.len());
        for bytes in &new.photos {
            blob_keys.push(self.blobs.put(bytes)?);
        }

        let conn = get_conn(&self.db)?;
        let (listing, photos) = listings::create_listing(
            &conn,
            &new.title,
            &new.description,
            new.price_cents,
            seller,
            &blob_keys,
        )?;

        tracing::info!(
            listing_id = %listing.id,
            seller = %seller,
            photos = photos.len(),
            "Listing created"
        );
        Ok(ListingWithPhotos { listing, photos })
    }

    /// Buy the listing for `buyer`.
    ///
    /// Exactly one concurrent caller can succeed; the rest get `Conflict`.
    pub fn buy(&self, id: ListingId, buyer: UserId) -> Result<ListingWithPhotos> {
        let conn = get_conn(&self.db)?;
        match listings::try_buy(&conn, id, buyer)? {
            TryBuyOutcome::Bought => {
                tracing::info!(listing_id = %id, buyer = %buyer, "Listing sold");
                drop(conn);
                self.get(id)
            }
            TryBuyOutcome::AlreadySold => {
                Err(Error::Conflict(format!("listing {id} is already sold")))
            }
            TryBuyOutcome::NotFound => Err(Error::not_found("listing", id)),
        }
    }

    /// Delete the listing, returning the removed state.
    ///
    /// Only the seller may delete. Photo rows are removed with the listing;
    /// blobs stay in the store untouched.
    pub fn delete(&self, id: ListingId, requester: UserId) -> Result<ListingWithPhotos> {
        let removed = self.get(id)?;
        if removed.listing.seller_id != requester {
            return Err(Error::Forbidden(
                "only the seller can delete a listing".into(),
            ));
        }

        let conn = get_conn(&self.db)?;
        if !listings::delete_listing(&conn, id)? {
            // Raced with another delete between the read and the write.
            return Err(Error::not_found("listing", id));
        }

        tracing::info!(listing_id = %id, "Listing deleted");
        Ok(removed)
    }

    /// Fetch a photo blob and rescale it for serving.
    ///
    /// `width == 0` serves the stored bytes unchanged with their sniffed
    /// content type; any other width serves a JPEG whose longer side equals
    /// `width`.
    pub fn serve_photo(&self, key: &str, width: u32) -> Result<ServedPhoto> {
        let original = self.blobs.get(key)?;

        if width == 0 {
            let content_type = torget_image::content_type(&original);
            return Ok(ServedPhoto {
                bytes: original,
                content_type,
            });
        }

        let bytes = torget_image::render(&original, width)?;
        Ok(ServedPhoto {
            bytes,
            content_type: "image/jpeg",
        })
    }
}
