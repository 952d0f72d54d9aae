//! Listing repository operations.
//!
//! The purchase path uses a single conditional UPDATE guarded on
//! `buyer_id IS NULL`, so concurrent buyers race on the database row and
//! exactly one of them can ever win.

use chrono::Utc;
use rusqlite::Connection;
use torget_core::{Error, ListingId, PhotoId, Result, UserId};

use crate::models::{Listing, Photo};

const COLS: &str = "id, title, description, price_cents, seller_id, buyer_id, version, created_at";

/// Outcome of a purchase attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryBuyOutcome {
    /// The caller claimed the listing.
    Bought,
    /// Somebody else already bought it.
    AlreadySold,
    /// No listing with that ID exists.
    NotFound,
}

/// List all listings still open for purchase, newest first.
///
/// Sold listings (buyer set) never appear here. The secondary sort on `id`
/// keeps the order stable when two listings share a creation timestamp.
pub fn list_for_sale(conn: &Connection) -> Result<Vec<Listing>> {
    let q = format!(
        "SELECT {COLS} FROM listings WHERE buyer_id IS NULL ORDER BY created_at DESC, id"
    );
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Listing::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Get a listing by primary key.
pub fn get_listing(conn: &Connection, id: ListingId) -> Result<Option<Listing>> {
    let q = format!("SELECT {COLS} FROM listings WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Listing::from_row);
    match result {
        Ok(l) => Ok(Some(l)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Create a listing together with its photo rows in one transaction.
///
/// If any photo insert fails the whole listing is rolled back; a listing is
/// never visible with only part of its photos.
pub fn create_listing(
    conn: &Connection,
    title: &str,
    description: &str,
    price_cents: i64,
    seller_id: UserId,
    photo_blob_keys: &[String],
) -> Result<(Listing, Vec<Photo>)> {
    let id = ListingId::new();
    let created_at = Utc::now().to_rfc3339();

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "INSERT INTO listings (id, title, description, price_cents, seller_id, buyer_id, version, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, 0, ?6)",
        rusqlite::params![
            id.to_string(),
            title,
            description,
            price_cents,
            seller_id.to_string(),
            created_at
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let mut photos = Vec::with_capacity(photo_blob_keys.len());
    for blob_key in photo_blob_keys {
        let photo_id = PhotoId::new();
        tx.execute(
            "INSERT INTO photos (id, listing_id, blob_key, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![photo_id.to_string(), id.to_string(), blob_key, created_at],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        photos.push(Photo {
            id: photo_id,
            listing_id: id,
            blob_key: blob_key.clone(),
            created_at: created_at.clone(),
        });
    }

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok((
        Listing {
            id,
            title: title.to_string(),
            description: description.to_string(),
            price_cents,
            seller_id,
            buyer_id: None,
            version: 0,
            created_at,
        },
        photos,
    ))
}

/// Delete a listing and its photo rows in one transaction.
///
/// The cascade is explicit: photo rows first, then the listing. Blobs in
/// the photo store are left untouched. Returns true if a listing row was
/// deleted.
pub fn delete_listing(conn: &Connection, id: ListingId) -> Result<bool> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| Error::database(e.to_string()))?;

    tx.execute(
        "DELETE FROM photos WHERE listing_id = ?1",
        [id.to_string()],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    let n = tx
        .execute("DELETE FROM listings WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;

    tx.commit().map_err(|e| Error::database(e.to_string()))?;

    Ok(n > 0)
}

/// Attempt to buy a listing for `buyer`.
///
/// The UPDATE claims the row only while `buyer_id IS NULL` and bumps the
/// version in the same statement, which is what makes concurrent purchase
/// attempts safe: SQLite serializes the writes and the second one affects
/// zero rows.
pub fn try_buy(conn: &Connection, id: ListingId, buyer: UserId) -> Result<TryBuyOutcome> {
    let n = conn
        .execute(
            "UPDATE listings SET buyer_id = ?1, version = version + 1
             WHERE id = ?2 AND buyer_id IS NULL",
            rusqlite::params![buyer.to_string(), id.to_string()],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    if n > 0 {
        return Ok(TryBuyOutcome::Bought);
    }

    // Zero rows: either the listing is gone or somebody beat us to it.
    match get_listing(conn, id)? {
        Some(_) => Ok(TryBuyOutcome::AlreadySold),
        None => Ok(TryBuyOutcome::NotFound),
    }
}
