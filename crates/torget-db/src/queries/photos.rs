//! Photo row lookups.

use rusqlite::Connection;
use torget_core::{Error, ListingId, PhotoId, Result};

use crate::models::Photo;

const COLS: &str = "id, listing_id, blob_key, created_at";

/// List all photos attached to a listing, in upload order (rowid reflects
/// insertion order; created_at is shared by photos from one upload).
pub fn list_for_listing(conn: &Connection, listing_id: ListingId) -> Result<Vec<Photo>> {
    let q = format!("SELECT {COLS} FROM photos WHERE listing_id = ?1 ORDER BY rowid");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([listing_id.to_string()], Photo::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Get a photo by primary key.
pub fn get_photo(conn: &Connection, id: PhotoId) -> Result<Option<Photo>> {
    let q = format!("SELECT {COLS} FROM photos WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Photo::from_row);
    match result {
        Ok(p) => Ok(Some(p)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::{listings, users};

    #[test]
    fn list_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let seller = users::create_user(&conn, "s", "hash", "user").unwrap().id;

        let keys = vec!["a".repeat(32), "b".repeat(32)];
        let (listing, created) =
            listings::create_listing(&conn, "Bike", "", 100, seller, &keys).unwrap();

        let photos = list_for_listing(&conn, listing.id).unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].blob_key.len(), 32);

        let found = get_photo(&conn, created[0].id).unwrap().unwrap();
        assert_eq!(found.listing_id, listing.id);
    }

    #[test]
    fn get_missing() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_photo(&conn, PhotoId::new()).unwrap().is_none());
    }
}
