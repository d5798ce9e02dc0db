//! Raindrop.io REST endpoints used by the exporter

use crate::client::{Method, ResilientClient, Sleeper, ThreadSleeper, Transport};
use crate::csv_format;
use crate::error::{ExportError, Result};
use crate::hierarchy::Group;
use crate::models::bookmark::BookmarkRecord;
use crate::models::collection::CollectionId;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_BASE_URL: &str = "https://api.raindrop.io/rest/v1";

/// `{ "items": [...] }` envelope of the collection listings
#[derive(Debug, Deserialize)]
struct ItemsEnvelope {
    #[serde(default)]
    items: Vec<Value>,
}

/// Typed access to the handful of endpoints the export needs
pub struct RaindropApi<T: Transport, S: Sleeper = ThreadSleeper> {
    client: ResilientClient<T, S>,
}

impl<T: Transport, S: Sleeper> RaindropApi<T, S> {
    pub fn new(client: ResilientClient<T, S>) -> Self {
        Self { client }
    }

    /// `GET /collections`
    pub fn root_collections(&self) -> Result<Vec<Value>> {
        let envelope: ItemsEnvelope = self.client.request_json(Method::Get, "/collections", None)?;
        info!("Fetched {} root collections", envelope.items.len());
        Ok(envelope.items)
    }

    /// `GET /collections/childrens`
    pub fn child_collections(&self) -> Result<Vec<Value>> {
        let envelope: ItemsEnvelope =
            self.client
                .request_json(Method::Get, "/collections/childrens", None)?;
        info!("Fetched {} nested collections", envelope.items.len());
        Ok(envelope.items)
    }

    /// Groups from `GET /user`
    pub fn groups(&self) -> Result<Vec<Group>> {
        let payload: Value = self.client.request_json(Method::Get, "/user", None)?;
        let groups = Group::from_user_payload(&payload);
        info!("Fetched {} groups", groups.len());
        Ok(groups)
    }

    /// Raw CSV export of one collection, `None` when the API says 404
    pub fn export_csv(&self, collection_id: &CollectionId) -> Result<Option<String>> {
        let path = format!("/raindrops/{}/export.csv", collection_id);
        match self.client.request_text(Method::Get, &path, None) {
            Ok(body) => Ok(Some(body)),
            Err(ExportError::Status { status: 404, .. }) => {
                debug!("Collection {} has no export (404)", collection_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Parsed bookmarks of one collection; a missing export is an empty one
    pub fn bookmarks(&self, collection_id: &CollectionId) -> Result<Vec<BookmarkRecord>> {
        match self.export_csv(collection_id)? {
            Some(body) => Ok(csv_format::parse(&body)?.into_records()),
            None => Ok(Vec::new()),
        }
    }
}
