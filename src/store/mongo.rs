//! Implements the `DataStore` trait using a MongoDB collection.

use crate::error::{ErrorType, IntoResult};
use crate::model::{MeterReading, StoredReading};
use crate::store::{DataStore, StoreSecrets};
use crate::Result;
use anyhow::Context;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson};
use mongodb::{Client, Collection};
use serde::Deserialize;
use tracing::{debug, trace};

/// A connection to the readings collection of a MongoDB cluster.
pub struct MongoStore {
    collection: Collection<MeterReading>,
}

impl MongoStore {
    /// Builds the connection URI from `secrets`, connects and pings the database so that bad
    /// credentials or an unreachable cluster fail here rather than on first use.
    pub async fn connect(secrets: &StoreSecrets) -> Result<Self> {
        let uri = secrets
            .connection_uri()
            .pub_result(ErrorType::Connection)?;
        let client = Client::with_uri_str(&uri)
            .await
            .with_context(|| format!("Unable to connect to '{}'", secrets.mongo_cluster_url))
            .pub_result(ErrorType::Connection)?;
        let database = client.database(&secrets.database_name);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .with_context(|| format!("Unable to reach database '{}'", secrets.database_name))
            .pub_result(ErrorType::Connection)?;
        debug!(
            "Connected to {}/{}",
            secrets.database_name, secrets.collection_name
        );
        Ok(Self {
            collection: database.collection(&secrets.collection_name),
        })
    }
}

#[async_trait::async_trait]
impl DataStore for MongoStore {
    async fn write(&self, reading: &MeterReading) -> Result<()> {
        let result = self
            .collection
            .insert_one(reading)
            .await
            .context("Unable to insert the reading")
            .pub_result(ErrorType::Write)?;
        trace!("Inserted document {}", result.inserted_id);
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<StoredReading>> {
        let documents: Vec<MongoReading> = self
            .collection
            .clone_with_type::<MongoReading>()
            .find(doc! {})
            .await
            .context("Unable to query the readings collection")
            .pub_result(ErrorType::Read)?
            .try_collect()
            .await
            .context("Unable to read the readings collection")
            .pub_result(ErrorType::Read)?;
        debug!("Fetched {} readings", documents.len());
        Ok(documents.into_iter().map(StoredReading::from).collect())
    }
}

/// A stored document including the `_id` that MongoDB assigned.
#[derive(Debug, Deserialize)]
struct MongoReading {
    #[serde(rename = "_id")]
    id: Option<Bson>,
    date: String,
    electricity_day: f64,
    electricity_night: f64,
    electricity_car: f64,
    gas: f64,
}

impl From<MongoReading> for StoredReading {
    fn from(doc: MongoReading) -> Self {
        let id = doc.id.map(|id| match id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(s) => s,
            other => other.to_string(),
        });
        StoredReading::new(
            id,
            MeterReading {
                date: doc.date,
                electricity_day: doc.electricity_day,
                electricity_night: doc.electricity_night,
                electricity_car: doc.electricity_car,
                gas: doc.gas,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_document_conversion() {
        let oid = ObjectId::new();
        let document = doc! {
            "_id": oid,
            "date": "2024-01-01T00:00:00Z",
            "electricity_day": 12_i64,
            "electricity_night": 5_i32,
            "electricity_car": 0.0,
            "gas": 50000_i64,
        };
        let parsed: MongoReading = mongodb::bson::from_document(document).unwrap();
        let stored = StoredReading::from(parsed);
        assert_eq!(stored.id, Some(oid.to_hex()));
        assert_eq!(stored.reading.electricity_day, 12.0);
        assert_eq!(stored.reading.electricity_night, 5.0);
        assert_eq!(stored.reading.gas, 50000.0);
    }

    #[test]
    fn test_document_without_id() {
        let document = doc! {
            "date": "2024-01-01",
            "electricity_day": 1.5,
            "electricity_night": 0.0,
            "electricity_car": 0.0,
            "gas": 0.0,
        };
        let parsed: MongoReading = mongodb::bson::from_document(document).unwrap();
        assert_eq!(StoredReading::from(parsed).id, None);
    }

    #[test]
    fn test_document_with_wrong_type_is_rejected() {
        let document = doc! {
            "date": "2024-01-01",
            "electricity_day": "twelve",
            "electricity_night": 0.0,
            "electricity_car": 0.0,
            "gas": 0.0,
        };
        assert!(mongodb::bson::from_document::<MongoReading>(document).is_err());
    }
}
