use crate::domain::ports::RecordStore;
use crate::domain::record::StoredRecord;
use crate::error::{Collaborator, PipelineError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding every stored record.
pub const CF_RECORDS: &str = "records";

/// A persistent store implementation using RocksDB.
///
/// Records live in a single column family under the key `<table>/<id>`, so a
/// table scan is a forward iteration over the `<table>/` prefix.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
}

fn store_error<E>(err: E) -> PipelineError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    PipelineError::collaborator(Collaborator::Store, err)
}

fn table_prefix(table: &str) -> String {
    format!("{}/", table)
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "records" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_records = ColumnFamilyDescriptor::new(CF_RECORDS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_records]).map_err(store_error)?;

        Ok(Self { db: Arc::new(db) })
    }

    fn records_cf(&self) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(CF_RECORDS)
            .ok_or_else(|| store_error("Records column family not found"))
    }
}

#[async_trait]
impl RecordStore for RocksDBStore {
    async fn put(&self, table: &str, record: StoredRecord) -> Result<()> {
        let cf = self.records_cf()?;
        let key = format!("{}{}", table_prefix(table), record.id);
        let value = serde_json::to_vec(&record).map_err(store_error)?;

        self.db.put_cf(cf, key, value).map_err(store_error)?;
        Ok(())
    }

    async fn get(&self, table: &str, id: &str) -> Result<Option<StoredRecord>> {
        let cf = self.records_cf()?;
        let key = format!("{}{}", table_prefix(table), id);

        match self.db.get_cf(cf, key).map_err(store_error)? {
            Some(bytes) => {
                let record = serde_json::from_slice(&bytes).map_err(store_error)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn scan(&self, table: &str) -> Result<Vec<StoredRecord>> {
        let cf = self.records_cf()?;
        let prefix = table_prefix(table);

        let mut records = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        for item in iter {
            let (key, value) = item.map_err(store_error)?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let record: StoredRecord = serde_json::from_slice(&value).map_err(store_error)?;
            records.push(record);
        }

        Ok(records)
    }
}
