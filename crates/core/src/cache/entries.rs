//! Store operations on the SQLite backend.
//!
//! Provides the `CacheStorage` implementation for `CacheDb`: opening named
//! stores, batch inserts and request lookups.

use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

use super::connection::CacheDb;
use super::storage::{CacheStorage, CachedEntry, ensure_storable};
use crate::Error;
use crate::message::{HeaderList, Request, Response};

/// One `entries` row in owned form, so it can cross into the database thread.
struct EntryRow {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    status_text: String,
    response_url: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(request: &Request, response: &Response) -> Result<Self, Error> {
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::InvalidInput(format!("failed to encode headers: {e}")))?;
        Ok(Self {
            key_hash: request.cache_key(),
            method: request.method.clone(),
            url: request.cache_url().to_string(),
            status: response.status,
            status_text: response.status_text.clone(),
            response_url: response.url.to_string(),
            headers_json,
            body: response.body.to_vec(),
        })
    }

    fn decode(self) -> Result<Response, Error> {
        tracing::trace!(method = %self.method, url = %self.url, "decoding stored entry");
        let url = Url::parse(&self.response_url)
            .map_err(|e| Error::CorruptEntry(format!("{}: response url: {e}", self.key_hash)))?;
        let headers: HeaderList = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("{}: headers: {e}", self.key_hash)))?;
        Ok(Response { status: self.status, status_text: self.status_text, url, headers, body: Bytes::from(self.body) })
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![name, now])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn cache_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM caches ORDER BY created_at ASC, rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<(), Error> {
        ensure_storable(&entries)?;

        let rows = entries
            .iter()
            .map(|(request, response)| EntryRow::encode(request, response))
            .collect::<Result<Vec<_>, _>>()?;
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        let count = rows.len();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute("INSERT OR IGNORE INTO caches (name, created_at) VALUES (?1, ?2)", params![name, now])?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO entries (
                        cache_name, key_hash, method, url, status, status_text,
                        response_url, headers_json, body, fetched_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(cache_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        response_url = excluded.response_url,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        fetched_at = excluded.fetched_at",
                    )?;
                    for row in &rows {
                        stmt.execute(params![
                            &name,
                            &row.key_hash,
                            &row.method,
                            &row.url,
                            row.status,
                            &row.status_text,
                            &row.response_url,
                            &row.headers_json,
                            &row.body,
                            &now,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(count, "stored entries");
        Ok(())
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        if !request.is_get() {
            return Ok(None);
        }

        let name = name.to_string();
        let key_hash = request.cache_key();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT key_hash, method, url, status, status_text, response_url, headers_json, body
                FROM entries WHERE cache_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![name, key_hash], |row| {
                    Ok(EntryRow {
                        key_hash: row.get(0)?,
                        method: row.get(1)?,
                        url: row.get(2)?,
                        status: row.get(3)?,
                        status_text: row.get(4)?,
                        response_url: row.get(5)?,
                        headers_json: row.get(6)?,
                        body: row.get(7)?,
                    })
                });

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    async fn entries(&self, name: &str) -> Result<Vec<CachedEntry>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CachedEntry>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT cache_name, key_hash, method, url, status, headers_json, length(body), fetched_at
                FROM entries WHERE cache_name = ?1 ORDER BY rowid ASC",
                )?;

                let rows = stmt
                    .query_map(params![name], |row| {
                        let headers_json: String = row.get(5)?;
                        let body_len: i64 = row.get(6)?;
                        Ok((
                            CachedEntry {
                                cache_name: row.get(0)?,
                                key_hash: row.get(1)?,
                                method: row.get(2)?,
                                url: row.get(3)?,
                                status: row.get(4)?,
                                content_type: None,
                                body_len: body_len as usize,
                                fetched_at: row.get(7)?,
                            },
                            headers_json,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(mut entry, headers_json)| -> Result<CachedEntry, Error> {
                        let headers: HeaderList = serde_json::from_str(&headers_json)
                            .map_err(|e| Error::CorruptEntry(format!("{}: headers: {e}", entry.key_hash)))?;
                        entry.content_type = headers
                            .into_iter()
                            .find(|(n, _)| n.eq_ignore_ascii_case("content-type"))
                            .map(|(_, v)| v);
                        Ok(entry)
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}
