use std::collections::HashMap;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::SinkExt;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::Type;
use tokio_postgres::{Client, CopyInSink, NoTls, Statement};

use crate::error::StoreDiagnostic;

/// First row of a read, one text value per column (`None` for `NULL`).
pub type TextRow = Vec<Option<String>>;

/// Synchronous call interface of a database connection, as driven by [`super::Table`].
///
/// Every call blocks until the store has answered. Prepared statements take
/// a single `bigint` parameter, the OSM ID.
pub trait Session {
    /// Run a statement which returns no rows.
    fn execute(&mut self, sql: &str) -> Result<(), StoreDiagnostic>;

    /// Prepare `sql` and register it under `name`.
    fn prepare(&mut self, name: &str, sql: &str) -> Result<(), StoreDiagnostic>;

    /// Run a prepared statement, returning the number of affected rows.
    fn execute_prepared(&mut self, name: &str, id: i64) -> Result<u64, StoreDiagnostic>;

    /// Run a prepared read, returning its first row if there is one.
    fn query_prepared(&mut self, name: &str, id: i64) -> Result<Option<TextRow>, StoreDiagnostic>;

    /// Send a `COPY ... FROM STDIN` command and enter COPY mode.
    fn copy_in(&mut self, sql: &str) -> Result<(), StoreDiagnostic>;

    /// Send copy data. On failure the session has left COPY mode.
    fn put_copy_data(&mut self, data: &[u8]) -> Result<(), StoreDiagnostic>;

    /// Signal the end of the copy data and wait for the store to acknowledge it.
    ///
    /// Returns the number of rows copied. The session has left COPY mode afterwards,
    /// whether this succeeded or not.
    fn put_copy_end(&mut self) -> Result<u64, StoreDiagnostic>;
}

/// [`Session`] backed by `tokio-postgres`.
///
/// The client runs on a private current-thread runtime. The connection is only
/// driven while a call is blocking on that runtime, so nothing happens between calls.
pub struct PgSession {
    // Field order is drop order: the copy sink and the statements go before the client.
    copy: Option<Pin<Box<CopyInSink<Bytes>>>>,
    statements: HashMap<String, Statement>,
    client: Client,
    runtime: Runtime,
}

impl PgSession {
    /// Connect using a libpq style connection string such as `dbname=osm host=localhost`.
    pub fn connect(params: &str) -> Result<Self, StoreDiagnostic> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| StoreDiagnostic(format!("cannot start driver runtime: {err}")))?;
        let (client, connection) = runtime.block_on(tokio_postgres::connect(params, NoTls))?;
        runtime.spawn(async move {
            if let Err(err) = connection.await {
                tracing::warn!("database connection closed with error: {err}");
            }
        });

        Ok(Self {
            copy: None,
            statements: HashMap::new(),
            client,
            runtime,
        })
    }

    fn statement(&self, name: &str) -> Result<&Statement, StoreDiagnostic> {
        self.statements.get(name).ok_or_else(|| {
            StoreDiagnostic(format!("prepared statement \"{name}\" does not exist"))
        })
    }
}

impl Session for PgSession {
    fn execute(&mut self, sql: &str) -> Result<(), StoreDiagnostic> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }

    fn prepare(&mut self, name: &str, sql: &str) -> Result<(), StoreDiagnostic> {
        let statement = self
            .runtime
            .block_on(self.client.prepare_typed(sql, &[Type::INT8]))?;
        self.statements.insert(name.to_string(), statement);
        Ok(())
    }

    fn execute_prepared(&mut self, name: &str, id: i64) -> Result<u64, StoreDiagnostic> {
        let statement = self.statement(name)?;
        Ok(self
            .runtime
            .block_on(self.client.execute(statement, &[&id]))?)
    }

    fn query_prepared(&mut self, name: &str, id: i64) -> Result<Option<TextRow>, StoreDiagnostic> {
        let statement = self.statement(name)?;
        let rows = self.runtime.block_on(self.client.query(statement, &[&id]))?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        let mut fields = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            fields.push(row.try_get::<_, Option<String>>(idx)?);
        }
        Ok(Some(fields))
    }

    fn copy_in(&mut self, sql: &str) -> Result<(), StoreDiagnostic> {
        let sink: CopyInSink<Bytes> = self.runtime.block_on(self.client.copy_in(sql))?;
        self.copy = Some(Box::pin(sink));
        Ok(())
    }

    fn put_copy_data(&mut self, data: &[u8]) -> Result<(), StoreDiagnostic> {
        let Some(sink) = self.copy.as_mut() else {
            return Err("no COPY in progress".into());
        };
        // `feed` leaves flushing to the sink's own buffering and to `finish`.
        let result = self
            .runtime
            .block_on(sink.feed(Bytes::copy_from_slice(data)));
        if let Err(err) = result {
            self.copy = None;
            return Err(err.into());
        }
        Ok(())
    }

    fn put_copy_end(&mut self) -> Result<u64, StoreDiagnostic> {
        let Some(mut sink) = self.copy.take() else {
            return Err("no COPY in progress".into());
        };
        Ok(self.runtime.block_on(sink.as_mut().finish())?)
    }
}
