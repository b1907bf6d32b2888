use crate::columns::Columns;
use crate::conversions::read_statement_for;
use crate::error::{DriverError, ProtocolViolation, Result};
use crate::geometry::{Coordinate, GeometryFactory, decode_line, decode_point};
use crate::pg_sql::{
    DELETE_STATEMENT, GET_LINESTRING, GET_POINT, SQL_BEGIN, SQL_COMMIT, sql_copy_from_stdin,
    sql_delete_by_id, sql_get_linestring, sql_get_point,
};
use crate::types::Config;

use super::session::{PgSession, Session, TextRow};
use super::state::{ConnectionState, Transition};

/// One database table and the connection used to access it.
///
/// There is one connection per table, therefore this type is called `Table`
/// and not `Connection`. A table is used by one caller at a time; parallel
/// loads use one `Table` per worker.
///
/// Dropping a table ends an open COPY and commits an open transaction. Use
/// [`Table::close`] to see whether that worked; `Drop` only logs failures.
pub struct Table<S: Session = PgSession> {
    name: String,
    columns: Columns,
    state: ConnectionState,
    /// `None` for a detached table.
    session: Option<S>,
    lines_sent: u64,
}

impl Table<PgSession> {
    /// Connect to the database named in `config` and prepare the statements of this table.
    pub fn connect(table_name: &str, config: &Config, columns: Columns) -> Result<Self> {
        let session = PgSession::connect(&config.connection_params()).map_err(|err| {
            DriverError::Connection {
                database: config.database_name.clone(),
                message: err.0,
            }
        })?;
        tracing::debug!(
            table = table_name,
            database = %config.database_name,
            "connected to database"
        );
        Self::with_session(table_name, columns, session)
    }

    /// A table without database connection, for testing. Every operation is a
    /// no-op and reads find nothing.
    pub fn detached(columns: Columns) -> Self {
        Self {
            name: String::new(),
            columns,
            state: ConnectionState::Idle,
            session: None,
            lines_sent: 0,
        }
    }
}

impl<S: Session> Table<S> {
    /// Use an already established session and prepare the statements of this table.
    pub fn with_session(table_name: &str, columns: Columns, session: S) -> Result<Self> {
        let mut table = Self {
            name: table_name.to_string(),
            columns,
            state: ConnectionState::Idle,
            session: Some(session),
            lines_sent: 0,
        };
        table.create_prepared_statements()?;
        Ok(table)
    }

    /// Name of the database table.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column definitions.
    pub fn columns(&self) -> &Columns {
        &self.columns
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Is the database connection in COPY mode or not?
    pub fn is_copy_mode(&self) -> bool {
        self.state.in_copy()
    }

    pub fn is_detached(&self) -> bool {
        self.session.is_none()
    }

    // The delete statement always exists, the read statement depends on the table type.
    fn create_prepared_statements(&mut self) -> Result<()> {
        self.create_prepared_statement(DELETE_STATEMENT, &sql_delete_by_id(&self.name))?;
        match read_statement_for(self.columns.feature_type()) {
            Some(GET_POINT) => {
                self.create_prepared_statement(GET_POINT, &sql_get_point(&self.name))
            }
            Some(GET_LINESTRING) => {
                self.create_prepared_statement(GET_LINESTRING, &sql_get_linestring(&self.name))
            }
            _ => Ok(()),
        }
    }

    /// Create a prepared statement taking the OSM ID as its only parameter.
    pub fn create_prepared_statement(&mut self, name: &str, query: &str) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        self.state
            .after(Transition::Query)
            .map_err(|violation| DriverError::protocol(query, violation))?;
        session
            .prepare(name, query)
            .map_err(|err| DriverError::Prepare {
                name: name.to_string(),
                statement: query.to_string(),
                message: err.0,
            })?;
        tracing::debug!(table = %self.name, statement = name, "prepared statement");
        Ok(())
    }

    /// Run a statement registered with [`Table::create_prepared_statement`] for one
    /// OSM ID, returning the number of affected rows.
    pub fn execute_prepared(&mut self, name: &str, id: i64) -> Result<u64> {
        let Some(session) = self.session.as_mut() else {
            return Ok(0);
        };
        let operation = || format!("{name}({id}) on {}", self.name);
        self.state
            .after(Transition::Query)
            .map_err(|violation| DriverError::protocol(operation(), violation))?;
        session
            .execute_prepared(name, id)
            .map_err(|err| DriverError::query(operation(), err))
    }

    /// Send `BEGIN`.
    ///
    /// Use it to wrap everything sent to this table in a single transaction.
    pub fn send_begin(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let next = self
            .state
            .after(Transition::Begin)
            .map_err(|violation| DriverError::protocol(SQL_BEGIN, violation))?;
        session
            .execute(SQL_BEGIN)
            .map_err(|err| DriverError::query(SQL_BEGIN, err))?;
        self.state = next;
        Ok(())
    }

    /// Send `COMMIT`.
    pub fn commit(&mut self) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        self.state
            .after(Transition::Commit)
            .map_err(|violation| DriverError::protocol(SQL_COMMIT, violation))?;
        let result = session.execute(SQL_COMMIT);
        // A failed COMMIT still ends the transaction block.
        self.state = self.state.without_transaction();
        result.map_err(|err| DriverError::query(SQL_COMMIT, err))
    }

    /// Send `COMMIT` after checking that a transaction is open and no COPY is running.
    pub fn intermediate_commit(&mut self) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        self.state
            .after(Transition::IntermediateCommit)
            .map_err(|violation| DriverError::protocol("intermediate COMMIT", violation))?;
        self.commit()
    }

    /// Send any SQL statement which returns no rows, `INSERT`, `DELETE` or DDL for example.
    pub fn send_query(&mut self, query: &str) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        self.state
            .after(Transition::Query)
            .map_err(|violation| DriverError::protocol(query, violation))?;
        session
            .execute(query)
            .map_err(|err| DriverError::query(query, err))
    }

    /// Enter COPY mode with the columns of this table, in column order.
    pub fn start_copy(&mut self) -> Result<()> {
        let copy_command = sql_copy_from_stdin(&self.name, &self.columns.names_csv());
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let next = self
            .state
            .after(Transition::StartCopy)
            .map_err(|violation| DriverError::protocol(&copy_command, violation))?;
        session
            .copy_in(&copy_command)
            .map_err(|err| DriverError::query(&copy_command, err))?;
        self.state = next;
        self.lines_sent = 0;
        tracing::debug!(table = %self.name, "started COPY");
        Ok(())
    }

    /// Send a line to the database during COPY mode.
    ///
    /// The line has to end with `\n`. Several rows may be sent at once, separated by `\n`.
    /// Fields must already be escaped, see [`crate::CopyLine`].
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let operation = || format!("insertion via COPY into {} {line:?}", self.name);
        self.state
            .after(Transition::CopyData)
            .map_err(|violation| DriverError::protocol(operation(), violation))?;
        if !line.ends_with('\n') {
            return Err(DriverError::protocol(
                operation(),
                ProtocolViolation::MissingLineTerminator,
            ));
        }
        if let Err(err) = session.put_copy_data(line.as_bytes()) {
            self.state = self.state.without_copy();
            return Err(DriverError::query(operation(), err));
        }
        self.lines_sent += 1;
        Ok(())
    }

    /// Leave COPY mode, returning the number of rows the database copied.
    pub fn end_copy(&mut self) -> Result<u64> {
        let Some(session) = self.session.as_mut() else {
            return Ok(0);
        };
        self.state
            .after(Transition::EndCopy)
            .map_err(|violation| DriverError::protocol("COPY END", violation))?;
        let result = session.put_copy_end();
        self.state = self.state.without_copy();
        let rows = result
            .map_err(|err| DriverError::query(format!("COPY END into {}", self.name), err))?;
        tracing::debug!(
            table = %self.name,
            lines = self.lines_sent,
            rows,
            "finished COPY"
        );
        Ok(rows)
    }

    /// Delete the object with the given OSM ID.
    pub fn delete_object(&mut self, id: i64) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let operation = || format!("deleting object {id} from {}", self.name);
        self.state
            .after(Transition::Query)
            .map_err(|violation| DriverError::protocol(operation(), violation))?;
        session
            .execute_prepared(DELETE_STATEMENT, id)
            .map_err(|err| DriverError::query(operation(), err))?;
        Ok(())
    }

    /// Delete all objects with the given OSM IDs, one after another.
    ///
    /// Stops at the first failure. Objects deleted before it stay deleted unless
    /// the caller wrapped the call in a transaction.
    pub fn delete_from_list<I>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = i64>,
    {
        if self.session.is_none() {
            return Ok(());
        }
        self.state
            .after(Transition::Query)
            .map_err(|violation| {
                DriverError::protocol(format!("deleting objects from {}", self.name), violation)
            })?;
        for id in ids {
            self.delete_object(id)?;
        }
        Ok(())
    }

    /// Longitude and latitude of a node, `None` if there is no such node.
    pub fn get_point(&mut self, id: i64) -> Result<Option<Coordinate>> {
        let row = self.read(GET_POINT, id)?;
        Ok(decode_point(row.as_deref())?)
    }

    /// Geometry of a way, `None` if there is no such way or it is not a LineString.
    pub fn get_linestring<F>(&mut self, id: i64, factory: &F) -> Result<Option<F::LineString>>
    where
        F: GeometryFactory,
    {
        let row = self.read(GET_LINESTRING, id)?;
        Ok(decode_line(row.as_deref(), factory)?)
    }

    fn read(&mut self, statement: &'static str, id: i64) -> Result<Option<TextRow>> {
        let Some(session) = self.session.as_mut() else {
            return Ok(None);
        };
        let operation = || format!("{statement} for object {id} from {}", self.name);
        self.state
            .after(Transition::Query)
            .map_err(|violation| DriverError::protocol(operation(), violation))?;
        if read_statement_for(self.columns.feature_type()) != Some(statement) {
            return Err(DriverError::protocol(
                operation(),
                ProtocolViolation::StatementNotPrepared(statement),
            ));
        }
        session
            .query_prepared(statement, id)
            .map_err(|err| DriverError::query(operation(), err))
    }

    /// End an open COPY and commit an open transaction.
    ///
    /// Both steps are attempted; the first failure is returned.
    fn finish(&mut self) -> Result<()> {
        let mut result = Ok(());
        if self.state.in_copy() {
            result = self.end_copy().map(|_| ());
        }
        if self.state.in_transaction() {
            let commit = self.commit();
            if result.is_ok() {
                result = commit;
            }
        }
        result
    }

    /// Finish open work and release the connection.
    pub fn close(mut self) -> Result<()> {
        let result = self.finish();
        self.session = None;
        result
    }
}

impl<S: Session> Drop for Table<S> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            tracing::warn!(table = %self.name, "closing table failed: {err}");
        }
    }
}
