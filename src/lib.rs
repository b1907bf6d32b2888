//! Per-table PostgreSQL/PostGIS access layer for bulk loading OpenStreetMap data.
//!
//! ## Overview
//!
//! - `Table` owns one database connection and drives it through transactions,
//!   COPY mode, ad-hoc statements, prepared deletes and geometry reads.
//! - `Columns` describes the columns of a table, derived from the feature type
//!   and the `FeatureFlags` of the import.
//! - `CopyLine` builds one escaped row of COPY text.
//! - `decode_point` and `decode_line` turn the values returned by reads into
//!   coordinates and line geometries.
//!
//! A `Table` knows whether its connection is in a transaction, in COPY mode or
//! both (see `ConnectionState`). Operations which are not allowed in the
//! current state fail with `DriverError::ProtocolState` before anything is sent
//! to the database. Everything the database rejects is reported as
//! `DriverError::Query` with the diagnostic of the server.
//!
//! ## Loading
//!
//! ```no_run
//! use geo_types::Point;
//! use postgres_drivers::{Columns, Config, CopyLine, FeatureType, SRID, Table, to_hex_ewkb};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         database_name: "osm".to_string(),
//!         ..Default::default()
//!     };
//!     let columns = Columns::new(&config.flags, FeatureType::Point);
//!     let mut table = Table::connect("nodes", &config, columns)?;
//!
//!     table.send_begin()?;
//!     table.start_copy()?;
//!     let mut line = CopyLine::new();
//!     line.int(1)
//!         .hstore([("amenity", "bench")])
//!         .raw(&to_hex_ewkb(&Point::new(8.68, 50.11), SRID)?);
//!     table.send_line(&line.finish())?;
//!     table.end_copy()?;
//!
//!     // A COMMIT which keeps the work done so far if a later step fails.
//!     table.intermediate_commit()?;
//!     table.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Updating
//!
//! Applying a diff deletes the old version of an object before the new one is
//! copied. Geometries of untouched nodes and ways are read back to rebuild the
//! objects referencing them:
//!
//! ```no_run
//! use postgres_drivers::{Columns, Config, FeatureType, GeoTypesFactory, Table};
//!
//! # fn main() -> postgres_drivers::Result<()> {
//! let config = Config::default();
//! let mut ways = Table::connect(
//!     "ways",
//!     &config,
//!     Columns::new(&config.flags, FeatureType::LinearWay),
//! )?;
//!
//! ways.send_begin()?;
//! ways.delete_from_list([17, 18])?;
//! if let Some(line) = ways.get_linestring(19, &GeoTypesFactory)? {
//!     println!("way 19 has {} nodes", line.0.len());
//! }
//! ways.commit()?;
//! # Ok(())
//! # }
//! ```
//!
//! Dropping a `Table` ends an open COPY and commits an open transaction.
//! Failures during drop are only logged with `tracing`; call `Table::close`
//! to handle them.
mod columns;
mod conversions;
mod copy_line;
mod error;
mod escape;
mod geometry;
mod pg_sql;
mod table;
mod types;

pub use columns::{Columns, GEOMETRY_COLUMN, ID_COLUMN};
pub use copy_line::CopyLine;
pub use error::{DecodeError, DriverError, ProtocolViolation, Result, StoreDiagnostic};
pub use escape::{escape_copy_text, escape_hstore};
pub use geometry::{
    Coordinate, GeoTypesFactory, GeometryFactory, decode_line, decode_point, to_hex_ewkb,
};
pub use pg_sql::{DELETE_STATEMENT, GET_LINESTRING, GET_POINT};
pub use table::{ConnectionState, PgSession, Session, Table, TextRow};
pub use types::{
    Column, ColumnType, Config, FeatureFlags, FeatureType, MetadataFields, SRID,
};

pub use wkb::reader::GeometryType;
