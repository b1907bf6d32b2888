// Statements sent by `Table`. Table and column names come from `Columns` and
// the caller, they are not quoted.

use crate::columns::{GEOMETRY_COLUMN, ID_COLUMN};

/// Prepared statement deleting one object by its OSM ID.
pub const DELETE_STATEMENT: &str = "delete_statement";
/// Prepared statement reading the coordinates of a node.
pub const GET_POINT: &str = "get_point";
/// Prepared statement reading the geometry of a way as hex encoded WKB.
pub const GET_LINESTRING: &str = "get_linestring";

pub(crate) const SQL_BEGIN: &str = "BEGIN";
pub(crate) const SQL_COMMIT: &str = "COMMIT";

pub(crate) fn sql_create_table(table_name: &str, column_defs: &str) -> String {
    format!("CREATE TABLE {table_name} ({column_defs})")
}

pub(crate) fn sql_copy_from_stdin(table_name: &str, column_names: &str) -> String {
    format!("COPY {table_name} ({column_names}) FROM STDIN")
}

pub(crate) fn sql_delete_by_id(table_name: &str) -> String {
    format!("DELETE FROM {table_name} WHERE {ID_COLUMN} = $1")
}

// Coordinates travel as text so that the codec sees what the store printed.
pub(crate) fn sql_get_point(table_name: &str) -> String {
    format!(
        "SELECT ST_X({GEOMETRY_COLUMN})::text, ST_Y({GEOMETRY_COLUMN})::text \
         FROM {table_name} WHERE {ID_COLUMN} = $1"
    )
}

pub(crate) fn sql_get_linestring(table_name: &str) -> String {
    format!(
        "SELECT encode(ST_AsBinary({GEOMETRY_COLUMN}), 'hex') \
         FROM {table_name} WHERE {ID_COLUMN} = $1"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_statements() {
        assert_eq!(
            sql_copy_from_stdin("nodes", "osm_id,geom"),
            "COPY nodes (osm_id,geom) FROM STDIN"
        );
        assert_eq!(
            sql_delete_by_id("nodes"),
            "DELETE FROM nodes WHERE osm_id = $1"
        );
        assert_eq!(
            sql_get_point("nodes"),
            "SELECT ST_X(geom)::text, ST_Y(geom)::text FROM nodes WHERE osm_id = $1"
        );
        assert_eq!(
            sql_get_linestring("ways"),
            "SELECT encode(ST_AsBinary(geom), 'hex') FROM ways WHERE osm_id = $1"
        );
    }
}
