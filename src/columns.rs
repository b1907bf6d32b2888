//! Column layout of the tables, derived from the feature type and the feature flags.

use crate::types::{Column, ColumnType, FeatureFlags, FeatureType};

/// Name of the identifier column, the first column of every table.
pub const ID_COLUMN: &str = "osm_id";
/// Name of the geometry column.
pub const GEOMETRY_COLUMN: &str = "geom";

/// Names and types of the columns of a database table.
///
/// The order of the columns is the order of the `CREATE TABLE` statement and the
/// order of the fields of every line sent in COPY mode.
#[derive(Clone, Debug, PartialEq)]
pub struct Columns {
    columns: Vec<Column>,
    feature_type: FeatureType,
}

impl Columns {
    pub fn new(flags: &FeatureFlags, feature_type: FeatureType) -> Self {
        let mut columns = vec![Column::new(ID_COLUMN, ColumnType::BigInt)];
        if flags.tags_hstore && feature_type.has_tags() {
            columns.push(Column::new("tags", ColumnType::HStore));
        }

        let metadata = &flags.metadata;
        if metadata.user {
            columns.push(Column::new("osm_user", ColumnType::Text));
        }
        if metadata.uid {
            columns.push(Column::new("osm_uid", ColumnType::BigInt));
        }
        if metadata.version {
            columns.push(Column::new("osm_version", ColumnType::Integer));
        }
        if metadata.timestamp {
            columns.push(Column::new("osm_lastmodified", ColumnType::Char(23)));
        }
        if metadata.changeset {
            columns.push(Column::new("osm_changeset", ColumnType::BigInt));
        }

        columns.push(Column::new(
            GEOMETRY_COLUMN,
            ColumnType::Geometry(feature_type.geometry_type()),
        ));
        match feature_type {
            FeatureType::Point | FeatureType::UntaggedPoint | FeatureType::PolygonRelation => {}
            FeatureType::LinearWay | FeatureType::PolygonWay => {
                columns.push(Column::new("way_nodes", ColumnType::BigIntArray));
            }
            FeatureType::OtherRelation => {
                columns.push(Column::new("member_ids", ColumnType::BigIntArray));
                columns.push(Column::new("member_types", ColumnType::CharArray));
            }
        }

        Self {
            columns,
            feature_type,
        }
    }

    /// Same as [`Columns::new`] with caller-defined columns appended in the given order.
    pub fn with_additional<I>(flags: &FeatureFlags, feature_type: FeatureType, additional: I) -> Self
    where
        I: IntoIterator<Item = Column>,
    {
        let mut columns = Self::new(flags, feature_type);
        columns.columns.extend(additional);
        columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    /// Number of columns of this table.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false, a table has at least its identifier and geometry column.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn front(&self) -> &Column {
        &self.columns[0]
    }

    pub fn back(&self) -> &Column {
        &self.columns[self.columns.len() - 1]
    }

    pub fn get(&self, n: usize) -> Option<&Column> {
        self.columns.get(n)
    }

    /// Name of the n-th (0 is first) column.
    pub fn column_name_at(&self, n: usize) -> Option<&str> {
        self.columns.get(n).map(|column| column.name.as_str())
    }

    /// Type of the n-th (0 is first) column.
    pub fn column_type_at(&self, n: usize) -> Option<&ColumnType> {
        self.columns.get(n).map(|column| &column.column_type)
    }

    pub fn feature_type(&self) -> FeatureType {
        self.feature_type
    }

    /// Position of the geometry column, first column is 0.
    pub fn geometry_column_index(&self) -> usize {
        // Extra columns are appended after the generated ones, so the first
        // geometry column is always the one added by `new`.
        self.columns
            .iter()
            .position(Column::is_geometry)
            .unwrap_or(self.columns.len() - 1)
    }

    /// Column names joined with `,` in table order.
    pub fn names_csv(&self) -> String {
        self.columns
            .iter()
            .map(|column| column.name.as_str())
            .collect::<Vec<&str>>()
            .join(",")
    }

    /// The `CREATE TABLE` statement implied by this layout.
    pub fn create_table_sql(&self, table_name: &str) -> String {
        let column_defs = self
            .columns
            .iter()
            .map(|column| format!("{} {}", column.name, column.column_type))
            .collect::<Vec<String>>()
            .join(", ");
        crate::pg_sql::sql_create_table(table_name, &column_defs)
    }
}

impl<'a> IntoIterator for &'a Columns {
    type Item = &'a Column;
    type IntoIter = std::slice::Iter<'a, Column>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Columns;
    use crate::types::{Column, ColumnType, FeatureFlags, FeatureType, MetadataFields};
    use wkb::reader::GeometryType;

    const ALL_TYPES: [FeatureType; 6] = [
        FeatureType::Point,
        FeatureType::UntaggedPoint,
        FeatureType::LinearWay,
        FeatureType::PolygonWay,
        FeatureType::PolygonRelation,
        FeatureType::OtherRelation,
    ];

    fn names(columns: &Columns) -> Vec<&str> {
        columns.iter().map(|column| column.name.as_str()).collect()
    }

    fn flag_combinations() -> Vec<FeatureFlags> {
        let mut result = Vec::new();
        for tags_hstore in [false, true] {
            for bits in 0u8..32 {
                result.push(FeatureFlags {
                    tags_hstore,
                    metadata: MetadataFields {
                        user: bits & 1 != 0,
                        uid: bits & 2 != 0,
                        version: bits & 4 != 0,
                        timestamp: bits & 8 != 0,
                        changeset: bits & 16 != 0,
                    },
                });
            }
        }
        result
    }

    #[test]
    fn point_with_all_metadata() {
        let flags = FeatureFlags {
            tags_hstore: true,
            metadata: MetadataFields::all(),
        };
        let columns = Columns::new(&flags, FeatureType::Point);
        assert_eq!(
            names(&columns),
            vec![
                "osm_id",
                "tags",
                "osm_user",
                "osm_uid",
                "osm_version",
                "osm_lastmodified",
                "osm_changeset",
                "geom"
            ]
        );
        assert_eq!(columns.column_type_at(1), Some(&ColumnType::HStore));
        assert_eq!(columns.column_type_at(5), Some(&ColumnType::Char(23)));
        assert_eq!(
            columns.back().column_type.to_string(),
            "geometry(Point,4326)"
        );
    }

    #[test]
    fn untagged_points_never_get_tags() {
        for flags in flag_combinations() {
            let columns = Columns::new(&flags, FeatureType::UntaggedPoint);
            assert!(columns.iter().all(|column| column.name != "tags"));
            assert!(
                columns
                    .iter()
                    .all(|column| column.column_type != ColumnType::HStore)
            );
        }
    }

    #[test]
    fn tags_follow_the_flag_for_other_types() {
        for feature_type in ALL_TYPES
            .into_iter()
            .filter(|t| *t != FeatureType::UntaggedPoint)
        {
            let with_tags = Columns::new(&FeatureFlags::default(), feature_type);
            assert_eq!(with_tags.column_name_at(1), Some("tags"));

            let flags = FeatureFlags {
                tags_hstore: false,
                ..Default::default()
            };
            let without_tags = Columns::new(&flags, feature_type);
            assert!(without_tags.iter().all(|column| column.name != "tags"));
        }
    }

    #[test]
    fn exactly_one_geometry_column_first_is_id() {
        for flags in flag_combinations() {
            for feature_type in ALL_TYPES {
                let columns = Columns::new(&flags, feature_type);
                assert_eq!(columns.front().name, "osm_id");
                assert_eq!(columns.front().column_type, ColumnType::BigInt);
                assert_eq!(columns.iter().filter(|c| c.is_geometry()).count(), 1);
                assert_eq!(
                    columns.get(columns.geometry_column_index()).map(|c| c.name.as_str()),
                    Some("geom")
                );
                // deterministic
                assert_eq!(columns, Columns::new(&flags, feature_type));
            }
        }
    }

    #[test]
    fn auxiliary_columns_per_type() {
        let flags = FeatureFlags {
            tags_hstore: false,
            metadata: MetadataFields::none(),
        };
        assert_eq!(
            names(&Columns::new(&flags, FeatureType::LinearWay)),
            vec!["osm_id", "geom", "way_nodes"]
        );
        assert_eq!(
            names(&Columns::new(&flags, FeatureType::PolygonWay)),
            vec!["osm_id", "geom", "way_nodes"]
        );
        assert_eq!(
            names(&Columns::new(&flags, FeatureType::PolygonRelation)),
            vec!["osm_id", "geom"]
        );

        let other = Columns::new(&flags, FeatureType::OtherRelation);
        assert_eq!(names(&other), vec!["osm_id", "geom", "member_ids", "member_types"]);
        assert_eq!(
            other.column_type_at(1),
            Some(&ColumnType::Geometry(GeometryType::GeometryCollection))
        );
        assert_eq!(other.column_type_at(3), Some(&ColumnType::CharArray));
    }

    #[test]
    fn additional_columns_are_appended_in_order() {
        let extra = vec![
            Column::new("name", ColumnType::Text),
            Column::new("area", ColumnType::Other("real".to_string())),
        ];
        let columns =
            Columns::with_additional(&FeatureFlags::default(), FeatureType::PolygonWay, extra);
        assert_eq!(
            names(&columns),
            vec!["osm_id", "tags", "geom", "way_nodes", "name", "area"]
        );
        assert_eq!(columns.geometry_column_index(), 2);
        assert_eq!(columns.len(), 6);
    }

    #[test]
    fn renders_create_table() {
        let flags = FeatureFlags {
            tags_hstore: true,
            metadata: "user".parse().expect("metadata"),
        };
        let columns = Columns::new(&flags, FeatureType::LinearWay);
        assert_eq!(columns.names_csv(), "osm_id,tags,osm_user,geom,way_nodes");
        assert_eq!(
            columns.create_table_sql("ways"),
            "CREATE TABLE ways (osm_id bigint, tags hstore, osm_user text, \
             geom geometry(LineString,4326), way_nodes bigint[])"
        );
    }
}
