use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wkb::reader::GeometryType;

/// Spatial reference of every geometry column.
pub const SRID: u32 = 4326;

/// Kind of OSM objects a table holds.
///
/// The kinds do not follow the OGC simple features: a node with tags and a
/// node without tags are both points, but they end up in different tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// nodes with tags
    Point,
    /// nodes without tags
    UntaggedPoint,
    /// ways
    LinearWay,
    /// ways which are polygons
    PolygonWay,
    /// relations which are multipolygons
    PolygonRelation,
    /// other relations
    OtherRelation,
}

impl FeatureType {
    /// Geometry subtype of the `geom` column.
    pub fn geometry_type(self) -> GeometryType {
        match self {
            Self::Point | Self::UntaggedPoint => GeometryType::Point,
            Self::LinearWay => GeometryType::LineString,
            Self::PolygonWay | Self::PolygonRelation => GeometryType::MultiPolygon,
            Self::OtherRelation => GeometryType::GeometryCollection,
        }
    }

    /// Whether the table can carry a tags column at all.
    pub fn has_tags(self) -> bool {
        !matches!(self, Self::UntaggedPoint)
    }
}

/// Selection of OSM object metadata written into their own columns.
///
/// The text form follows the osmium metadata options: `none`, `all`, or field
/// names joined with `+` (`user+uid+version+timestamp+changeset`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataFields {
    pub user: bool,
    pub uid: bool,
    pub version: bool,
    pub timestamp: bool,
    pub changeset: bool,
}

impl MetadataFields {
    pub const fn none() -> Self {
        Self {
            user: false,
            uid: false,
            version: false,
            timestamp: false,
            changeset: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            user: true,
            uid: true,
            version: true,
            timestamp: true,
            changeset: true,
        }
    }

    pub fn any(&self) -> bool {
        self.user || self.uid || self.version || self.timestamp || self.changeset
    }

    pub fn is_all(&self) -> bool {
        self.user && self.uid && self.version && self.timestamp && self.changeset
    }

    fn names(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.user, "user"),
            (self.uid, "uid"),
            (self.version, "version"),
            (self.timestamp, "timestamp"),
            (self.changeset, "changeset"),
        ]
        .into_iter()
        .filter_map(|(enabled, name)| enabled.then_some(name))
    }
}

impl FromStr for MetadataFields {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("none") || s.is_empty() {
            return Ok(Self::none());
        }
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }

        let mut fields = Self::none();
        for name in s.split('+') {
            match name.trim() {
                "user" => fields.user = true,
                "uid" => fields.uid = true,
                "version" => fields.version = true,
                "timestamp" => fields.timestamp = true,
                "changeset" => fields.changeset = true,
                other => return Err(format!("unknown metadata field: {other:?}")),
            }
        }
        Ok(fields)
    }
}

impl fmt::Display for MetadataFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            return f.write_str("all");
        }
        if !self.any() {
            return f.write_str("none");
        }
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join("+"))
    }
}

impl TryFrom<String> for MetadataFields {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MetadataFields> for String {
    fn from(value: MetadataFields) -> Self {
        value.to_string()
    }
}

/// Which optional columns the tables carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Store tags in an `hstore` column.
    pub tags_hstore: bool,
    /// Import metadata of OSM objects. This increases the size of the database a lot.
    pub metadata: MetadataFields,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            tags_hstore: true,
            metadata: MetadataFields::none(),
        }
    }
}

/// Immutable configuration handed to [`crate::Columns`] and [`crate::Table`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the database to connect to.
    pub database_name: String,
    /// Further libpq `key=value` words (host, port, user, ...).
    pub connection_options: Option<String>,
    pub flags: FeatureFlags,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_name: "pgimportertest".to_string(),
            connection_options: None,
            flags: FeatureFlags::default(),
        }
    }
}

impl Config {
    /// Connection string for the driver, `dbname=<name>` plus the extra options.
    pub fn connection_params(&self) -> String {
        let mut params = format!("dbname={}", self.database_name);
        if let Some(options) = self
            .connection_options
            .as_deref()
            .map(str::trim)
            .filter(|options| !options.is_empty())
        {
            params.push(' ');
            params.push_str(options);
        }
        params
    }
}

/// SQL type of a column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnType {
    BigInt,
    Integer,
    Text,
    HStore,
    /// `char(n)`
    Char(u16),
    BigIntArray,
    CharArray,
    /// `geometry(<subtype>,4326)`
    Geometry(GeometryType),
    /// Any type name supplied by the caller, used verbatim.
    Other(String),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BigInt => f.write_str("bigint"),
            Self::Integer => f.write_str("integer"),
            Self::Text => f.write_str("text"),
            Self::HStore => f.write_str("hstore"),
            Self::Char(n) => write!(f, "char({n})"),
            Self::BigIntArray => f.write_str("bigint[]"),
            Self::CharArray => f.write_str("char[]"),
            Self::Geometry(geometry_type) => write!(
                f,
                "geometry({},{SRID})",
                crate::conversions::geometry_type_to_str(*geometry_type)
            ),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Name and type of a single table column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self.column_type, ColumnType::Geometry(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnType, Config, FeatureFlags, FeatureType, MetadataFields};
    use wkb::reader::GeometryType;

    #[test]
    fn parses_metadata_options() {
        assert_eq!("none".parse::<MetadataFields>(), Ok(MetadataFields::none()));
        assert_eq!("all".parse::<MetadataFields>(), Ok(MetadataFields::all()));

        let fields: MetadataFields = "user+version".parse().expect("valid options");
        assert!(fields.user);
        assert!(fields.version);
        assert!(!fields.uid);
        assert!(!fields.timestamp);
        assert!(!fields.changeset);
        assert_eq!(fields.to_string(), "user+version");

        let err = "user+colour".parse::<MetadataFields>().expect_err("unknown field");
        assert!(err.contains("colour"));
    }

    #[test]
    fn renders_column_types() {
        assert_eq!(ColumnType::Char(23).to_string(), "char(23)");
        assert_eq!(
            ColumnType::Geometry(GeometryType::MultiPolygon).to_string(),
            "geometry(MultiPolygon,4326)"
        );
        assert_eq!(ColumnType::Other("real".into()).to_string(), "real");
    }

    #[test]
    fn builds_connection_params() {
        let mut config = Config {
            database_name: "osm".to_string(),
            ..Default::default()
        };
        assert_eq!(config.connection_params(), "dbname=osm");

        config.connection_options = Some("host=localhost port=5433".to_string());
        assert_eq!(
            config.connection_params(),
            "dbname=osm host=localhost port=5433"
        );
    }

    #[test]
    fn deserializes_config_with_defaults() -> Result<(), serde_json::Error> {
        let config: Config = serde_json::from_str(
            r#"{"database_name": "planet", "flags": {"metadata": "user+uid"}}"#,
        )?;
        assert_eq!(config.database_name, "planet");
        assert!(config.flags.tags_hstore);
        assert!(config.flags.metadata.user);
        assert!(config.flags.metadata.uid);
        assert!(!config.flags.metadata.version);

        let default_flags: FeatureFlags = serde_json::from_str("{}")?;
        assert_eq!(default_flags, FeatureFlags::default());
        Ok(())
    }

    #[test]
    fn untagged_points_have_no_tags() {
        assert!(!FeatureType::UntaggedPoint.has_tags());
        assert!(FeatureType::Point.has_tags());
        assert_eq!(FeatureType::LinearWay.geometry_type(), GeometryType::LineString);
    }
}
