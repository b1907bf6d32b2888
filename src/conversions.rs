use crate::types::FeatureType;

/// PostGIS typmod spelling of a geometry subtype, as in `geometry(LineString,4326)`.
#[inline]
pub(crate) fn geometry_type_to_str(geometry_type: wkb::reader::GeometryType) -> &'static str {
    match geometry_type {
        wkb::reader::GeometryType::GeometryCollection => "GeometryCollection",
        wkb::reader::GeometryType::Point => "Point",
        wkb::reader::GeometryType::LineString => "LineString",
        wkb::reader::GeometryType::Polygon => "Polygon",
        wkb::reader::GeometryType::MultiPoint => "MultiPoint",
        wkb::reader::GeometryType::MultiLineString => "MultiLineString",
        wkb::reader::GeometryType::MultiPolygon => "MultiPolygon",
        _ => "Geometry",
    }
}

/// Name of the prepared read statement a table of this type gets, if any.
#[inline]
pub(crate) fn read_statement_for(feature_type: FeatureType) -> Option<&'static str> {
    match feature_type {
        FeatureType::Point | FeatureType::UntaggedPoint => Some(crate::pg_sql::GET_POINT),
        FeatureType::LinearWay => Some(crate::pg_sql::GET_LINESTRING),
        FeatureType::PolygonWay | FeatureType::PolygonRelation | FeatureType::OtherRelation => {
            None
        }
    }
}
