//! Decoding of geometries read back from the store.
//!
//! Reads return the first row as text fields (see [`crate::TextRow`]). A missing
//! row or a `NULL` geometry decodes to `None`; a payload which cannot be parsed
//! is a [`DecodeError`].

use geo_traits::{CoordTrait, GeometryTrait, LineStringTrait};
use geo_types::Coord;
use wkb::reader::Wkb;

use crate::error::DecodeError;

/// Longitude/latitude of a node.
pub type Coordinate = Coord<f64>;

/// Builds the line geometries returned by [`decode_line`].
pub trait GeometryFactory {
    type LineString;

    fn line_string(&self, coords: Vec<Coordinate>) -> Self::LineString;
}

/// Factory producing [`geo_types::LineString`].
#[derive(Clone, Copy, Debug, Default)]
pub struct GeoTypesFactory;

impl GeometryFactory for GeoTypesFactory {
    type LineString = geo_types::LineString<f64>;

    fn line_string(&self, coords: Vec<Coordinate>) -> Self::LineString {
        geo_types::LineString::new(coords)
    }
}

/// Decode the `(x, y)` text fields of a point read.
pub fn decode_point(row: Option<&[Option<String>]>) -> Result<Option<Coordinate>, DecodeError> {
    let Some(row) = row else {
        return Ok(None);
    };
    if row.len() < 2 {
        return Err(DecodeError::MissingField {
            expected: 2,
            got: row.len(),
        });
    }
    let (Some(x), Some(y)) = (&row[0], &row[1]) else {
        return Ok(None);
    };

    Ok(Some(Coord {
        x: parse_number(x)?,
        y: parse_number(y)?,
    }))
}

/// Decode the hex encoded WKB field of a line read.
///
/// Returns `None` if the geometry is not a LineString.
pub fn decode_line<F>(
    row: Option<&[Option<String>]>,
    factory: &F,
) -> Result<Option<F::LineString>, DecodeError>
where
    F: GeometryFactory,
{
    let Some(row) = row else {
        return Ok(None);
    };
    let field = row.first().ok_or(DecodeError::MissingField {
        expected: 1,
        got: 0,
    })?;
    let Some(hex_wkb) = field else {
        return Ok(None);
    };

    let bytes = hex::decode(hex_wkb.trim())?;
    let wkb = Wkb::try_new(&bytes)?;
    match wkb.as_type() {
        geo_traits::GeometryType::LineString(line) => {
            let coords = line
                .coords()
                .map(|coord| Coord {
                    x: coord.x(),
                    y: coord.y(),
                })
                .collect();
            Ok(Some(factory.line_string(coords)))
        }
        _ => Ok(None),
    }
}

/// Encode a geometry as upper case hex EWKB carrying `srid`, the text form
/// PostGIS accepts for a geometry field in COPY.
pub fn to_hex_ewkb<G>(geometry: &G, srid: u32) -> Result<String, wkb::error::WkbError>
where
    G: GeometryTrait<T = f64>,
{
    let mut buf = Vec::new();
    wkb::writer::write_geometry(&mut buf, geometry, &Default::default())?;
    Ok(hex::encode_upper(with_srid(&buf, srid)))
}

const EWKB_SRID_FLAG: u32 = 0x2000_0000;

// Insert the SRID after the type word of the outermost geometry and flag it.
fn with_srid(wkb: &[u8], srid: u32) -> Vec<u8> {
    if wkb.len() < 5 {
        return wkb.to_vec();
    }
    let little_endian = wkb[0] == 1;
    let type_bytes = [wkb[1], wkb[2], wkb[3], wkb[4]];
    let (geometry_type, srid_bytes) = if little_endian {
        (u32::from_le_bytes(type_bytes), srid.to_le_bytes())
    } else {
        (u32::from_be_bytes(type_bytes), srid.to_be_bytes())
    };
    let flagged = geometry_type | EWKB_SRID_FLAG;

    let mut ewkb = Vec::with_capacity(wkb.len() + 4);
    ewkb.push(wkb[0]);
    if little_endian {
        ewkb.extend_from_slice(&flagged.to_le_bytes());
    } else {
        ewkb.extend_from_slice(&flagged.to_be_bytes());
    }
    ewkb.extend_from_slice(&srid_bytes);
    ewkb.extend_from_slice(&wkb[5..]);
    ewkb
}

fn parse_number(value: &str) -> Result<f64, DecodeError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|source| DecodeError::Number {
            value: value.to_string(),
            source,
        })
}
