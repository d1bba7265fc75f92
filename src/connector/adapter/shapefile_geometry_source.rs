use std::path::{Path, PathBuf};

use geo_types::{Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use shapefile::dbase::{self, FieldValue};
use shapefile::{PolygonRing, Shape};
use tracing::debug;
use wkt::ToWkt;

use crate::application::{attribute_table_path, GeometrySource};
use crate::domain::{DomainError, GeometryRecord};

pub const DEFAULT_ID_COLUMN: &str = "id";

/// Reads `(id, geometry)` rows from an ESRI shapefile and its `.dbf` table.
pub struct ShapefileGeometrySource {
    path: PathBuf,
    id_column: String,
}

impl ShapefileGeometrySource {
    /// Open `path`, checking that the attribute table has `id_column`.
    pub fn open(path: impl Into<PathBuf>, id_column: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        let id_column = id_column.into();

        let table = attribute_table_path(&path);
        let columns = read_column_names(&table)?;
        if !columns.iter().any(|c| c == &id_column) {
            return Err(DomainError::input_missing(format!(
                "Shapefile {} must have an '{}' column (found: {})",
                path.display(),
                id_column,
                columns.join(", ")
            )));
        }
        debug!("Shapefile columns: {:?}", columns);

        Ok(Self { path, id_column })
    }
}

impl GeometrySource for ShapefileGeometrySource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_all(&self) -> Result<Vec<GeometryRecord>, DomainError> {
        let mut reader = shapefile::Reader::from_path(&self.path).map_err(|e| {
            DomainError::invalid_input(format!(
                "Failed to open shapefile {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut records = Vec::new();
        for (index, row) in reader.iter_shapes_and_records().enumerate() {
            let row_number = index + 1;
            let (shape, record) = row.map_err(|e| {
                DomainError::invalid_input(format!("Failed to read row {}: {}", row_number, e))
            })?;

            let value = record.get(&self.id_column).ok_or_else(|| {
                DomainError::invalid_input(format!(
                    "Row {} has no '{}' value",
                    row_number, self.id_column
                ))
            })?;
            let id = parse_identifier(value).map_err(|reason| {
                DomainError::invalid_input(format!(
                    "Row {}: '{}' {}",
                    row_number, self.id_column, reason
                ))
            })?;

            let wkt = shape_to_wkt(&shape).map_err(|reason| {
                DomainError::invalid_input(format!("Row {} (id {}): {}", row_number, id, reason))
            })?;
            records.push(GeometryRecord::new(id, wkt));
        }

        Ok(records)
    }
}

fn read_column_names(table: &Path) -> Result<Vec<String>, DomainError> {
    let reader = dbase::Reader::from_path(table).map_err(|e| {
        DomainError::invalid_input(format!(
            "Failed to read attribute table {}: {}",
            table.display(),
            e
        ))
    })?;
    Ok(reader
        .fields()
        .iter()
        .map(|field| field.name().to_string())
        .collect())
}

/// Interpret an attribute value as an integer key.
///
/// dBase numeric columns are decimal text, so whole floats are accepted;
/// a fractional part is rejected rather than truncated.
fn parse_identifier(value: &FieldValue) -> Result<i64, String> {
    let whole = |f: f64| {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
            Ok(f as i64)
        } else {
            Err(format!("is not an integer: {}", f))
        }
    };

    match value {
        FieldValue::Integer(i) => Ok(i64::from(*i)),
        FieldValue::Numeric(Some(f)) | FieldValue::Double(f) => whole(*f),
        FieldValue::Float(Some(f)) => whole(f64::from(*f)),
        FieldValue::Character(Some(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("is not an integer: {:?}", s)),
        FieldValue::Numeric(None) | FieldValue::Float(None) | FieldValue::Character(None) => {
            Err("is empty".to_string())
        }
        other => Err(format!("has unsupported type: {:?}", other)),
    }
}

trait Xy {
    fn xy(&self) -> (f64, f64);
}

impl Xy for shapefile::Point {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Xy for shapefile::PointM {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Xy for shapefile::PointZ {
    fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

fn line_string<P: Xy>(points: &[P]) -> LineString<f64> {
    LineString::from(points.iter().map(Xy::xy).collect::<Vec<_>>())
}

/// Group rings into polygons: each outer ring starts a polygon and the
/// inner rings that follow it are its holes.
fn polygon_geometry<P: Xy>(rings: &[PolygonRing<P>]) -> Result<Geometry<f64>, String> {
    let mut polygons: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => polygons.push((line_string(points), Vec::new())),
            PolygonRing::Inner(points) => match polygons.last_mut() {
                Some((_, holes)) => holes.push(line_string(points)),
                None => return Err("inner ring precedes any outer ring".to_string()),
            },
        }
    }

    let mut polygons: Vec<Polygon<f64>> = polygons
        .into_iter()
        .map(|(exterior, holes)| Polygon::new(exterior, holes))
        .collect();

    match polygons.len() {
        0 => Err("polygon has no rings".to_string()),
        1 => Ok(Geometry::Polygon(polygons.remove(0))),
        _ => Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
    }
}

fn polyline_geometry<P: Xy>(parts: &[Vec<P>]) -> Geometry<f64> {
    if parts.len() == 1 {
        Geometry::LineString(line_string(&parts[0]))
    } else {
        Geometry::MultiLineString(MultiLineString::new(
            parts.iter().map(|part| line_string(part)).collect(),
        ))
    }
}

fn multipoint_geometry<P: Xy>(points: &[P]) -> Geometry<f64> {
    Geometry::MultiPoint(MultiPoint::from(
        points
            .iter()
            .map(|p| geo_types::Point::from(p.xy()))
            .collect::<Vec<_>>(),
    ))
}

fn point_geometry<P: Xy>(point: &P) -> Geometry<f64> {
    Geometry::Point(geo_types::Point::from(point.xy()))
}

/// WKT for a shape; `None` for null shapes. Measures and elevations are
/// dropped, the store holds planar geometry.
pub fn shape_to_wkt(shape: &Shape) -> Result<Option<String>, String> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Polygon(p) => polygon_geometry(p.rings())?,
        Shape::PolygonM(p) => polygon_geometry(p.rings())?,
        Shape::PolygonZ(p) => polygon_geometry(p.rings())?,
        Shape::Polyline(l) => polyline_geometry(l.parts()),
        Shape::PolylineM(l) => polyline_geometry(l.parts()),
        Shape::PolylineZ(l) => polyline_geometry(l.parts()),
        Shape::Point(p) => point_geometry(p),
        Shape::PointM(p) => point_geometry(p),
        Shape::PointZ(p) => point_geometry(p),
        Shape::Multipoint(m) => multipoint_geometry(m.points()),
        Shape::MultipointM(m) => multipoint_geometry(m.points()),
        Shape::MultipointZ(m) => multipoint_geometry(m.points()),
        Shape::Multipatch(_) => return Err("multipatch shapes are not supported".to_string()),
    };
    Ok(Some(geometry.wkt_string()))
}

#[cfg(test)]
mod tests {
    use shapefile::Point;

    use super::*;

    fn ring(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|(x, y)| Point::new(*x, *y)).collect()
    }

    #[test]
    fn null_shape_has_no_wkt() {
        assert_eq!(shape_to_wkt(&Shape::NullShape).unwrap(), None);
    }

    #[test]
    fn single_outer_ring_is_a_polygon() {
        let rings = vec![PolygonRing::Outer(ring(&[
            (0.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (0.0, 0.0),
        ]))];
        let wkt = polygon_geometry(&rings).unwrap().wkt_string();
        assert!(wkt.starts_with("POLYGON"), "{wkt}");
        assert!(wkt.contains("0 1"), "{wkt}");
    }

    #[test]
    fn holes_attach_to_preceding_outer_ring() {
        let rings = vec![
            PolygonRing::Outer(ring(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0)])),
            PolygonRing::Inner(ring(&[(2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 4.0), (2.0, 2.0)])),
        ];
        match polygon_geometry(&rings).unwrap() {
            Geometry::Polygon(polygon) => assert_eq!(polygon.interiors().len(), 1),
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn several_outer_rings_make_a_multipolygon() {
        let rings = vec![
            PolygonRing::Outer(ring(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (0.0, 0.0)])),
            PolygonRing::Outer(ring(&[(5.0, 5.0), (5.0, 6.0), (6.0, 6.0), (5.0, 5.0)])),
        ];
        let wkt = polygon_geometry(&rings).unwrap().wkt_string();
        assert!(wkt.starts_with("MULTIPOLYGON"), "{wkt}");
    }

    #[test]
    fn leading_inner_ring_is_rejected() {
        let rings = vec![PolygonRing::Inner(ring(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))];
        assert!(polygon_geometry(&rings).is_err());
    }

    #[test]
    fn identifiers_accept_whole_numbers_only() {
        assert_eq!(parse_identifier(&FieldValue::Numeric(Some(930101.0))), Ok(930101));
        assert_eq!(parse_identifier(&FieldValue::Integer(7)), Ok(7));
        assert_eq!(
            parse_identifier(&FieldValue::Character(Some(" 42 ".to_string()))),
            Ok(42)
        );
        assert!(parse_identifier(&FieldValue::Numeric(Some(1.5))).is_err());
        assert!(parse_identifier(&FieldValue::Numeric(None)).is_err());
        assert!(parse_identifier(&FieldValue::Character(Some("abc".to_string()))).is_err());
        assert!(parse_identifier(&FieldValue::Logical(Some(true))).is_err());
    }
}
