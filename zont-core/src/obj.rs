/// Wavefront OBJ loader for the `v` / `f` subset
///
/// Faces are resolved against the vertex table as they are read, producing a
/// flat stream of triangle vertices (three entries per face). Only the first
/// three indices of a face are used; polygons are not fan-triangulated.
use nalgebra::Point3;
use nom::{
    bytes::complete::is_not,
    character::complete::{char, i64 as parse_i64, space1},
    combinator::{all_consuming, opt, rest},
    multi::many0,
    number::complete::double,
    sequence::{pair, preceded, terminated},
    IResult,
};
use std::fs;
use std::path::Path;

use crate::error::{LoadError, ParseWarning};
use crate::geometry::Mesh;

/// Result of parsing OBJ text: the flat triangle-vertex stream plus any
/// non-fatal warnings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedObj {
    /// Resolved face vertices; the length is always a multiple of 3.
    pub stream: Vec<Point3<f64>>,
    /// Number of `v` lines accepted.
    pub vertex_count: usize,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedObj {
    pub fn triangle_count(&self) -> usize {
        self.stream.len() / 3
    }

    pub fn into_mesh(self) -> LoadedMesh {
        LoadedMesh {
            mesh: Mesh::from_vertex_stream(&self.stream),
            warnings: self.warnings,
        }
    }
}

/// A mesh ready for rendering, with the warnings collected while loading it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedMesh {
    pub mesh: Mesh,
    pub warnings: Vec<ParseWarning>,
}

/// Load a mesh file from disk.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<LoadedMesh, LoadError> {
    let parsed = load_obj(path)?;
    Ok(parsed.into_mesh())
}

/// Read and parse an OBJ file into its flat triangle-vertex stream.
pub fn load_obj(path: impl AsRef<Path>) -> Result<ParsedObj, LoadError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&data);
    let parsed = parse_obj(&text);

    tracing::info!(
        path = %path.display(),
        vertices = parsed.vertex_count,
        triangles = parsed.triangle_count(),
        warnings = parsed.warnings.len(),
        "loaded mesh"
    );
    for warning in &parsed.warnings {
        tracing::warn!(path = %path.display(), "{}", warning);
    }

    Ok(parsed)
}

/// Parse OBJ text.
pub fn parse_obj(input: &str) -> ParsedObj {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut parsed = ParsedObj::default();

    for (number, raw) in input.lines().enumerate() {
        let line_number = number + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Ok((_, (keyword, args))) = parse_statement(line) else {
            continue;
        };

        match keyword {
            "v" => {
                if let Some(vertex) = parse_vertex(&args, line_number, &mut parsed.warnings) {
                    vertices.push(vertex);
                }
            }
            "f" => {
                if let Some(face) = parse_face(&args, &vertices, line_number, &mut parsed.warnings)
                {
                    parsed.stream.extend(face);
                }
            }
            _ => {}
        }
    }

    parsed.vertex_count = vertices.len();
    parsed
}

/// Split a trimmed line into its keyword and whitespace-separated arguments.
fn parse_statement(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    pair(is_not(" \t"), many0(preceded(space1, is_not(" \t"))))(input)
}

fn parse_vertex(
    args: &[&str],
    line: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<Point3<f64>> {
    if args.len() < 3 {
        return None;
    }

    let mut coords = [0.0; 3];
    for (coord, token) in coords.iter_mut().zip(args) {
        match parse_coordinate(token) {
            Some(value) => *coord = value,
            None => warnings.push(ParseWarning::new(
                line,
                format!("malformed vertex coordinate {token:?}, using 0.0"),
            )),
        }
    }

    Some(Point3::new(coords[0], coords[1], coords[2]))
}

fn parse_face(
    args: &[&str],
    vertices: &[Point3<f64>],
    line: usize,
    warnings: &mut Vec<ParseWarning>,
) -> Option<[Point3<f64>; 3]> {
    if args.len() < 3 {
        return None;
    }
    if args.len() > 3 {
        tracing::debug!(line, indices = args.len(), "polygon face truncated to a triangle");
    }

    let mut face = [Point3::origin(); 3];
    for (slot, token) in face.iter_mut().zip(args) {
        let Some(index) = parse_face_index(token) else {
            warnings.push(ParseWarning::new(
                line,
                format!("malformed face index {token:?}, face dropped"),
            ));
            return None;
        };
        let Some(resolved) = resolve_index(index, vertices.len()) else {
            warnings.push(ParseWarning::new(
                line,
                format!(
                    "face index {index} out of range for {} vertices, face dropped",
                    vertices.len()
                ),
            ));
            return None;
        };
        *slot = vertices[resolved];
    }

    Some(face)
}

fn parse_coordinate(token: &str) -> Option<f64> {
    coordinate(token).ok().map(|(_, value)| value)
}

fn parse_face_index(token: &str) -> Option<i64> {
    face_index(token).ok().map(|(_, index)| index)
}

fn coordinate(input: &str) -> IResult<&str, f64> {
    all_consuming(double)(input)
}

/// Position part of an `i`, `i/t`, `i//n` or `i/t/n` face token.
fn face_index(input: &str) -> IResult<&str, i64> {
    all_consuming(terminated(parse_i64, opt(preceded(char('/'), rest))))(input)
}

/// Map a 1-based or negative-relative OBJ index onto the vertex table.
fn resolve_index(index: i64, vertex_count: usize) -> Option<usize> {
    let resolved = if index < 0 {
        vertex_count as i64 + index
    } else {
        index - 1
    };
    if resolved >= 0 && (resolved as usize) < vertex_count {
        Some(resolved as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TRIANGLE: &str = "\
# unit triangle
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    #[test]
    fn test_parse_single_triangle_in_file_order() {
        let parsed = parse_obj(TRIANGLE);
        assert_eq!(parsed.vertex_count, 3);
        assert_eq!(
            parsed.stream,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ]
        );
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_negative_indices_count_from_the_end() {
        let relative = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -1 -2 -3\n");
        let absolute = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 3 2 1\n");
        assert_eq!(relative.stream, absolute.stream);
    }

    #[test]
    fn test_negative_indices_resolve_at_face_time() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3 -2 -1\nv 9 9 9\n");
        assert_eq!(parsed.stream[2], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_slash_tokens_use_position_index() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1/4/7 2//8 3/6\n");
        assert_eq!(parsed.triangle_count(), 1);
        assert_eq!(parsed.stream[1], Point3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_polygon_face_uses_first_three_indices() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n");
        assert_eq!(parsed.triangle_count(), 1);
        assert_eq!(parsed.stream[2], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_out_of_range_face_is_dropped_with_warning() {
        let parsed = parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\nf 0 1 2\nf 1 2 3\n");
        assert_eq!(parsed.triangle_count(), 1);
        assert_eq!(parsed.warnings.len(), 2);
        assert_eq!(parsed.warnings[0].line, 4);
        assert_eq!(parsed.stream.len() % 3, 0);
    }

    #[test]
    fn test_malformed_coordinate_becomes_zero() {
        let parsed = parse_obj("v 1.5 abc -2\n");
        assert_eq!(parsed.vertex_count, 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].message.contains("abc"));

        let with_face = parse_obj("v 1.5 abc -2\nv 0 0 0\nv 0 0 1\nf 1 2 3\n");
        assert_eq!(with_face.stream[0], Point3::new(1.5, 0.0, -2.0));
    }

    #[test]
    fn test_ignores_other_statements() {
        let parsed = parse_obj("o thing\nvn 0 0 1\nvt 0 0\ns off\nv 1 2 3\nv 1\n\n   \n");
        assert_eq!(parsed.vertex_count, 1);
        assert!(parsed.stream.is_empty());
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_tabs_and_padding_are_whitespace() {
        let parsed = parse_obj("  v\t0 0 0  \nv 1\t0 0\r\nv 0 1 0\nf 1\t2 3\n");
        assert_eq!(parsed.triangle_count(), 1);
    }

    #[test]
    fn test_load_mesh_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TRIANGLE.as_bytes()).unwrap();

        let loaded = load_mesh(file.path()).unwrap();
        assert_eq!(loaded.mesh.len(), 1);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.obj");
        let err = load_mesh(&missing).unwrap_err();
        assert!(matches!(err, LoadError::Io { ref path, .. } if *path == missing));
    }
}
