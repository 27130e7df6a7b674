//! Path exporters: write a decoded path as a command sequence for the
//! supported instrument control systems.

use std::io::{self, Write};

use geo_types::Coord;

use std::f64::consts::PI;

/// Visitor turning a path vertex sequence into driver commands, one line
/// per vertex. Vertices are `(a4, a2)`; `in_rad` marks radian input, the
/// output is always degrees.
pub trait PathExporter {
    fn export<W: Write>(&self, writer: &mut W, path: &[Coord<f64>], in_rad: bool) -> io::Result<()>;
}

fn to_deg(vert: Coord<f64>, in_rad: bool) -> (f64, f64) {
    if in_rad {
        (vert.x / PI * 180., vert.y / PI * 180.)
    } else {
        (vert.x, vert.y)
    }
}

/// Two plain columns, `a4 a2`.
pub struct PathExporterRaw;

impl PathExporter for PathExporterRaw {
    fn export<W: Write>(&self, writer: &mut W, path: &[Coord<f64>], in_rad: bool) -> io::Result<()> {
        writeln!(writer, "# a4 a2")?;
        for &vert in path {
            let (a4, a2) = to_deg(vert, in_rad);
            writeln!(writer, "{a4:.6} {a2:.6}")?;
        }
        Ok(())
    }
}

/// Nomad driver commands.
pub struct PathExporterNomad;

impl PathExporter for PathExporterNomad {
    fn export<W: Write>(&self, writer: &mut W, path: &[Coord<f64>], in_rad: bool) -> io::Result<()> {
        for &vert in path {
            let (a4, a2) = to_deg(vert, in_rad);
            writeln!(writer, "dr a4 {a4:.6} a2 {a2:.6}")?;
        }
        Ok(())
    }
}

/// Nicos script commands.
pub struct PathExporterNicos;

impl PathExporter for PathExporterNicos {
    fn export<W: Write>(&self, writer: &mut W, path: &[Coord<f64>], in_rad: bool) -> io::Result<()> {
        for &vert in path {
            let (a4, a2) = to_deg(vert, in_rad);
            writeln!(writer, "stt({a4:.6}); mtt({a2:.6});")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use geo_types::coord;

    fn sample_path() -> Vec<Coord<f64>> {
        vec![coord! { x: 60.0, y: 90.0 }, coord! { x: -60.0, y: 90.0 }]
    }

    #[test]
    fn raw_export() {
        let mut out = vec![];
        PathExporterRaw
            .export(&mut out, &sample_path(), false)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("60.000000 90.000000"));
        assert!(text.contains("-60.000000 90.000000"));
    }

    #[test]
    fn nomad_export() {
        let mut out = vec![];
        PathExporterNomad
            .export(&mut out, &sample_path(), false)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "dr a4 60.000000 a2 90.000000"
        );
    }

    #[test]
    fn nicos_export_converts_radians() {
        let path = vec![coord! { x: PI / 3.0, y: PI / 2.0 }];
        let mut out = vec![];
        PathExporterNicos.export(&mut out, &path, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.trim(), "stt(60.000000); mtt(90.000000);");
    }
}
