//! Reader for the XML instrument description.
//!
//! The file carries a `<paths>` root with an `ident` attribute, an optional
//! `<variables>` block whose `${name}` entries are substituted into the
//! document before parsing, and the `<instrument_space>` tree with floor,
//! walls and the three instrument axes. All angles in the file are degrees.

use std::error::Error;
use std::f64::consts::PI;
use std::fmt;

use serde::Deserialize;

use super::geometry::Geometry;
use super::space::InstrumentSpace;
use super::{AxisAngle, AXIS_ANA, AXIS_MONO, AXIS_SAMPLE};

/// Identifier an instrument file has to carry in its root attribute.
pub const INSTRUMENT_FILE_IDENT: &str = "taspaths_instrument";

/// Instrument-description parsing failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The document is not well-formed or misses required keys.
    Malformed(String),
    /// The root identifier attribute does not match.
    WrongIdent(String),
    /// A numeric field could not be parsed.
    BadNumber(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Malformed(msg) => write!(f, "malformed instrument file: {msg}"),
            ConfigError::WrongIdent(ident) => {
                write!(f, "invalid instrument file identifier: {ident:?}")
            }
            ConfigError::BadNumber(field) => write!(f, "cannot parse number in {field:?}"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Deserialize)]
struct PathsFileXml {
    ident: String,
    timestamp: Option<f64>,
    variables: Option<VariablesXml>,
    instrument_space: Option<InstrumentSpaceXml>,
}

#[derive(Debug, Default, Deserialize)]
struct VariablesXml {
    #[serde(rename = "var", default)]
    vars: Vec<VarXml>,
}

#[derive(Debug, Deserialize)]
struct VarXml {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct InstrumentSpaceXml {
    floor: Option<FloorXml>,
    walls: Option<WallsXml>,
    instrument: InstrumentXml,
}

#[derive(Debug, Deserialize)]
struct FloorXml {
    len_x: f64,
    len_y: f64,
}

#[derive(Debug, Default, Deserialize)]
struct WallsXml {
    #[serde(rename = "wall", default)]
    walls: Vec<WallXml>,
}

#[derive(Debug, Deserialize)]
struct WallXml {
    #[serde(default)]
    id: String,
    geometry: GeometryXml,
}

#[derive(Debug, Default, Deserialize)]
struct GeometryXml {
    #[serde(rename = "box", default)]
    boxes: Vec<BoxXml>,
    #[serde(rename = "cylinder", default)]
    cylinders: Vec<CylinderXml>,
    #[serde(rename = "sphere", default)]
    spheres: Vec<SphereXml>,
}

#[derive(Debug, Deserialize)]
struct BoxXml {
    #[serde(default)]
    id: String,
    pos: String,
    #[serde(default)]
    rot: f64,
    length: f64,
    depth: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct CylinderXml {
    #[serde(default)]
    id: String,
    pos: String,
    radius: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct SphereXml {
    #[serde(default)]
    id: String,
    pos: String,
    radius: f64,
}

#[derive(Debug, Default, Deserialize)]
struct AxisXml {
    pos: Option<String>,
    angle_in: Option<f64>,
    angle_internal: Option<f64>,
    angle_out: Option<f64>,
    angle_in_lower: Option<f64>,
    angle_in_upper: Option<f64>,
    angle_internal_lower: Option<f64>,
    angle_internal_upper: Option<f64>,
    angle_out_lower: Option<f64>,
    angle_out_upper: Option<f64>,
    angle_in_speed: Option<f64>,
    angle_internal_speed: Option<f64>,
    angle_out_speed: Option<f64>,
    geometry_in: Option<GeometryXml>,
    geometry_internal: Option<GeometryXml>,
    geometry_out: Option<GeometryXml>,
}

#[derive(Debug, Deserialize)]
struct InstrumentXml {
    monochromator: AxisXml,
    sample: AxisXml,
    analyser: AxisXml,
}

fn deg_to_rad(deg: f64) -> f64 {
    deg / 180. * PI
}

/// Parse a comma-or-whitespace separated coordinate triple; shorter inputs
/// are zero-padded.
fn parse_triple(text: &str, field: &str) -> Result<[f64; 3], ConfigError> {
    let mut triple = [0.; 3];
    let mut count = 0;

    for token in text.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
        if token.is_empty() {
            continue;
        }
        if count >= 3 {
            break;
        }
        triple[count] = token
            .parse::<f64>()
            .map_err(|_| ConfigError::BadNumber(field.to_owned()))?;
        count += 1;
    }

    Ok(triple)
}

fn build_geometries(xml: &GeometryXml, fallback_id: &str) -> Result<Vec<Geometry>, ConfigError> {
    let mut out = vec![];

    for b in &xml.boxes {
        out.push(Geometry::Box {
            id: if b.id.is_empty() {
                fallback_id.to_owned()
            } else {
                b.id.clone()
            },
            pos: parse_triple(&b.pos, "box.pos")?,
            rot: deg_to_rad(b.rot),
            length: b.length,
            depth: b.depth,
            height: b.height,
        });
    }
    for c in &xml.cylinders {
        out.push(Geometry::Cylinder {
            id: if c.id.is_empty() {
                fallback_id.to_owned()
            } else {
                c.id.clone()
            },
            pos: parse_triple(&c.pos, "cylinder.pos")?,
            radius: c.radius,
            height: c.height,
        });
    }
    for s in &xml.spheres {
        out.push(Geometry::Sphere {
            id: if s.id.is_empty() {
                fallback_id.to_owned()
            } else {
                s.id.clone()
            },
            pos: parse_triple(&s.pos, "sphere.pos")?,
            radius: s.radius,
        });
    }

    Ok(out)
}

fn apply_axis(
    space: &mut InstrumentSpace,
    axis_idx: usize,
    xml: &AxisXml,
    axis_id: &str,
) -> Result<(), ConfigError> {
    let instr = space.instrument_mut();

    if let Some(pos) = &xml.pos {
        instr
            .axis_mut(axis_idx)
            .set_pos(parse_triple(pos, "axis.pos")?);
    }

    let angles = [
        (AxisAngle::Incoming, xml.angle_in),
        (AxisAngle::Internal, xml.angle_internal),
        (AxisAngle::Outgoing, xml.angle_out),
    ];
    for (which, angle) in angles {
        if let Some(deg) = angle {
            instr.set_axis_angle(axis_idx, which, deg_to_rad(deg));
        }
    }

    let limits = [
        (AxisAngle::Incoming, xml.angle_in_lower, xml.angle_in_upper),
        (
            AxisAngle::Internal,
            xml.angle_internal_lower,
            xml.angle_internal_upper,
        ),
        (AxisAngle::Outgoing, xml.angle_out_lower, xml.angle_out_upper),
    ];
    for (which, lower, upper) in limits {
        let mut lim = instr.axis(axis_idx).limits(which);
        if let Some(deg) = lower {
            lim.lower = deg_to_rad(deg);
        }
        if let Some(deg) = upper {
            lim.upper = deg_to_rad(deg);
        }
        instr.axis_mut(axis_idx).set_limits(which, lim);
    }

    let speeds = [
        (AxisAngle::Incoming, xml.angle_in_speed),
        (AxisAngle::Internal, xml.angle_internal_speed),
        (AxisAngle::Outgoing, xml.angle_out_speed),
    ];
    for (which, speed) in speeds {
        if let Some(speed) = speed {
            instr.axis_mut(axis_idx).set_speed(which, deg_to_rad(speed));
        }
    }

    let geos = [
        (AxisAngle::Incoming, &xml.geometry_in),
        (AxisAngle::Internal, &xml.geometry_internal),
        (AxisAngle::Outgoing, &xml.geometry_out),
    ];
    for (which, geo) in geos {
        if let Some(geo) = geo {
            let comps = build_geometries(geo, axis_id)?;
            instr.axis_mut(axis_idx).comps_mut(which).extend(comps);
        }
    }

    Ok(())
}

/// Load an instrument space from an XML instrument description.
///
/// Returns the instrument space and the file's timestamp, if any.
pub fn load_instrument_space(xml_text: &str) -> Result<(InstrumentSpace, Option<f64>), ConfigError> {
    // first pass: pull out the variables block
    let probe: PathsFileXml = serde_xml_rs::from_str(xml_text)
        .map_err(|err| ConfigError::Malformed(err.to_string()))?;

    if probe.ident != INSTRUMENT_FILE_IDENT {
        return Err(ConfigError::WrongIdent(probe.ident));
    }

    // substitute `${name}` occurrences and reparse
    let has_vars = probe
        .variables
        .as_ref()
        .is_some_and(|vars| !vars.vars.is_empty());
    let parsed = if has_vars {
        let mut substituted = xml_text.to_owned();
        for var in &probe.variables.as_ref().unwrap().vars {
            substituted = substituted.replace(&format!("${{{}}}", var.name), &var.value);
        }
        serde_xml_rs::from_str(&substituted)
            .map_err(|err| ConfigError::Malformed(err.to_string()))?
    } else {
        probe
    };

    let Some(space_xml) = &parsed.instrument_space else {
        return Err(ConfigError::Malformed(
            "no instrument_space definition found".into(),
        ));
    };

    let mut space = InstrumentSpace::new();

    if let Some(floor) = &space_xml.floor {
        space.set_floor_len(floor.len_x, floor.len_y);
    }

    if let Some(walls) = &space_xml.walls {
        for (idx, wall) in walls.walls.iter().enumerate() {
            let id = if wall.id.is_empty() {
                format!("wall {}", idx + 1)
            } else {
                wall.id.clone()
            };
            for geo in build_geometries(&wall.geometry, &id)? {
                space.add_wall(geo, &id);
            }
        }
    }

    apply_axis(
        &mut space,
        AXIS_MONO,
        &space_xml.instrument.monochromator,
        "monochromator",
    )?;
    apply_axis(&mut space, AXIS_SAMPLE, &space_xml.instrument.sample, "sample")?;
    apply_axis(&mut space, AXIS_ANA, &space_xml.instrument.analyser, "analyser")?;

    Ok((space, parsed.timestamp))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_FILE: &str = r#"
<paths ident="taspaths_instrument">
    <timestamp>1688386800</timestamp>
    <variables>
        <var name="wall_thickness" value="0.2"/>
    </variables>
    <instrument_space>
        <floor>
            <len_x>10</len_x>
            <len_y>12</len_y>
        </floor>
        <walls>
            <wall id="north wall">
                <geometry>
                    <box>
                        <pos>0, 2, 0</pos>
                        <length>10</length>
                        <depth>${wall_thickness}</depth>
                        <height>1</height>
                    </box>
                </geometry>
            </wall>
        </walls>
        <instrument>
            <monochromator>
                <pos>0 0 0</pos>
                <angle_out>90</angle_out>
                <angle_out_lower>10</angle_out_lower>
                <angle_out_upper>170</angle_out_upper>
                <angle_out_speed>2</angle_out_speed>
                <geometry_internal>
                    <cylinder>
                        <pos>0 0 0</pos>
                        <radius>0.5</radius>
                        <height>1</height>
                    </cylinder>
                </geometry_internal>
            </monochromator>
            <sample>
                <pos>2 0 0</pos>
                <angle_out>60</angle_out>
            </sample>
            <analyser>
                <pos>1.5 0 0</pos>
            </analyser>
        </instrument>
    </instrument_space>
</paths>
"#;

    #[test]
    fn full_file() {
        let (space, timestamp) = load_instrument_space(SAMPLE_FILE).unwrap();

        assert_relative_eq!(space.floor_len_x(), 10.);
        assert_relative_eq!(space.floor_len_y(), 12.);
        assert_relative_eq!(timestamp.unwrap(), 1688386800.);

        // the variable got substituted into the wall depth
        assert_eq!(space.walls().len(), 1);
        let Geometry::Box { depth, id, .. } = &space.walls()[0] else {
            panic!("expected a box wall");
        };
        assert_relative_eq!(*depth, 0.2);
        assert_eq!(id, "north wall");

        let instr = space.instrument();
        assert_relative_eq!(
            instr.monochromator().angle(AxisAngle::Outgoing),
            PI / 2.,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            instr.monochromator().limits(AxisAngle::Outgoing).lower,
            deg_to_rad(10.)
        );
        assert_relative_eq!(
            instr.monochromator().speed(AxisAngle::Outgoing),
            deg_to_rad(2.)
        );
        assert_eq!(instr.monochromator().comps(AxisAngle::Internal).len(), 1);
        assert_relative_eq!(instr.sample().pos()[0], 2.);
    }

    #[test]
    fn wrong_ident_is_rejected() {
        let text = SAMPLE_FILE.replace("taspaths_instrument", "somebody_else");
        assert!(matches!(
            load_instrument_space(&text),
            Err(ConfigError::WrongIdent(_))
        ));
    }

    #[test]
    fn triples_accept_mixed_separators() {
        assert_eq!(parse_triple("1, 2 3", "t").unwrap(), [1., 2., 3.]);
        assert_eq!(parse_triple("4;5", "t").unwrap(), [4., 5., 0.]);
        assert!(parse_triple("a b c", "t").is_err());
    }
}
