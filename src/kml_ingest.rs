use crate::text;
use crate::trip_data::{BoundingBox, LatLng, Route, TripData, Waypoint};
use anyhow::Result;
use quick_xml::escape::{self, EscapeError};
use quick_xml::events::{BytesText, Event};
use quick_xml::Reader;
use std::{fs, path::Path};

pub const DEFAULT_PLACEMARK_NAME: &str = "Sin nombre";

enum Node {
    /// `Folder` or `Document`, indexing into `container_names`.
    Container(usize),
    Placemark,
    Point,
    LineString,
    Other,
}

enum TextSlot {
    ContainerName(usize),
    PlacemarkName,
    Description,
    PointCoordinates,
    LineCoordinates,
}

struct RawPlacemark {
    // enclosing containers, outermost first
    ancestors: Vec<usize>,
    name: Option<String>,
    description: Option<String>,
    point: Option<String>,
    line: Option<String>,
}

#[derive(Default)]
struct KmlScanner {
    stack: Vec<Node>,
    container_names: Vec<Option<String>>,
    current: Option<RawPlacemark>,
    placemarks: Vec<RawPlacemark>,
}

impl KmlScanner {
    fn open(&mut self, tag: &[u8]) {
        let node = match tag {
            b"Folder" | b"Document" => {
                self.container_names.push(None);
                Node::Container(self.container_names.len() - 1)
            }
            // placemarks do not nest in KML, an inner one is treated as noise
            b"Placemark" if self.current.is_none() => {
                let ancestors = self
                    .stack
                    .iter()
                    .filter_map(|node| match node {
                        Node::Container(idx) => Some(*idx),
                        _ => None,
                    })
                    .collect();
                self.current = Some(RawPlacemark {
                    ancestors,
                    name: None,
                    description: None,
                    point: None,
                    line: None,
                });
                Node::Placemark
            }
            b"Point" => Node::Point,
            b"LineString" => Node::LineString,
            _ => Node::Other,
        };
        self.stack.push(node);
    }

    fn close(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(Node::Placemark) => {
                if let Some(placemark) = self.current.take() {
                    self.placemarks.push(placemark);
                }
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(anyhow!("unbalanced closing tag")),
        }
    }

    fn text_slot(&self, tag: &[u8]) -> Option<TextSlot> {
        let in_placemark = self.current.is_some();
        match (tag, self.stack.last()?) {
            (b"name", Node::Container(idx)) => Some(TextSlot::ContainerName(*idx)),
            (b"name", Node::Placemark) => Some(TextSlot::PlacemarkName),
            (b"description", Node::Placemark) => Some(TextSlot::Description),
            (b"coordinates", Node::Point) if in_placemark => Some(TextSlot::PointCoordinates),
            (b"coordinates", Node::LineString) if in_placemark => {
                Some(TextSlot::LineCoordinates)
            }
            _ => None,
        }
    }

    // First occurrence wins for every slot.
    fn fill(&mut self, slot: TextSlot, text: String) {
        if let TextSlot::ContainerName(idx) = slot {
            self.container_names[idx].get_or_insert(text);
            return;
        }
        let Some(placemark) = self.current.as_mut() else {
            return;
        };
        let target = match slot {
            TextSlot::PlacemarkName => &mut placemark.name,
            TextSlot::Description => &mut placemark.description,
            TextSlot::PointCoordinates => &mut placemark.point,
            TextSlot::LineCoordinates => &mut placemark.line,
            TextSlot::ContainerName(_) => return,
        };
        target.get_or_insert(text);
    }

    fn resolve_day(&self, placemark: &RawPlacemark) -> u32 {
        placemark
            .ancestors
            .iter()
            .rev()
            .filter_map(|idx| self.container_names[*idx].as_deref())
            .find_map(text::day_from_label)
            .unwrap_or(0)
    }
}

fn resolve_entity(name: &str) -> Option<&'static str> {
    escape::resolve_xml_entity(name).or_else(|| escape::resolve_html5_entity(name))
}

/// Resolves XML and HTML5 entities. Entities neither set knows are kept as
/// written instead of spoiling the rest of the text.
fn unescape_lenient(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;
    loop {
        match escape::unescape_with(rest, resolve_entity) {
            Ok(unescaped) => {
                text.push_str(&unescaped);
                return text;
            }
            // `name` spans the entity name, between `&` and `;`
            Err(EscapeError::UnrecognizedEntity(name, _)) => {
                let entity_start = name.start - 1;
                // everything before the first unknown entity decodes cleanly
                match escape::unescape_with(&rest[..entity_start], resolve_entity) {
                    Ok(prefix) => text.push_str(&prefix),
                    Err(_) => text.push_str(&rest[..entity_start]),
                }
                text.push_str(&rest[entity_start..=name.end]);
                rest = &rest[name.end + 1..];
            }
            Err(e) => {
                warn!("keeping undecodable text verbatim: {e}");
                text.push_str(rest);
                return text;
            }
        }
    }
}

fn unescape_text(e: &BytesText) -> String {
    unescape_lenient(&String::from_utf8_lossy(e))
}

/// Reads everything up to the end tag of the element that was just opened,
/// concatenating text and CDATA of all nested nodes.
fn read_text_content(reader: &mut Reader<&[u8]>) -> Result<String> {
    let mut text = String::new();
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) if depth == 0 => return Ok(text),
            Event::End(_) => depth -= 1,
            Event::Text(e) => text.push_str(&unescape_text(&e)),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => bail!("unexpected end of document inside a text element"),
            _ => {}
        }
    }
}

fn parse_tuple(tuple: &str) -> Option<LatLng> {
    let fields: Vec<&str> = tuple.split(',').map(str::trim).collect();
    // lon,lat[,alt]; altitude is ignored
    if !(2..=3).contains(&fields.len()) {
        return None;
    }
    let longitude = fields[0].parse::<f64>().ok()?;
    let latitude = fields[1].parse::<f64>().ok()?;
    LatLng::new(latitude, longitude)
}

/// Parses a single KML `lon,lat[,alt]` coordinate.
pub fn parse_point(text: &str) -> Option<LatLng> {
    parse_tuple(text.trim())
}

/// Parses a whitespace separated list of KML coordinates. Any malformed
/// tuple invalidates the whole line, as does a line with fewer than two points.
pub fn parse_line(text: &str) -> Option<Vec<LatLng>> {
    let points = text
        .split_whitespace()
        .map(parse_tuple)
        .collect::<Option<Vec<_>>>()?;
    if points.len() < 2 {
        None
    } else {
        Some(points)
    }
}

/// Parses a KML document into waypoints and routes. The second element holds
/// the warnings for records that were dropped, if any.
pub fn parse_kml(xml: &str) -> Result<(TripData, Option<String>)> {
    let mut reader = Reader::from_str(xml);
    let mut scanner = KmlScanner::default();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| anyhow!("malformed KML at byte {}: {e}", reader.buffer_position()))?;
        match event {
            Event::Start(e) => {
                let tag = e.local_name();
                match scanner.text_slot(tag.as_ref()) {
                    Some(slot) => {
                        let text = read_text_content(&mut reader)?;
                        scanner.fill(slot, text);
                    }
                    None => scanner.open(tag.as_ref()),
                }
            }
            Event::Empty(e) => {
                if let Some(slot) = scanner.text_slot(e.local_name().as_ref()) {
                    scanner.fill(slot, String::new());
                }
            }
            Event::End(_) => scanner.close()?,
            Event::Eof => break,
            _ => {}
        }
    }
    if !scanner.stack.is_empty() {
        bail!("malformed KML: document ended with unclosed elements");
    }

    let mut waypoints = Vec::new();
    let mut routes = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for placemark in &scanner.placemarks {
        let name = placemark
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_PLACEMARK_NAME);
        let day = scanner.resolve_day(placemark);

        if let Some(coordinates) = &placemark.point {
            match parse_point(coordinates) {
                Some(position) => waypoints.push(Waypoint {
                    name: name.to_owned(),
                    normalized_name: text::normalize(name),
                    description: placemark
                        .description
                        .as_deref()
                        .unwrap_or("")
                        .trim()
                        .to_owned(),
                    position,
                    day,
                }),
                None => warnings.push(format!(
                    "dropped point \"{name}\": malformed coordinates {:?}",
                    coordinates.trim()
                )),
            }
        }

        if let Some(coordinates) = &placemark.line {
            match parse_line(coordinates).and_then(|points| {
                BoundingBox::from_points(&points).map(|bounding_box| (points, bounding_box))
            }) {
                Some((points, bounding_box)) => routes.push(Route {
                    day,
                    points,
                    bounding_box,
                }),
                None => warnings.push(format!(
                    "dropped line \"{name}\": malformed coordinates {:?}",
                    coordinates.trim()
                )),
            }
        }
    }

    for warning in &warnings {
        warn!("{warning}");
    }
    let trip = TripData::new(waypoints, routes);
    info!(
        "ingested {} waypoints and {} routes over {} days",
        trip.waypoints().len(),
        trip.routes().len(),
        trip.days().count()
    );

    let warnings = if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("\n"))
    };
    Ok((trip, warnings))
}

pub fn load_kml(file_path: impl AsRef<Path>) -> Result<(TripData, Option<String>)> {
    let file_path = file_path.as_ref();
    let xml = fs::read_to_string(file_path)
        .map_err(|e| anyhow!("failed to read {}: {e}", file_path.display()))?;
    parse_kml(&xml)
}
