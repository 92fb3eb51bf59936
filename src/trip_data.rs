use geo_types::{coord, Rect};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Index of a waypoint in `TripData::waypoints`.
pub type WaypointId = usize;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    /// Returns `None` for non-finite or out of range values.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
        {
            Some(LatLng {
                latitude,
                longitude,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingBox {
    rect: Rect<f64>,
}

impl BoundingBox {
    pub fn from_point(point: &LatLng) -> Self {
        let c = coord! { x: point.longitude, y: point.latitude };
        BoundingBox {
            rect: Rect::new(c, c),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        points.into_iter().fold(None, |bbox, p| {
            Some(match bbox {
                None => BoundingBox::from_point(p),
                Some(mut bbox) => {
                    bbox.extend(p);
                    bbox
                }
            })
        })
    }

    pub fn extend(&mut self, point: &LatLng) {
        self.union(&BoundingBox::from_point(point));
    }

    pub fn union(&mut self, other: &BoundingBox) {
        let (min, max) = (self.rect.min(), self.rect.max());
        let (other_min, other_max) = (other.rect.min(), other.rect.max());
        self.rect = Rect::new(
            coord! { x: min.x.min(other_min.x), y: min.y.min(other_min.y) },
            coord! { x: max.x.max(other_max.x), y: max.y.max(other_max.y) },
        );
    }

    pub fn south(&self) -> f64 {
        self.rect.min().y
    }

    pub fn west(&self) -> f64 {
        self.rect.min().x
    }

    pub fn north(&self) -> f64 {
        self.rect.max().y
    }

    pub fn east(&self) -> f64 {
        self.rect.max().x
    }

}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("BoundingBox", 4)?;
        s.serialize_field("south", &self.south())?;
        s.serialize_field("west", &self.west())?;
        s.serialize_field("north", &self.north())?;
        s.serialize_field("east", &self.east())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub normalized_name: String,
    pub description: String,
    pub position: LatLng,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub day: u32,
    pub points: Vec<LatLng>,
    pub bounding_box: BoundingBox,
}

/// The whole ingested itinerary. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripData {
    waypoints: Vec<Waypoint>,
    routes: Vec<Route>,
    day_bounds: BTreeMap<u32, BoundingBox>,
}

impl TripData {
    pub fn new(waypoints: Vec<Waypoint>, routes: Vec<Route>) -> Self {
        let mut day_bounds: BTreeMap<u32, BoundingBox> = BTreeMap::new();
        let mut extend = |day: u32, bbox: BoundingBox| {
            day_bounds
                .entry(day)
                .and_modify(|b| b.union(&bbox))
                .or_insert(bbox);
        };
        for w in &waypoints {
            extend(w.day, BoundingBox::from_point(&w.position));
        }
        for r in &routes {
            extend(r.day, r.bounding_box);
        }
        TripData {
            waypoints,
            routes,
            day_bounds,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.get(id)
    }

    /// Distinct days present in the data, ascending.
    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        self.day_bounds.keys().copied()
    }

    pub fn day_bounds(&self, day: u32) -> Option<&BoundingBox> {
        self.day_bounds.get(&day)
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty() && self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(latitude: f64, longitude: f64) -> LatLng {
        LatLng::new(latitude, longitude).unwrap()
    }

    #[test]
    fn lat_lng_range() {
        assert!(LatLng::new(46.5, 11.9).is_some());
        assert!(LatLng::new(90.0, -180.0).is_some());
        assert!(LatLng::new(90.1, 0.0).is_none());
        assert!(LatLng::new(0.0, 180.5).is_none());
        assert!(LatLng::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn bounding_box_extend() {
        let mut bbox = BoundingBox::from_point(&p(46.5, 11.9));
        bbox.extend(&p(46.6, 12.0));
        bbox.extend(&p(46.55, 11.95));
        assert_eq!(bbox.south(), 46.5);
        assert_eq!(bbox.north(), 46.6);
        assert_eq!(bbox.west(), 11.9);
        assert_eq!(bbox.east(), 12.0);
    }

    #[test]
    fn day_bounds_cover_waypoints_and_routes() {
        let route_points = vec![p(46.4, 11.8), p(46.45, 11.85)];
        let route = Route {
            day: 1,
            bounding_box: BoundingBox::from_points(&route_points).unwrap(),
            points: route_points,
        };
        let waypoint = Waypoint {
            name: "Rifugio A".to_owned(),
            normalized_name: "rifugio a".to_owned(),
            description: String::new(),
            position: p(46.5, 11.9),
            day: 1,
        };
        let trip = TripData::new(vec![waypoint], vec![route]);
        let bbox = trip.day_bounds(1).unwrap();
        assert_eq!(bbox.south(), 46.4);
        assert_eq!(bbox.north(), 46.5);
        assert_eq!(trip.days().collect::<Vec<_>>(), vec![1]);
        assert!(trip.day_bounds(2).is_none());
    }

    #[test]
    fn bounding_box_serializes_as_corners() {
        let bbox = BoundingBox::from_points(&[p(46.5, 11.9), p(46.6, 12.0)]).unwrap();
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"south": 46.5, "west": 11.9, "north": 46.6, "east": 12.0})
        );
    }
}
