//! Earth weight to weight on other bodies of the solar system

/// Surface gravity relative to Earth, in display order
pub const PLANET_FACTORS: &[(&str, f64)] = &[
    ("Mercury", 0.38),
    ("Venus", 0.91),
    ("Earth", 1.00),
    ("Mars", 0.38),
    ("Jupiter", 2.53),
    ("Saturn", 1.07),
];

/// Planet name -> weight in kg, serialized as a JSON object in table order
#[derive(Debug, Clone, PartialEq)]
pub struct PlanetWeights(pub Vec<(&'static str, f64)>);

impl PlanetWeights {
    pub fn get(&self, planet: &str) -> Option<f64> {
        self.0.iter().find(|(p, _)| *p == planet).map(|(_, w)| *w)
    }
}

impl serde::Serialize for PlanetWeights {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (planet, weight) in &self.0 {
            map.serialize_entry(planet, weight)?;
        }
        map.end()
    }
}

pub fn weights_on_planets(earth_weight_kg: f64) -> PlanetWeights {
    PlanetWeights(
        PLANET_FACTORS
            .iter()
            .map(|(planet, factor)| (*planet, round2(earth_weight_kg * factor)))
            .collect(),
    )
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
