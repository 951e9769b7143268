use reverse_geocoder::ReverseGeocoder;

/// Describes coordinates by the nearest populated place.
pub struct Locator {
    geocoder: ReverseGeocoder,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            geocoder: ReverseGeocoder::new(),
        }
    }
}

impl Locator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `"{city}, {country}"` for the place closest to the given coordinates.
    pub fn nearest_place(&self, latitude: f64, longitude: f64) -> Option<String> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        let result = self.geocoder.search((latitude, longitude));
        let city = &result.record.name;
        let country = isocountry::CountryCode::for_alpha2(&result.record.cc)
            .map(|code| code.name().to_string())
            .unwrap_or_else(|_| result.record.cc.clone());
        Some(format!("{}, {}", city, country))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn london() {
        let locator = Locator::new();
        let place = locator.nearest_place(51.50, -0.12).unwrap();
        assert!(place.contains("United Kingdom"), "{place}");
    }

    #[test]
    fn non_finite_coordinates() {
        let locator = Locator::new();
        assert_eq!(locator.nearest_place(f64::NAN, 0.0), None);
    }
}
