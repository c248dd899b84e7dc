use std::fmt;

/// Every attribute the calculator knows how to score, keyed by its
/// `snake_case` weight name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Price,
    Size,
    Rooms,
    Bathrooms,
    Roommates,
    Amenity(Amenity),
    Orientation,
    EnergyRating,
    Condition,
    Deposit,
    MaintenanceFee,
    Recency,
}

/// Tri-state amenities with a recognized weight key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Amenity {
    Elevator,
    Parking,
    Garage,
    StorageRoom,
    BuiltInWardrobes,
    Heating,
    AirConditioning,
    Terrace,
    Balcony,
    Exterior,
    Furnished,
    Pool,
    Garden,
    PetsAllowed,
    Window,
    PrivateBathroom,
    GenderPreference,
}

impl Amenity {
    pub const ALL: [Amenity; 17] = [
        Amenity::Elevator,
        Amenity::Parking,
        Amenity::Garage,
        Amenity::StorageRoom,
        Amenity::BuiltInWardrobes,
        Amenity::Heating,
        Amenity::AirConditioning,
        Amenity::Terrace,
        Amenity::Balcony,
        Amenity::Exterior,
        Amenity::Furnished,
        Amenity::Pool,
        Amenity::Garden,
        Amenity::PetsAllowed,
        Amenity::Window,
        Amenity::PrivateBathroom,
        Amenity::GenderPreference,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Amenity::Elevator => "elevator",
            Amenity::Parking => "parking",
            Amenity::Garage => "garage",
            Amenity::StorageRoom => "storage_room",
            Amenity::BuiltInWardrobes => "built_in_wardrobes",
            Amenity::Heating => "heating",
            Amenity::AirConditioning => "air_conditioning",
            Amenity::Terrace => "terrace",
            Amenity::Balcony => "balcony",
            Amenity::Exterior => "exterior",
            Amenity::Furnished => "furnished",
            Amenity::Pool => "pool",
            Amenity::Garden => "garden",
            Amenity::PetsAllowed => "pets_allowed",
            Amenity::Window => "window",
            Amenity::PrivateBathroom => "private_bathroom",
            Amenity::GenderPreference => "gender_preference",
        }
    }
}

impl Feature {
    /// Resolve a weight key. Unknown keys yield `None` and score nothing.
    pub fn from_key(key: &str) -> Option<Self> {
        let feature = match key {
            "price" => Feature::Price,
            "size" => Feature::Size,
            "rooms" => Feature::Rooms,
            "bathrooms" => Feature::Bathrooms,
            "roommates" => Feature::Roommates,
            "orientation" => Feature::Orientation,
            "energy_rating" => Feature::EnergyRating,
            "condition" => Feature::Condition,
            "deposit" => Feature::Deposit,
            "maintenance_fee" => Feature::MaintenanceFee,
            "recency" => Feature::Recency,
            other => {
                return Amenity::ALL
                    .iter()
                    .find(|a| a.key() == other)
                    .map(|a| Feature::Amenity(*a))
            }
        };
        Some(feature)
    }

    pub fn key(&self) -> &'static str {
        match self {
            Feature::Price => "price",
            Feature::Size => "size",
            Feature::Rooms => "rooms",
            Feature::Bathrooms => "bathrooms",
            Feature::Roommates => "roommates",
            Feature::Amenity(a) => a.key(),
            Feature::Orientation => "orientation",
            Feature::EnergyRating => "energy_rating",
            Feature::Condition => "condition",
            Feature::Deposit => "deposit",
            Feature::MaintenanceFee => "maintenance_fee",
            Feature::Recency => "recency",
        }
    }

    /// Upper bound used when a range leaves `max` unset.
    pub fn upper_sentinel(&self) -> Option<f64> {
        match self {
            Feature::Price => Some(100_000.0),
            Feature::Size => Some(1_000.0),
            Feature::Rooms => Some(20.0),
            Feature::Bathrooms => Some(10.0),
            _ => None,
        }
    }

    pub fn is_known(key: &str) -> bool {
        Self::from_key(key).is_some()
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
