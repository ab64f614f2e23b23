//! Fixed registry of the towns the dashboard can display.

use crate::types::Location;

const REGISTRY: [Location; 3] = [
    Location {
        name: "Béni Mellal",
        latitude: 32.3369,
        longitude: -6.3498,
    },
    Location {
        name: "Fkih Ben Salah",
        latitude: 32.5021,
        longitude: -6.6885,
    },
    Location {
        name: "Khouribga",
        latitude: 32.8851,
        longitude: -6.9063,
    },
];

/// All locations, in selector order.
pub fn all() -> &'static [Location] {
    &REGISTRY
}

/// The location shown at startup.
pub fn initial() -> Location {
    REGISTRY[0]
}

/// Exact, case-sensitive lookup by name.
pub fn find_by_name(name: &str) -> Option<Location> {
    REGISTRY.iter().find(|l| l.name == name).copied()
}

/// Position of `location` in the registry, if it is a member.
pub fn index_of(location: &Location) -> Option<usize> {
    REGISTRY.iter().position(|l| l.name == location.name)
}

/// Location after `current`, wrapping around.
pub fn next(current: &Location) -> Location {
    let idx = index_of(current).map_or(0, |i| (i + 1) % REGISTRY.len());
    REGISTRY[idx]
}

/// Location before `current`, wrapping around.
pub fn previous(current: &Location) -> Location {
    let idx = index_of(current).map_or(0, |i| (i + REGISTRY.len() - 1) % REGISTRY.len());
    REGISTRY[idx]
}
