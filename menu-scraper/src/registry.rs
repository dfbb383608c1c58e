use menu_core::domain::Vendor;
use menu_core::error::{MenuError, Result};

/// Static per-hall routing information: which vendor serves it, and the
/// parameters needed to build that vendor's URL.
#[derive(Debug, Clone, Copy)]
pub struct HallEntry {
    pub hall_id: &'static str,
    pub display_name: &'static str,
    pub vendor: Vendor,
    pub params: UrlParams,
}

#[derive(Debug, Clone, Copy)]
pub enum UrlParams {
    Sodexo { menu_id: u32, location_id: u32 },
    BonAppetit { subdomain: &'static str, cafe_path: &'static str },
    Pomona { slug: &'static str },
}

const HALLS: &[HallEntry] = &[
    HallEntry {
        hall_id: "hoch",
        display_name: "Hoch-Shanahan",
        vendor: Vendor::Sodexo,
        params: UrlParams::Sodexo {
            menu_id: 15258,
            location_id: 13147001,
        },
    },
    HallEntry {
        hall_id: "collins",
        display_name: "Collins",
        vendor: Vendor::BonAppetit,
        params: UrlParams::BonAppetit {
            subdomain: "collins-cmc",
            cafe_path: "collins",
        },
    },
    HallEntry {
        hall_id: "malott",
        display_name: "Malott",
        vendor: Vendor::BonAppetit,
        params: UrlParams::BonAppetit {
            subdomain: "scripps",
            cafe_path: "malott-dining-commons",
        },
    },
    HallEntry {
        hall_id: "mcconnell",
        display_name: "McConnell",
        vendor: Vendor::BonAppetit,
        params: UrlParams::BonAppetit {
            subdomain: "pitzer",
            cafe_path: "mcconnell-bistro",
        },
    },
    HallEntry {
        hall_id: "frank",
        display_name: "Frank",
        vendor: Vendor::Pomona,
        params: UrlParams::Pomona { slug: "frank" },
    },
    HallEntry {
        hall_id: "frary",
        display_name: "Frary",
        vendor: Vendor::Pomona,
        params: UrlParams::Pomona { slug: "frary" },
    },
    HallEntry {
        hall_id: "oldenborg",
        display_name: "Oldenborg",
        vendor: Vendor::Pomona,
        params: UrlParams::Pomona { slug: "oldenborg" },
    },
];

/// Look up a hall by id, surfacing `UnknownHall` if it is not in the
/// consortium registry.
pub fn lookup(hall_id: &str) -> Result<HallEntry> {
    HALLS
        .iter()
        .find(|h| h.hall_id == hall_id)
        .copied()
        .ok_or_else(|| MenuError::UnknownHall(hall_id.to_string()))
}

pub fn all_halls() -> &'static [HallEntry] {
    HALLS
}
