use egui::Color32;

/// Closed set of business types the UI knows how to draw. Anything else
/// falls back to [`BusinessKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessKind {
    Pharmacy,
    Restaurant,
    Store,
    CoffeeShop,
    PrintShop,
    Bank,
    Other,
}

impl BusinessKind {
    pub const FILTERABLE: [BusinessKind; 6] = [
        BusinessKind::Pharmacy,
        BusinessKind::Restaurant,
        BusinessKind::Store,
        BusinessKind::CoffeeShop,
        BusinessKind::PrintShop,
        BusinessKind::Bank,
    ];

    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind {
            Some("pharmacy") => BusinessKind::Pharmacy,
            Some("restaurant") => BusinessKind::Restaurant,
            Some("store") => BusinessKind::Store,
            Some("coffeeshop") => BusinessKind::CoffeeShop,
            Some("print_shop") => BusinessKind::PrintShop,
            Some("bank") => BusinessKind::Bank,
            _ => BusinessKind::Other,
        }
    }

    /// The lowercased wire value used in the `type` property and filter set.
    pub fn wire_name(&self) -> &'static str {
        match self {
            BusinessKind::Pharmacy => "pharmacy",
            BusinessKind::Restaurant => "restaurant",
            BusinessKind::Store => "store",
            BusinessKind::CoffeeShop => "coffeeshop",
            BusinessKind::PrintShop => "print_shop",
            BusinessKind::Bank => "bank",
            BusinessKind::Other => "default",
        }
    }
}

/// Marker appearance for one business type. Glyphs are drawn as text so the
/// app needs no image assets.
#[derive(Debug, Clone, Copy)]
pub struct MarkerIcon {
    pub glyph: &'static str,
    pub size: f32,
    pub color: Color32,
}

pub const HIGHLIGHTED: MarkerIcon = MarkerIcon {
    glyph: "★",
    size: 24.0,
    color: Color32::from_rgb(255, 196, 0),
};

pub const USER_LOCATION: MarkerIcon = MarkerIcon {
    glyph: "📍",
    size: 26.0,
    color: Color32::from_rgb(220, 40, 40),
};

pub fn icon_for(kind: Option<&str>) -> MarkerIcon {
    match BusinessKind::from_kind(kind) {
        BusinessKind::Pharmacy => MarkerIcon {
            glyph: "⚕",
            size: 20.0,
            color: Color32::from_rgb(46, 139, 87),
        },
        BusinessKind::Restaurant => MarkerIcon {
            glyph: "🍴",
            size: 18.0,
            color: Color32::from_rgb(205, 92, 92),
        },
        BusinessKind::Store => MarkerIcon {
            glyph: "🛒",
            size: 18.0,
            color: Color32::from_rgb(70, 130, 180),
        },
        BusinessKind::CoffeeShop => MarkerIcon {
            glyph: "☕",
            size: 18.0,
            color: Color32::from_rgb(139, 90, 43),
        },
        BusinessKind::PrintShop => MarkerIcon {
            glyph: "🖨",
            size: 18.0,
            color: Color32::from_rgb(105, 105, 105),
        },
        BusinessKind::Bank => MarkerIcon {
            glyph: "🏛",
            size: 18.0,
            color: Color32::from_rgb(72, 61, 139),
        },
        BusinessKind::Other => MarkerIcon {
            glyph: "●",
            size: 16.0,
            color: Color32::from_rgb(96, 96, 96),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kinds_fall_back_to_other() {
        assert_eq!(BusinessKind::from_kind(Some("cafe")), BusinessKind::Other);
        assert_eq!(BusinessKind::from_kind(None), BusinessKind::Other);
        assert_eq!(BusinessKind::from_kind(Some("bank")), BusinessKind::Bank);
    }

    #[test]
    fn wire_names_roundtrip_through_from_kind() {
        for kind in BusinessKind::FILTERABLE {
            assert_eq!(BusinessKind::from_kind(Some(kind.wire_name())), kind);
        }
    }
}
