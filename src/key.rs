//! Dichotomous key for Cerrado phytophysiognomies.
//!
//! Maps a vegetation fraction and a mineral fraction (both in percent) plus two
//! field-context flags onto a named formation with a fixed display color.

use serde::{Deserialize, Serialize};

use crate::color::hex;

/// Mineral fraction (%) above which the substrate counts as rocky.
pub const ROCK_MINERAL_THRESHOLD: f32 = 7.0;

/// Vegetation formations reachable from the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Physiognomy {
    RockyGrassland,
    RockySavanna,
    DryForest,
    GalleryForest,
    Cerradao,
    TypicalSavanna,
    PalmMarsh,
    SparseSavanna,
    WetGrassland,
    DirtyGrassland,
}

impl Physiognomy {
    pub const ALL: [Physiognomy; 10] = [
        Physiognomy::RockyGrassland,
        Physiognomy::RockySavanna,
        Physiognomy::DryForest,
        Physiognomy::GalleryForest,
        Physiognomy::Cerradao,
        Physiognomy::TypicalSavanna,
        Physiognomy::PalmMarsh,
        Physiognomy::SparseSavanna,
        Physiognomy::WetGrassland,
        Physiognomy::DirtyGrassland,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Physiognomy::RockyGrassland => "Rocky Grassland",
            Physiognomy::RockySavanna => "Rocky Savanna",
            Physiognomy::DryForest => "Dry Forest",
            Physiognomy::GalleryForest => "Gallery Forest",
            Physiognomy::Cerradao => "Cerradão",
            Physiognomy::TypicalSavanna => "Typical Savanna",
            Physiognomy::PalmMarsh => "Palm Marsh",
            Physiognomy::SparseSavanna => "Sparse Savanna",
            Physiognomy::WetGrassland => "Wet Grassland",
            Physiognomy::DirtyGrassland => "Dirty Grassland",
        }
    }

    /// Portuguese name used in the Brazilian classification literature.
    pub fn local_name(self) -> &'static str {
        match self {
            Physiognomy::RockyGrassland => "Campo Rupestre",
            Physiognomy::RockySavanna => "Cerrado Rupestre",
            Physiognomy::DryForest => "Mata Seca",
            Physiognomy::GalleryForest => "Mata de Galeria",
            Physiognomy::Cerradao => "Cerradão",
            Physiognomy::TypicalSavanna => "Cerrado Típico",
            Physiognomy::PalmMarsh => "Vereda",
            Physiognomy::SparseSavanna => "Cerrado Ralo",
            Physiognomy::WetGrassland => "Campo Úmido",
            Physiognomy::DirtyGrassland => "Campo Sujo",
        }
    }

    pub fn rgb(self) -> [u8; 3] {
        match self {
            Physiognomy::RockyGrassland => [168, 162, 158],
            Physiognomy::RockySavanna => [214, 163, 92],
            Physiognomy::DryForest => [139, 111, 58],
            Physiognomy::GalleryForest => [6, 95, 70],
            Physiognomy::Cerradao => [22, 101, 52],
            Physiognomy::TypicalSavanna => [101, 163, 13],
            Physiognomy::PalmMarsh => [14, 165, 233],
            Physiognomy::SparseSavanna => [163, 230, 53],
            Physiognomy::WetGrassland => [103, 232, 249],
            Physiognomy::DirtyGrassland => [253, 230, 138],
        }
    }

    /// Display color as `#RRGGBB`.
    pub fn color(self) -> String {
        hex(self.rgb())
    }
}

/// Field context the image cannot show.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldContext {
    /// Waterlogged or seasonally flooded soil.
    pub wet: bool,
    /// Observer saw rock outcrops; forces the rocky branch.
    pub rock_override: bool,
}

/// Walk the key. `veg_fraction` and `mineral_fraction` are percentages.
///
/// Canopy-closed cover on rock resolves to [`Physiognomy::DryForest`].
pub fn classify(veg_fraction: f32, mineral_fraction: f32, context: FieldContext) -> Physiognomy {
    let has_rock = context.rock_override || mineral_fraction > ROCK_MINERAL_THRESHOLD;

    if has_rock {
        return if veg_fraction < 5.0 {
            Physiognomy::RockyGrassland
        } else if veg_fraction <= 40.0 {
            Physiognomy::RockySavanna
        } else {
            Physiognomy::DryForest
        };
    }

    if veg_fraction > 90.0 {
        if context.wet {
            Physiognomy::GalleryForest
        } else {
            Physiognomy::DryForest
        }
    } else if veg_fraction > 50.0 {
        Physiognomy::Cerradao
    } else if veg_fraction > 20.0 {
        Physiognomy::TypicalSavanna
    } else if veg_fraction > 5.0 {
        if context.wet {
            Physiognomy::PalmMarsh
        } else {
            Physiognomy::SparseSavanna
        }
    } else if context.wet {
        Physiognomy::WetGrassland
    } else {
        Physiognomy::DirtyGrassland
    }
}
