//! The game's item identifiers, used to gate story goals.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// In-game item identifiers that a story goal can be attached to. Picking up (or scanning) the
/// item fires the goal, which unlocks the associated entry or plays the audio log.
///
/// Parsing is case-insensitive, so descriptors may write `"titanium"` or `"Titanium"`.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
#[allow(non_camel_case_types)]
pub enum TechType {
    // Raw materials
    Titanium,
    Copper,
    Quartz,
    Lead,
    Silver,
    Gold,
    Lithium,
    Diamond,
    Magnetite,
    Nickel,
    Kyanite,
    AluminumOxide,
    UraniniteCrystal,
    Sulphur,
    Salt,
    ScrapMetal,

    // Organics
    CreepvineSeedCluster,
    CoralChunk,
    StalkerTooth,
    GasPod,
    JeweledDiskPiece,

    // Components
    TitaniumIngot,
    PlasteelIngot,
    Glass,
    EnameledGlass,
    Silicone,
    CopperWire,
    WiringKit,
    AdvancedWiringKit,
    ComputerChip,
    Battery,
    PowerCell,
    PrecursorIonBattery,
    PrecursorIonPowerCell,
    Lubricant,
    Benzene,
    HydrochloricAcid,
    Polyaniline,
    AramidFibers,
    FiberMesh,

    // Precursor artifacts
    PrecursorKey_Purple,
    PrecursorKey_Blue,
    PrecursorKey_Red,
    PrecursorKey_White,
    PrecursorKey_Orange,
    PrecursorIonCrystal,
    PrecursorIonCrystalMatrix,

    // Equipment
    Knife,
    HeatBlade,
    Flashlight,
    Scanner,
    Builder,
    RepairTool,
    Welder,
    LaserCutter,
    StasisRifle,
    PropulsionCannon,
    RepulsionCannon,
    Seaglide,
    Tank,
    DoubleTank,
    PlasteelTank,
    HighCapacityTank,
    Rebreather,
    Fins,
    UltraGlideFins,
    RadiationSuit,
    ReinforcedDiveSuit,
    Stillsuit,
    Beacon,
    Pipe,
    AirBladder,

    // Vehicles
    Seamoth,
    Exosuit,
    Cyclops,
    Constructor,

    // Story items
    PDA,
    Signal,
    Fragment,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_without_regard_to_case() {
        assert_eq!("titanium".parse::<TechType>(), Ok(TechType::Titanium));
        assert_eq!("PRECURSORKEY_PURPLE".parse::<TechType>(), Ok(TechType::PrecursorKey_Purple));
        assert_eq!("Seamoth".parse::<TechType>(), Ok(TechType::Seamoth));
    }

    #[test]
    fn rejects_names_outside_the_enumeration() {
        assert!("NotARealType".parse::<TechType>().is_err());
        assert!("".parse::<TechType>().is_err());
    }
}
