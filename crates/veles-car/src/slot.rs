//! The ten fixed asset slots of a model container.

use std::fmt;

/// Number of asset slots in a model container.
pub const SLOT_COUNT: usize = 10;

/// One of the ten fixed sub-asset slots of a model container.
///
/// The discriminant is the slot's position in the container's offset table;
/// the order is part of the format and never changes. A slot whose table
/// entry is zero is absent from the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Slot {
    /// Car metadata record.
    CarInfo = 0,
    /// Collision mesh.
    CarCollision = 1,
    /// Main body model.
    MainModel = 2,
    /// Color patch for the main body model.
    MainModelColorPatch = 3,
    /// Wheel model.
    WheelModel = 4,
    /// Color patch for the wheel model.
    WheelColorPatch = 5,
    /// Wing model set.
    WingModelSet = 6,
    /// First tire model.
    TireModel0 = 7,
    /// Second tire model.
    TireModel1 = 8,
    /// Driver model.
    DriverModel = 9,
}

impl Slot {
    /// Get all slots in table order.
    pub const fn all() -> [Slot; SLOT_COUNT] {
        [
            Slot::CarInfo,
            Slot::CarCollision,
            Slot::MainModel,
            Slot::MainModelColorPatch,
            Slot::WheelModel,
            Slot::WheelColorPatch,
            Slot::WingModelSet,
            Slot::TireModel0,
            Slot::TireModel1,
            Slot::DriverModel,
        ]
    }

    /// Get the name of this slot as it appears in asset file names.
    pub const fn name(&self) -> &'static str {
        match self {
            Slot::CarInfo => "CarInfo",
            Slot::CarCollision => "CarCollision",
            Slot::MainModel => "MainModel",
            Slot::MainModelColorPatch => "MainModelColorPatch",
            Slot::WheelModel => "WheelModel",
            Slot::WheelColorPatch => "WheelColorPatch",
            Slot::WingModelSet => "WingModelSet",
            Slot::TireModel0 => "TireModel_0",
            Slot::TireModel1 => "TireModel_1",
            Slot::DriverModel => "DriverModel",
        }
    }

    /// File extension used when this slot is stored as a standalone asset.
    ///
    /// The two color-patch slots use `.pat`; everything else is `.bin`.
    pub const fn extension(&self) -> &'static str {
        match self {
            Slot::MainModelColorPatch | Slot::WheelColorPatch => ".pat",
            _ => ".bin",
        }
    }

    /// Standalone asset file name for this slot, e.g. `MainModel.bin`.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name(), self.extension())
    }

    /// Index of this slot's entry in the offset table.
    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }
}

impl TryFrom<usize> for Slot {
    type Error = ();

    fn try_from(value: usize) -> std::result::Result<Self, Self::Error> {
        Slot::all().get(value).copied().ok_or(())
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
