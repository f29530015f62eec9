use num_traits::{One, PrimInt};
use serde::{Deserialize, Serialize};

/// Trait implemented by flag enums whose discriminant is a bit index.
///
/// The backing integer type is chosen via the associated `Storage`.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must stay below the bit width of `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// A plain bitmask container for a set of [`FlagBitmask`] values.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn from_flags<U: FlagBitmask<Storage = T> + Copy>(flags: &[U]) -> Self {
        let mut set = Self::new(T::zero());
        set.add_many(flags);
        set
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits | flag.mask();
    }

    pub fn remove<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits & !flag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, flag: U) -> bool {
        (self.bits & flag.mask()) != T::zero()
    }

    pub fn add_many<U: FlagBitmask<Storage = T> + Copy>(&mut self, flags: &[U]) {
        for &flag in flags {
            self.add(flag);
        }
    }

    pub fn has_all<U: FlagBitmask<Storage = T> + Copy>(&self, flags: &[U]) -> bool {
        let combined = flags.iter().fold(T::zero(), |acc, f| acc | f.mask());
        (self.bits & combined) == combined
    }
}

/// Individual solver-mode switches.
///
/// Only `Warmstarting` changes what rapier does (it toggles the warm-start
/// coefficient). The others describe solver behaviour rapier always or never
/// exhibits; they are kept so parameter files written for the historical
/// solver still load and round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SolverModeFlag {
    RandomizeOrder,
    SeparateFriction,
    Warmstarting,
    TwoFrictionDirections,
    Simd,
}

impl FlagBitmask for SolverModeFlag {
    type Storage = u32;

    fn bit_index(&self) -> u8 {
        *self as u8
    }
}

/// Solver-mode bitmask handed to the world once at construction.
pub type SolverMode = BitmaskFlags<u32>;

/// Flags enabled when a configuration does not list any.
pub const DEFAULT_SOLVER_FLAGS: [SolverModeFlag; 2] =
    [SolverModeFlag::Warmstarting, SolverModeFlag::Simd];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_occupy_distinct_bits() {
        let all = [
            SolverModeFlag::RandomizeOrder,
            SolverModeFlag::SeparateFriction,
            SolverModeFlag::Warmstarting,
            SolverModeFlag::TwoFrictionDirections,
            SolverModeFlag::Simd,
        ];
        let mode = SolverMode::from_flags(&all);
        assert_eq!(mode.bits, 0b1_1111);
        assert!(mode.has_all(&all));
    }

    #[test]
    fn add_and_remove_toggle_single_bits() {
        let mut mode = SolverMode::from_flags(&DEFAULT_SOLVER_FLAGS);
        assert!(mode.has(SolverModeFlag::Warmstarting));
        assert!(!mode.has(SolverModeFlag::RandomizeOrder));

        mode.remove(SolverModeFlag::Warmstarting);
        mode.add(SolverModeFlag::RandomizeOrder);

        assert!(!mode.has(SolverModeFlag::Warmstarting));
        assert!(mode.has(SolverModeFlag::RandomizeOrder));
        assert!(mode.has(SolverModeFlag::Simd));
    }

    #[test]
    fn flags_deserialize_from_snake_case_names() {
        let flags: Vec<SolverModeFlag> =
            serde_json::from_str(r#"["warmstarting", "two_friction_directions"]"#).unwrap();
        let mode = SolverMode::from_flags(&flags);
        assert!(mode.has(SolverModeFlag::TwoFrictionDirections));
        assert!(!mode.has(SolverModeFlag::Simd));
    }
}
