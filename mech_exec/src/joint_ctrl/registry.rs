//! Joint topology and calibration

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{info, warn};
use plen_if::{
    calib::{CalibEntry, CalibOverlay},
    JointId, NUM_JOINTS,
};
use std::{fs, path::Path};

use super::{ANGLE_MAX, ANGLE_MIN, ANGLE_NEUTRAL};
use crate::servo_ctrl::NUM_PWM_CHANNELS;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Built-in topology, indexed by joint id: (wiring, home).
///
/// Joints 0 and 12 (shoulder pitch) are driven from GPIO on the original board and are not wired
/// to the servo driver.
const DEFAULT_TOPOLOGY: [(Wiring, i32); NUM_JOINTS] = [
    (Wiring::Unwired, -40),
    (Wiring::pwm(7), 245),
    (Wiring::pwm(6), 470),
    (Wiring::pwm(5), -100),
    (Wiring::pwm(4), -205),
    (Wiring::pwm(3), 50),
    (Wiring::pwm(2), 445),
    (Wiring::pwm(1), 245),
    (Wiring::pwm(0), -75),
    (Wiring::Unwired, ANGLE_NEUTRAL),
    (Wiring::Unwired, ANGLE_NEUTRAL),
    (Wiring::Unwired, ANGLE_NEUTRAL),
    (Wiring::Unwired, 15),
    (Wiring::pwm(8), -70),
    (Wiring::pwm(9), -390),
    (Wiring::pwm(10), 250),
    (Wiring::pwm(11), 195),
    (Wiring::pwm(12), -105),
    (Wiring::pwm(13), -510),
    (Wiring::pwm(14), -305),
    (Wiring::pwm(15), 60),
    (Wiring::Unwired, ANGLE_NEUTRAL),
    (Wiring::Unwired, ANGLE_NEUTRAL),
    (Wiring::Unwired, ANGLE_NEUTRAL),
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Topology and calibration of a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointSpec {
    /// How the joint is connected to the servo driver
    pub wiring: Wiring,

    /// Lowest angle the joint may be commanded to
    pub angle_min: i32,

    /// Highest angle the joint may be commanded to
    pub angle_max: i32,

    /// Neutral (standing) angle, adjusted by calibration
    pub home: i32,
}

/// Topology and calibration of every joint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JointRegistry {
    specs: [JointSpec; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// The actuator connection of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    /// Driven by the given servo driver channel
    Pwm(u8),

    /// No physical actuator, commands are accepted and dropped
    Unwired,
}

/// Errors reading or writing the calibration overlay.
#[derive(Debug, thiserror::Error)]
pub enum CalibError {
    #[error("Cannot read the calibration file: {0}")]
    Read(std::io::Error),

    #[error("Cannot parse the calibration file: {0}")]
    Parse(serde_json::Error),

    #[error("Cannot write the calibration file: {0}")]
    Write(std::io::Error),

    #[error("Cannot serialise the calibration: {0}")]
    Serialize(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Wiring {
    /// Wiring for a driver channel. Channels beyond the driver's range are unwired.
    pub const fn pwm(channel: u8) -> Self {
        if channel < NUM_PWM_CHANNELS {
            Wiring::Pwm(channel)
        } else {
            Wiring::Unwired
        }
    }
}

impl Default for JointRegistry {
    fn default() -> Self {
        let mut specs = [JointSpec {
            wiring: Wiring::Unwired,
            angle_min: ANGLE_MIN,
            angle_max: ANGLE_MAX,
            home: ANGLE_NEUTRAL,
        }; NUM_JOINTS];

        for (spec, (wiring, home)) in specs.iter_mut().zip(DEFAULT_TOPOLOGY.iter()) {
            spec.wiring = *wiring;
            spec.home = *home;
        }

        Self { specs }
    }
}

impl JointRegistry {
    /// Create a registry from the built-in topology and default calibration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spec(&self, id: JointId) -> &JointSpec {
        &self.specs[id.index()]
    }

    /// Iterate over every joint's spec in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (JointId, &JointSpec)> + '_ {
        JointId::all().zip(self.specs.iter())
    }

    pub fn home(&self, id: JointId) -> i32 {
        self.specs[id.index()].home
    }

    /// Set the home angle of a joint. Not constrained to the joint's limits.
    pub fn set_home(&mut self, id: JointId, home: i32) {
        self.specs[id.index()].home = home;
    }

    /// Apply a signed delta to the home angle of a joint, returning the new home.
    ///
    /// Home is a physical assembly correction, so it may leave the joint's limits.
    pub fn adjust_home(&mut self, id: JointId, delta: i32) -> i32 {
        let spec = &mut self.specs[id.index()];
        spec.home = spec.home.saturating_add(delta);
        spec.home
    }

    /// Overwrite home angles from an overlay, returning the number of homes applied.
    ///
    /// Entries beyond the known joints are ignored, joints without an entry keep their values.
    pub fn apply_overlay(&mut self, overlay: &[CalibEntry]) -> usize {
        let mut applied = 0;

        for (spec, entry) in self.specs.iter_mut().zip(overlay.iter()) {
            if let Some(home) = entry.home {
                spec.home = home;
                applied += 1;
            }
        }

        applied
    }

    /// Full calibration of every joint in id order.
    pub fn to_overlay(&self) -> CalibOverlay {
        self.specs
            .iter()
            .map(|s| CalibEntry {
                min: Some(s.angle_min),
                max: Some(s.angle_max),
                home: Some(s.home),
            })
            .collect()
    }

    /// Load the calibration overlay at `path`.
    ///
    /// On any error the current calibration is kept and the error is returned.
    pub fn try_load<P: AsRef<Path>>(&mut self, path: P) -> Result<usize, CalibError> {
        let json = fs::read_to_string(path).map_err(CalibError::Read)?;
        let overlay: CalibOverlay = serde_json::from_str(&json).map_err(CalibError::Parse)?;

        Ok(self.apply_overlay(&overlay))
    }

    /// Load the calibration overlay at `path`, logging and ignoring any failure.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) {
        match self.try_load(&path) {
            Ok(n) => info!(
                "Loaded {} home values from {:?}",
                n,
                path.as_ref()
            ),
            Err(e) => warn!(
                "Using default calibration, {:?} not loaded: {}",
                path.as_ref(),
                e
            ),
        }
    }

    /// Write the full calibration to `path`.
    pub fn try_save<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibError> {
        let json =
            serde_json::to_string_pretty(&self.to_overlay()).map_err(CalibError::Serialize)?;
        fs::write(path, json).map_err(CalibError::Write)
    }

    /// Write the full calibration to `path`, logging any failure.
    ///
    /// Returns `true` if the calibration was written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> bool {
        match self.try_save(&path) {
            Ok(()) => {
                info!("Calibration saved to {:?}", path.as_ref());
                true
            }
            Err(e) => {
                warn!("Calibration not saved to {:?}: {}", path.as_ref(), e);
                false
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn id(i: usize) -> JointId {
        JointId::new(i).unwrap()
    }

    #[test]
    fn test_default_topology() {
        let reg = JointRegistry::new();

        assert_eq!(reg.spec(id(6)).wiring, Wiring::Pwm(2));
        assert_eq!(reg.spec(id(6)).home, 445);
        assert_eq!(reg.spec(id(0)).wiring, Wiring::Unwired);
        assert_eq!(reg.spec(id(23)).wiring, Wiring::Unwired);
        assert_eq!(Wiring::pwm(16), Wiring::Unwired);

        for (_, spec) in reg.iter() {
            assert_eq!(spec.angle_min, ANGLE_MIN);
            assert_eq!(spec.angle_max, ANGLE_MAX);
        }

        // Each driver channel is used exactly once
        let mut channels: Vec<u8> = reg
            .iter()
            .filter_map(|(_, s)| match s.wiring {
                Wiring::Pwm(c) => Some(c),
                Wiring::Unwired => None,
            })
            .collect();
        channels.sort();
        assert_eq!(channels, (0..NUM_PWM_CHANNELS).collect::<Vec<_>>());
    }

    #[test]
    fn test_adjust_home_unclamped() {
        let mut reg = JointRegistry::new();

        assert_eq!(reg.adjust_home(id(6), 10), 455);
        assert_eq!(reg.adjust_home(id(6), 1000), 1455);
        assert_eq!(reg.home(id(6)), 1455);
        assert_eq!(reg.adjust_home(id(6), -2000), -545);
    }

    #[test]
    fn test_partial_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.json");
        fs::write(&path, r#"[{}, {}, {"home": 11}, {}, {}, {"home": -22}]"#).unwrap();

        let mut reg = JointRegistry::new();
        assert_eq!(reg.try_load(&path).unwrap(), 2);

        let defaults = JointRegistry::new();
        for (jid, spec) in reg.iter() {
            match jid.index() {
                2 => assert_eq!(spec.home, 11),
                5 => assert_eq!(spec.home, -22),
                _ => assert_eq!(spec, defaults.spec(jid)),
            }
        }
    }

    #[test]
    fn test_overlay_ignores_extra_entries() {
        let mut overlay = vec![CalibEntry::default(); NUM_JOINTS + 4];
        overlay[NUM_JOINTS + 1].home = Some(99);
        overlay[0].min = Some(-10);
        overlay[0].home = Some(-41);

        let mut reg = JointRegistry::new();
        assert_eq!(reg.apply_overlay(&overlay), 1);
        assert_eq!(reg.home(id(0)), -41);
        // Persisted limits are not honoured
        assert_eq!(reg.spec(id(0)).angle_min, ANGLE_MIN);
    }

    #[test]
    fn test_bad_overlay_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.json");

        let mut reg = JointRegistry::new();

        // Missing file
        reg.load(&path);
        assert_eq!(reg, JointRegistry::new());
        match reg.try_load(&path) {
            Err(CalibError::Read(_)) => (),
            r => panic!("Expected a read error, got {:?}", r),
        }

        // Garbage
        fs::write(&path, "{ not json").unwrap();
        reg.load(&path);
        assert_eq!(reg, JointRegistry::new());
        match reg.try_load(&path) {
            Err(CalibError::Parse(_)) => (),
            r => panic!("Expected a parse error, got {:?}", r),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calib.json");

        let mut reg = JointRegistry::new();
        reg.adjust_home(id(1), -7);
        reg.set_home(id(18), 900);
        assert!(reg.save(&path));

        let mut loaded = JointRegistry::new();
        assert_eq!(loaded.try_load(&path).unwrap(), NUM_JOINTS);
        assert_eq!(loaded, reg);
    }

    #[test]
    fn test_save_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("calib.json");

        let mut reg = JointRegistry::new();
        reg.set_home(id(3), 1);
        assert!(!reg.save(&path));
        assert!(matches!(reg.try_save(&path), Err(CalibError::Write(_))));
        assert_eq!(reg.home(id(3)), 1);
    }
}
