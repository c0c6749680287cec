use serde::{Deserialize, Serialize};
use serde_hex::{Compact, SerHex};

use crate::prefix::BasicPrefix;

pub mod key_config;
pub mod seal;
pub mod threshold;

pub use key_config::KeyConfig;

/// Configuration traits committed to at inception.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigTrait {
    #[serde(rename = "EO")]
    EstOnly,
    #[serde(rename = "DND")]
    DoNotDelegate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InceptionWitnessConfig {
    #[serde(rename = "bt", with = "SerHex::<Compact>")]
    pub tally: u64,

    #[serde(rename = "b")]
    pub initial_witnesses: Vec<BasicPrefix>,
}

impl Default for InceptionWitnessConfig {
    fn default() -> Self {
        Self {
            tally: 0,
            initial_witnesses: Default::default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RotationWitnessConfig {
    #[serde(rename = "bt", with = "SerHex::<Compact>")]
    pub tally: u64,

    #[serde(rename = "br")]
    pub prune: Vec<BasicPrefix>,

    #[serde(rename = "ba")]
    pub graft: Vec<BasicPrefix>,
}

impl Default for RotationWitnessConfig {
    fn default() -> Self {
        Self {
            tally: 0,
            prune: Default::default(),
            graft: Default::default(),
        }
    }
}

/// Checks witness-set threshold bounds: zero iff the set is empty, else
/// between one and the set size.
pub fn check_tally(tally: u64, witness_count: usize) -> bool {
    if witness_count == 0 {
        tally == 0
    } else {
        tally >= 1 && tally as usize <= witness_count
    }
}

#[test]
fn test_tally_bounds() {
    assert!(check_tally(0, 0));
    assert!(!check_tally(1, 0));
    assert!(!check_tally(0, 2));
    assert!(check_tally(1, 2));
    assert!(check_tally(2, 2));
    assert!(!check_tally(3, 2));
}
