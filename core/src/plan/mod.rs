//! Static channel plan: the ordered set of centre frequencies one sweep visits.

pub mod bands;

use std::collections::BTreeSet;

const HZ_PER_MHZ: f64 = 1e6;

/// Ascending, deduplicated list of channel centres fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlan {
    centers_mhz: Vec<u32>,
}

impl ChannelPlan {
    /// Merges the primary table with supplementary channels. Returns `None`
    /// when the merged plan would be empty.
    pub fn new<I, J>(primary: I, supplementary: J) -> Option<Self>
    where
        I: IntoIterator<Item = u32>,
        J: IntoIterator<Item = u32>,
    {
        let merged: BTreeSet<u32> = primary.into_iter().chain(supplementary).collect();
        if merged.is_empty() {
            return None;
        }
        Some(Self {
            centers_mhz: merged.into_iter().collect(),
        })
    }

    /// All race bands plus the 5.9 GHz extras and any caller-provided channels.
    pub fn standard(extra_mhz: &[u32]) -> Self {
        let supplementary = bands::EXTRA_59.into_iter().chain(extra_mhz.iter().copied());
        Self {
            centers_mhz: bands::race_bands()
                .chain(supplementary)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.centers_mhz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers_mhz.is_empty()
    }

    pub fn centers_mhz(&self) -> &[u32] {
        &self.centers_mhz
    }

    /// Visiting order for one sweep, in Hz.
    pub fn iter_hz(&self) -> impl Iterator<Item = f64> + '_ {
        self.centers_mhz.iter().map(|&mhz| mhz_to_hz(mhz))
    }
}

pub fn mhz_to_hz(mhz: u32) -> f64 {
    f64::from(mhz) * HZ_PER_MHZ
}
