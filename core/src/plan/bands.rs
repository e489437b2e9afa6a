//! FPV analog video channel tables, in MHz.

pub const BAND_A: [u32; 8] = [5865, 5845, 5825, 5805, 5785, 5765, 5745, 5725];
pub const BAND_B: [u32; 8] = [5733, 5752, 5771, 5790, 5809, 5828, 5847, 5866];
pub const BAND_E: [u32; 8] = [5705, 5685, 5665, 5645, 5885, 5905, 5925, 5945];
pub const BAND_F: [u32; 8] = [5740, 5760, 5780, 5800, 5820, 5840, 5860, 5880];
pub const BAND_R: [u32; 8] = [5658, 5695, 5732, 5769, 5806, 5843, 5880, 5917];
pub const BAND_L: [u32; 8] = [5333, 5373, 5413, 5453, 5493, 5533, 5573, 5613];
pub const BAND_X: [u32; 8] = [4990, 5020, 5050, 5080, 5110, 5140, 5170, 5200];

/// Extra 5.9 GHz centres that catch transmitters with odd offsets.
pub const EXTRA_59: [u32; 4] = [5935, 5940, 5943, 5950];

pub fn race_bands() -> impl Iterator<Item = u32> {
    [BAND_A, BAND_B, BAND_E, BAND_F, BAND_R, BAND_L, BAND_X]
        .into_iter()
        .flatten()
}
