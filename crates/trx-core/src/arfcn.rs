//! ARFCN to carrier frequency mapping (3GPP TS 45.005 clause 2)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsmBand {
    Gsm450,
    Gsm480,
    Gsm850,
    Gsm900,
    Dcs1800,
    Pcs1900,
}

/// Channel number together with the PCS flag needed to disambiguate 1800 and 1900
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandArfcn {
    pub arfcn: u16,
    pub pcs: bool,
}

impl BandArfcn {
    pub fn new(arfcn: u16, pcs: bool) -> Self {
        Self { arfcn, pcs }
    }

    pub fn band(self) -> Option<GsmBand> {
        let n = self.arfcn;
        if self.pcs {
            return if (512..=810).contains(&n) { Some(GsmBand::Pcs1900) } else { None };
        }
        match n {
            0..=124 | 955..=1023 => Some(GsmBand::Gsm900),
            128..=251 => Some(GsmBand::Gsm850),
            259..=293 => Some(GsmBand::Gsm450),
            306..=340 => Some(GsmBand::Gsm480),
            512..=885 => Some(GsmBand::Dcs1800),
            _ => None,
        }
    }

    /// Uplink carrier frequency in kHz
    pub fn ul_khz(self) -> Option<u32> {
        let n = self.arfcn as i64;
        let khz = match self.band()? {
            GsmBand::Gsm900 if n >= 955 => 890_000 + 200 * (n - 1024),
            GsmBand::Gsm900 => 890_000 + 200 * n,
            GsmBand::Gsm850 => 824_200 + 200 * (n - 128),
            GsmBand::Gsm450 => 450_600 + 200 * (n - 259),
            GsmBand::Gsm480 => 479_000 + 200 * (n - 306),
            GsmBand::Dcs1800 => 1_710_200 + 200 * (n - 512),
            GsmBand::Pcs1900 => 1_850_200 + 200 * (n - 512),
        };
        Some(khz as u32)
    }

    /// Downlink carrier frequency in kHz
    pub fn dl_khz(self) -> Option<u32> {
        let duplex = match self.band()? {
            GsmBand::Gsm450 | GsmBand::Gsm480 => 10_000,
            GsmBand::Gsm850 | GsmBand::Gsm900 => 45_000,
            GsmBand::Dcs1800 => 95_000,
            GsmBand::Pcs1900 => 80_000,
        };
        Some(self.ul_khz()? + duplex)
    }
}
