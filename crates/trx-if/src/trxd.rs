//! TRXD burst datagrams
//!
//! Receive (transceiver to us):
//! ```text
//! v0: VER/TN(1) FN(4) RSSI(1) TOA256(2) SOFT-BITS
//! v1: VER/TN(1) FN(4) RSSI(1) TOA256(2) MTS(1) C/I(2) SOFT-BITS
//! ```
//! Transmit (us to transceiver), both versions:
//! ```text
//! VER/TN(1) FN(4) ATT(1) HARD-BITS
//! ```
//! Multi-byte fields are big endian. RSSI is sent as -dBm. Soft bits are
//! bytes where 0 is a definite one and 255 a definite zero.

use trx_core::burst::{
    GSM_NBITS_NB_8PSK_BURST, GSM_NBITS_NB_GMSK_BURST, Modulation, sbit_to_usbit, usbit_to_sbit,
};
use trx_core::frame_number::GSM_HYPERFRAME;
use trx_core::{FrameNumber, SoftBit, TRX_TS_COUNT, UBit};
use trx_l1sched::{RxBurst, TxBurst};

use crate::TrxdError;

pub const TRXD_HDR_LEN_V0: usize = 8;
pub const TRXD_HDR_LEN_V1: usize = 11;
pub const TRXD_TX_HDR_LEN: usize = 6;

/// Trailing bytes some transceivers append to v0 bursts
const TRXD_V0_PADDING: usize = 2;

const MTS_NOPE: u8 = 0x80;
const MTS_MOD_GMSK: u8 = 0b0000;
const MTS_MOD_8PSK: u8 = 0b0100;

pub fn header_len(version: u8) -> Result<usize, TrxdError> {
    match version {
        0 => Ok(TRXD_HDR_LEN_V0),
        1 => Ok(TRXD_HDR_LEN_V1),
        v => Err(TrxdError::UnsupportedVersion(v)),
    }
}

/// Burst indication as received from the transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrxdRxInd {
    pub version: u8,
    pub tn: u8,
    pub frame: FrameNumber,
    /// dBm
    pub rssi: i8,
    pub toa256: i16,
    /// No burst was detected, `bits` is empty (v1 only)
    pub nope: bool,
    pub modulation: Modulation,
    /// Training sequence the burst was detected with (v1 only)
    pub tsc: u8,
    /// Carrier to interference ratio in centiBels (v1 only)
    pub ci_cb: i16,
    pub bits: Vec<SoftBit>,
}

impl TrxdRxInd {
    pub fn new(tn: u8, frame: FrameNumber, rssi: i8, toa256: i16, bits: Vec<SoftBit>) -> Self {
        Self {
            version: 0,
            tn,
            frame,
            rssi,
            toa256,
            nope: false,
            modulation: Modulation::from_burst_len(bits.len()).unwrap_or(Modulation::Gmsk),
            tsc: 0,
            ci_cb: 0,
            bits,
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self, TrxdError> {
        let first = *buf.first().ok_or(TrxdError::TooShort { len: 0, needed: 1 })?;
        let version = first >> 4;
        let hdr_len = header_len(version)?;
        if buf.len() < hdr_len {
            return Err(TrxdError::TooShort { len: buf.len(), needed: hdr_len });
        }

        let tn = first & 0x0f;
        if tn as usize >= TRX_TS_COUNT {
            return Err(TrxdError::IllegalTimeslot(tn));
        }
        let raw_fn = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        let frame = FrameNumber::checked(raw_fn).ok_or(TrxdError::IllegalFrameNumber(raw_fn))?;
        let rssi = -(buf[5].min(128) as i16) as i8;
        let toa256 = i16::from_be_bytes([buf[6], buf[7]]);

        let mut ind = TrxdRxInd {
            version,
            tn,
            frame,
            rssi,
            toa256,
            nope: false,
            modulation: Modulation::Gmsk,
            tsc: 0,
            ci_cb: 0,
            bits: Vec::new(),
        };

        let payload = &buf[hdr_len..];
        let burst = if version == 0 {
            // Strip the padding if present
            match payload.len() {
                GSM_NBITS_NB_GMSK_BURST | GSM_NBITS_NB_8PSK_BURST => payload,
                n if n == GSM_NBITS_NB_GMSK_BURST + TRXD_V0_PADDING || n == GSM_NBITS_NB_8PSK_BURST + TRXD_V0_PADDING => {
                    &payload[..n - TRXD_V0_PADDING]
                }
                n if n < GSM_NBITS_NB_GMSK_BURST => {
                    return Err(TrxdError::TooShort { len: buf.len(), needed: hdr_len + GSM_NBITS_NB_GMSK_BURST });
                }
                n => return Err(TrxdError::BadBurstLength(n)),
            }
        } else {
            let mts = buf[8];
            ind.ci_cb = i16::from_be_bytes([buf[9], buf[10]]);
            ind.tsc = mts & 0x07;
            if mts & MTS_NOPE != 0 {
                ind.nope = true;
                return Ok(ind);
            }
            let m = (mts >> 3) & 0x0f;
            ind.modulation = match m & 0b1110 {
                0b0000 | 0b0010 => Modulation::Gmsk,
                MTS_MOD_8PSK => Modulation::Psk8,
                _ => return Err(TrxdError::UnsupportedModulation(m)),
            };
            if payload.len() != ind.modulation.burst_len() {
                return Err(TrxdError::BadBurstLength(payload.len()));
            }
            payload
        };

        ind.modulation = Modulation::from_burst_len(burst.len()).ok_or(TrxdError::BadBurstLength(burst.len()))?;
        ind.bits = burst.iter().map(|&b| usbit_to_sbit(b)).collect();
        Ok(ind)
    }

    pub fn encode(&self) -> Vec<u8> {
        let hdr_len = if self.version == 0 { TRXD_HDR_LEN_V0 } else { TRXD_HDR_LEN_V1 };
        let mut buf = Vec::with_capacity(hdr_len + self.bits.len());
        buf.push((self.version << 4) | (self.tn & 0x0f));
        buf.extend_from_slice(&self.frame.value().to_be_bytes());
        buf.push((-(self.rssi as i16)).clamp(0, 255) as u8);
        buf.extend_from_slice(&self.toa256.to_be_bytes());

        if self.version != 0 {
            let mts = if self.nope {
                MTS_NOPE
            } else {
                let m = match self.modulation {
                    Modulation::Gmsk => MTS_MOD_GMSK,
                    Modulation::Psk8 => MTS_MOD_8PSK,
                };
                m << 3
            };
            buf.push(mts | (self.tsc & 0x07));
            buf.extend_from_slice(&self.ci_cb.to_be_bytes());
            if self.nope {
                return buf;
            }
        }

        buf.extend(self.bits.iter().map(|&s| sbit_to_usbit(s)));
        buf
    }

    /// Scheduler view of this indication. Missing bursts become substitutes.
    pub fn into_burst(self) -> RxBurst {
        if self.nope {
            return RxBurst { rssi: self.rssi, ..RxBurst::substitute(self.tn, self.frame) };
        }
        RxBurst::new(self.tn, self.frame, self.rssi, self.toa256, self.bits)
    }
}

/// Burst request towards the transceiver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrxdTxReq {
    pub version: u8,
    pub tn: u8,
    pub frame: FrameNumber,
    /// Attenuation in dB relative to full power
    pub att: u8,
    pub bits: Vec<UBit>,
}

impl TrxdTxReq {
    pub fn from_burst(burst: &TxBurst, version: u8, att: u8) -> Self {
        Self { version, tn: burst.tn, frame: burst.frame, att, bits: burst.bits.clone() }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TRXD_TX_HDR_LEN + self.bits.len());
        buf.push((self.version << 4) | (self.tn & 0x0f));
        buf.extend_from_slice(&self.frame.value().to_be_bytes());
        buf.push(self.att);
        buf.extend_from_slice(&self.bits);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, TrxdError> {
        if buf.len() < TRXD_TX_HDR_LEN {
            return Err(TrxdError::TooShort { len: buf.len(), needed: TRXD_TX_HDR_LEN });
        }
        let version = buf[0] >> 4;
        header_len(version)?;
        let tn = buf[0] & 0x0f;
        if tn as usize >= TRX_TS_COUNT {
            return Err(TrxdError::IllegalTimeslot(tn));
        }
        let raw_fn = u32::from_be_bytes([buf[1], buf[2], buf[3], buf[4]]);
        if raw_fn >= GSM_HYPERFRAME {
            return Err(TrxdError::IllegalFrameNumber(raw_fn));
        }
        let bits = &buf[TRXD_TX_HDR_LEN..];
        if Modulation::from_burst_len(bits.len()).is_none() {
            return Err(TrxdError::BadBurstLength(bits.len()));
        }
        Ok(Self { version, tn, frame: FrameNumber::new(raw_fn), att: buf[5], bits: bits.to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v0_datagram(tn: u8, fn_: u32, rssi: u8, toa: i16, soft: u8, len: usize) -> Vec<u8> {
        let mut buf = vec![tn];
        buf.extend_from_slice(&fn_.to_be_bytes());
        buf.push(rssi);
        buf.extend_from_slice(&toa.to_be_bytes());
        buf.extend(std::iter::repeat_n(soft, len));
        buf
    }

    #[test]
    fn test_decode_v0() {
        let ind = TrxdRxInd::decode(&v0_datagram(3, 2_715_647, 80, -256, 0, 150)).unwrap();
        assert_eq!(ind.tn, 3);
        assert_eq!(ind.frame, FrameNumber::new(2_715_647));
        assert_eq!(ind.rssi, -80);
        assert_eq!(ind.toa256, -256);
        assert_eq!(ind.bits.len(), 148);
        assert!(ind.bits.iter().all(|&b| b == 127));

        let ind = TrxdRxInd::decode(&v0_datagram(0, 0, 60, 0, 255, 444)).unwrap();
        assert_eq!(ind.modulation, Modulation::Psk8);
        assert!(ind.bits.iter().all(|&b| b == -127));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            TrxdRxInd::decode(&v0_datagram(0, 0, 0, 0, 0, 100)),
            Err(TrxdError::TooShort { len: 108, needed: 156 })
        );
        assert_eq!(TrxdRxInd::decode(&v0_datagram(0, 0, 0, 0, 0, 200)), Err(TrxdError::BadBurstLength(200)));
        assert_eq!(TrxdRxInd::decode(&v0_datagram(8, 0, 0, 0, 0, 148)), Err(TrxdError::IllegalTimeslot(8)));
        assert_eq!(
            TrxdRxInd::decode(&v0_datagram(0, 2_715_648, 0, 0, 0, 148)),
            Err(TrxdError::IllegalFrameNumber(2_715_648))
        );
        assert_eq!(TrxdRxInd::decode(&v0_datagram(0x20, 0, 0, 0, 0, 148)), Err(TrxdError::UnsupportedVersion(2)));
        assert_eq!(TrxdRxInd::decode(&[0x10, 0, 0]), Err(TrxdError::TooShort { len: 3, needed: 11 }));
        assert_eq!(TrxdRxInd::decode(&[]), Err(TrxdError::TooShort { len: 0, needed: 1 }));
    }

    #[test]
    fn test_v1_round_trip() {
        let bits: Vec<SoftBit> = (0..148).map(|i| (i as i16 - 74) as SoftBit).collect();
        let mut ind = TrxdRxInd::new(5, FrameNumber::new(1_000_000), -101, 37, bits);
        ind.version = 1;
        ind.tsc = 6;
        ind.ci_cb = -42;
        assert_eq!(TrxdRxInd::decode(&ind.encode()), Ok(ind));
    }

    #[test]
    fn test_v1_nope() {
        let mut ind = TrxdRxInd::new(2, FrameNumber::new(51), -110, 0, Vec::new());
        ind.version = 1;
        ind.nope = true;
        let buf = ind.encode();
        assert_eq!(buf.len(), TRXD_HDR_LEN_V1);
        let decoded = TrxdRxInd::decode(&buf).unwrap();
        assert!(decoded.nope);
        assert!(decoded.bits.is_empty());

        let burst = decoded.into_burst();
        assert!(burst.substituted);
        assert_eq!(burst.bits.len(), 148);
        assert_eq!(burst.rssi, -110);
    }

    #[test]
    fn test_v1_bad_modulation_length() {
        let mut buf = TrxdRxInd::new(0, FrameNumber::new(0), -50, 0, vec![0; 148]).encode();
        buf[0] |= 0x10;
        // Insert MTS claiming 8PSK, plus C/I
        buf.splice(8..8, [MTS_MOD_8PSK << 3, 0, 0]);
        assert_eq!(TrxdRxInd::decode(&buf), Err(TrxdError::BadBurstLength(148)));
        buf[8] = 0b0111 << 3;
        assert_eq!(TrxdRxInd::decode(&buf), Err(TrxdError::UnsupportedModulation(0b0111)));
    }

    #[test]
    fn test_tx_request() {
        let burst = TxBurst { tn: 7, frame: FrameNumber::new(0x0102_0304 % GSM_HYPERFRAME), bits: vec![1; 148] };
        let req = TrxdTxReq::from_burst(&burst, 1, 10);
        let buf = req.encode();
        assert_eq!(buf[0], 0x17);
        assert_eq!(&buf[1..5], &burst.frame.value().to_be_bytes());
        assert_eq!(buf[5], 10);
        assert_eq!(buf.len(), 6 + 148);
        assert_eq!(TrxdTxReq::decode(&buf), Ok(req));
        assert_eq!(TrxdTxReq::decode(&buf[..100]), Err(TrxdError::BadBurstLength(94)));
    }
}
