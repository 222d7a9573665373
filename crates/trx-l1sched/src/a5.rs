//! A5/1 and A5/2 keystream generators (3GPP TS 43.020 and 55.216)
//! See also https://cryptome.org/gsm-a512.htm

use trx_core::burst::{CIPHER_FIELD_LEN, CIPHER_FIELD_OFFSETS, GSM_NBITS_NB_GMSK_BURST};
use trx_core::{FrameNumber, SoftBit, UBit};

use crate::SchedError;

/// Longest key accepted by the scheduler (room for A5/4)
pub const A5_KEY_MAX_LEN: usize = 16;
/// Key bytes used by A5/1 and A5/2
pub const A5_12_KEY_LEN: usize = 8;
/// Keystream bits per burst and direction
pub const A5_KEYSTREAM_LEN: usize = 2 * CIPHER_FIELD_LEN;

const R1_LEN: u32 = 19;
const R2_LEN: u32 = 22;
const R3_LEN: u32 = 23;
const R4_LEN: u32 = 17;

const R1_MASK: u32 = (1 << R1_LEN) - 1;
const R2_MASK: u32 = (1 << R2_LEN) - 1;
const R3_MASK: u32 = (1 << R3_LEN) - 1;
const R4_MASK: u32 = (1 << R4_LEN) - 1;

const R1_TAPS: u32 = 0x072000; // x^19 + x^5 + x^2 + x + 1
const R2_TAPS: u32 = 0x300000; // x^22 + x + 1
const R3_TAPS: u32 = 0x700080; // x^23 + x^15 + x^2 + x + 1
const R4_TAPS: u32 = 0x010800; // x^17 + x^5 + 1

const A51_CLKBITS: [u32; 3] = [0x000100, 0x000400, 0x000400];
const A52_R4_CLKBITS: [u32; 3] = [0x000400, 0x000008, 0x000080];

/// Keystream for one frame in both directions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystream {
    pub dl: [UBit; A5_KEYSTREAM_LEN],
    pub ul: [UBit; A5_KEYSTREAM_LEN],
}

#[inline]
fn parity(mut x: u32) -> u32 {
    x ^= x >> 16;
    x ^= x >> 8;
    x ^= x >> 4;
    x ^= x >> 2;
    x ^= x >> 1;
    x & 1
}

#[inline]
fn majority(v1: u32, v2: u32, v3: u32) -> u32 {
    ((v1 != 0) as u32 + (v2 != 0) as u32 + (v3 != 0) as u32 >= 2) as u32
}

#[inline]
fn clock_reg(r: u32, mask: u32, taps: u32) -> u32 {
    ((r << 1) & mask) | parity(r & taps)
}

/// COUNT parameter: T1' (11 bits) | T3 (6 bits) | T2 (5 bits)
fn fn_count(frame: FrameNumber) -> u32 {
    ((frame.t1() % 2048) << 11) | (frame.t3() << 5) | frame.t2()
}

/// Checks that `algo` and `key` can be used for ciphering
pub fn check_key(algo: u8, key: &[u8]) -> Result<(), SchedError> {
    if key.len() > A5_KEY_MAX_LEN {
        return Err(SchedError::KeyTooLong(key.len()));
    }
    match algo {
        0 => Ok(()),
        1 | 2 if key.len() < A5_12_KEY_LEN => Err(SchedError::InvalidKeyLength(key.len())),
        1 | 2 => Ok(()),
        _ => Err(SchedError::UnsupportedCipher(algo)),
    }
}

/// Generates the keystream of A5/`algo` for a frame
pub fn keystream(algo: u8, key: &[u8], frame: FrameNumber) -> Result<Keystream, SchedError> {
    check_key(algo, key)?;
    let mut ks = Keystream { dl: [0; A5_KEYSTREAM_LEN], ul: [0; A5_KEYSTREAM_LEN] };
    match algo {
        1 => A51::new(key, fn_count(frame)).run(&mut ks),
        2 => A52::new(key, fn_count(frame)).run(&mut ks),
        _ => {}
    }
    Ok(ks)
}

fn key_bit(key: &[u8], i: usize) -> u32 {
    ((key[7 - (i >> 3)] >> (i & 7)) & 1) as u32
}

struct A51 {
    r: [u32; 3],
}

impl A51 {
    fn new(key: &[u8], count: u32) -> Self {
        let mut s = A51 { r: [0; 3] };
        for i in 0..64 {
            s.load_bit(key_bit(key, i));
        }
        for i in 0..22 {
            s.load_bit((count >> i) & 1);
        }
        for _ in 0..100 {
            s.clock(false);
        }
        s
    }

    fn load_bit(&mut self, b: u32) {
        self.clock(true);
        for reg in self.r.iter_mut() {
            *reg ^= b;
        }
    }

    fn clock(&mut self, force: bool) {
        let cb = [
            (self.r[0] & A51_CLKBITS[0] != 0) as u32,
            (self.r[1] & A51_CLKBITS[1] != 0) as u32,
            (self.r[2] & A51_CLKBITS[2] != 0) as u32,
        ];
        let maj = majority(cb[0], cb[1], cb[2]);

        if force || maj == cb[0] {
            self.r[0] = clock_reg(self.r[0], R1_MASK, R1_TAPS);
        }
        if force || maj == cb[1] {
            self.r[1] = clock_reg(self.r[1], R2_MASK, R2_TAPS);
        }
        if force || maj == cb[2] {
            self.r[2] = clock_reg(self.r[2], R3_MASK, R3_TAPS);
        }
    }

    fn output(&self) -> UBit {
        ((self.r[0] >> (R1_LEN - 1)) ^ (self.r[1] >> (R2_LEN - 1)) ^ (self.r[2] >> (R3_LEN - 1))) as UBit
    }

    fn run(mut self, ks: &mut Keystream) {
        for bit in ks.dl.iter_mut().chain(ks.ul.iter_mut()) {
            self.clock(false);
            *bit = self.output();
        }
    }
}

struct A52 {
    r: [u32; 4],
    /// Output is delayed by one clock
    db: UBit,
}

impl A52 {
    fn new(key: &[u8], count: u32) -> Self {
        let mut s = A52 { r: [0; 4], db: 0 };
        for i in 0..64 {
            s.load_bit(key_bit(key, i));
        }
        for i in 0..22 {
            s.load_bit((count >> i) & 1);
        }

        s.r[0] |= 1 << 15;
        s.r[1] |= 1 << 16;
        s.r[2] |= 1 << 18;
        s.r[3] |= 1 << 10;

        for _ in 0..100 {
            s.clock(false);
        }
        s.output();
        s
    }

    fn load_bit(&mut self, b: u32) {
        self.clock(true);
        for reg in self.r.iter_mut() {
            *reg ^= b;
        }
    }

    fn clock(&mut self, force: bool) {
        let cb = [
            (self.r[3] & A52_R4_CLKBITS[0] != 0) as u32,
            (self.r[3] & A52_R4_CLKBITS[1] != 0) as u32,
            (self.r[3] & A52_R4_CLKBITS[2] != 0) as u32,
        ];
        let maj = (cb[0] + cb[1] + cb[2] >= 2) as u32;

        if force || maj == cb[0] {
            self.r[0] = clock_reg(self.r[0], R1_MASK, R1_TAPS);
        }
        if force || maj == cb[1] {
            self.r[1] = clock_reg(self.r[1], R2_MASK, R2_TAPS);
        }
        if force || maj == cb[2] {
            self.r[2] = clock_reg(self.r[2], R3_MASK, R3_TAPS);
        }
        self.r[3] = clock_reg(self.r[3], R4_MASK, R4_TAPS);
    }

    fn output(&mut self) -> UBit {
        let r = &self.r;
        let tb = (r[0] >> (R1_LEN - 1)) ^ (r[1] >> (R2_LEN - 1)) ^ (r[2] >> (R3_LEN - 1));
        let out = self.db;
        self.db = (tb
            ^ majority(r[0] & 0x08000, !r[0] & 0x04000, r[0] & 0x1000)
            ^ majority(!r[1] & 0x10000, r[1] & 0x02000, r[1] & 0x0200)
            ^ majority(r[2] & 0x40000, r[2] & 0x10000, !r[2] & 0x2000)) as UBit;
        out
    }

    fn run(mut self, ks: &mut Keystream) {
        for bit in ks.dl.iter_mut().chain(ks.ul.iter_mut()) {
            self.clock(false);
            *bit = self.output();
        }
    }
}

/// XORs the two ciphered fields of an uplink normal burst with the keystream.
/// Bursts of any other length are left untouched.
pub fn cipher_ul_burst(burst: &mut [UBit], ks: &[UBit; A5_KEYSTREAM_LEN]) {
    if burst.len() != GSM_NBITS_NB_GMSK_BURST {
        return;
    }
    for (field, offset) in CIPHER_FIELD_OFFSETS.iter().enumerate() {
        let ks_field = &ks[field * CIPHER_FIELD_LEN..(field + 1) * CIPHER_FIELD_LEN];
        for (b, k) in burst[*offset..*offset + CIPHER_FIELD_LEN].iter_mut().zip(ks_field) {
            *b ^= k;
        }
    }
}

/// Flips the polarity of received soft bits where the keystream is set
pub fn decipher_dl_burst(burst: &mut [SoftBit], ks: &[UBit; A5_KEYSTREAM_LEN]) {
    if burst.len() != GSM_NBITS_NB_GMSK_BURST {
        return;
    }
    for (field, offset) in CIPHER_FIELD_OFFSETS.iter().enumerate() {
        let ks_field = &ks[field * CIPHER_FIELD_LEN..(field + 1) * CIPHER_FIELD_LEN];
        for (s, k) in burst[*offset..*offset + CIPHER_FIELD_LEN].iter_mut().zip(ks_field) {
            if *k != 0 {
                *s = s.wrapping_neg();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 8] = [0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef];
    const FN: u32 = 123456;

    /// Packs bits MSB first, the way the reference vectors are written
    fn pack(bits: &[UBit]) -> Vec<u8> {
        let mut out = vec![0u8; bits.len().div_ceil(8)];
        for (i, b) in bits.iter().enumerate() {
            out[i / 8] |= *b << (7 - (i % 8));
        }
        out
    }

    #[test]
    fn test_a5_0_is_null() {
        let ks = keystream(0, &KEY, FrameNumber::new(FN)).unwrap();
        assert!(ks.dl.iter().chain(ks.ul.iter()).all(|&b| b == 0));
    }

    #[test]
    fn test_a5_1_vectors() {
        let ks = keystream(1, &KEY, FrameNumber::new(FN)).unwrap();
        assert_eq!(
            pack(&ks.dl),
            [0xcb, 0xa2, 0x55, 0x76, 0x17, 0x5d, 0x3b, 0x1c, 0x7b, 0x2f, 0x29, 0xa8, 0xc1, 0xb6, 0x00]
        );
        assert_eq!(
            pack(&ks.ul),
            [0xd9, 0x03, 0x5e, 0x0f, 0x2a, 0xec, 0x13, 0x9a, 0x05, 0xd4, 0xa8, 0x7b, 0xb1, 0x64, 0x80]
        );
    }

    #[test]
    fn test_a5_2_vectors() {
        let ks = keystream(2, &KEY, FrameNumber::new(FN)).unwrap();
        assert_eq!(
            pack(&ks.dl),
            [0x45, 0x9c, 0x88, 0xc3, 0x82, 0xb7, 0xff, 0xb3, 0x98, 0xd2, 0xf9, 0x6e, 0x0f, 0x14, 0x80]
        );
        assert_eq!(
            pack(&ks.ul),
            [0xf0, 0x3a, 0xac, 0xde, 0xe3, 0x5b, 0x5e, 0x65, 0x80, 0xba, 0xab, 0xc0, 0x59, 0x26, 0x40]
        );
    }

    #[test]
    fn test_key_checks() {
        assert_eq!(check_key(1, &[0; 17]), Err(SchedError::KeyTooLong(17)));
        assert_eq!(check_key(2, &[0; 7]), Err(SchedError::InvalidKeyLength(7)));
        assert_eq!(check_key(3, &KEY), Err(SchedError::UnsupportedCipher(3)));
        assert!(check_key(0, &[]).is_ok());
    }

    #[test]
    fn test_cipher_involution() {
        for algo in 0..3u8 {
            for fnum in [0u32, 51, 123456, 2_715_647] {
                let ks = keystream(algo, &KEY, FrameNumber::new(fnum)).unwrap();

                let plain: Vec<UBit> = (0..148).map(|i| ((i * 7) % 3 == 0) as UBit).collect();
                let mut burst = plain.clone();
                cipher_ul_burst(&mut burst, &ks.ul);
                if algo != 0 {
                    assert_ne!(burst, plain);
                }
                // Training sequence and tail bits are never touched
                assert_eq!(&burst[61..87], &plain[61..87]);
                cipher_ul_burst(&mut burst, &ks.ul);
                assert_eq!(burst, plain);

                let soft: Vec<SoftBit> = (0..148).map(|i| (i as i16 - 74) as SoftBit).collect();
                let mut burst = soft.clone();
                decipher_dl_burst(&mut burst, &ks.dl);
                decipher_dl_burst(&mut burst, &ks.dl);
                assert_eq!(burst, soft);
            }
        }
    }
}
