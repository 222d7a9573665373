use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;
use trx_core::PchanConfig;

use super::stack_config::{
    CfgClock, CfgCtrl, CfgHopping, CfgRadio, CfgScheduler, CfgTimeslot, CfgTrxIf, FillerPattern, SharedConfig,
    StackConfig,
};

/// Build `SharedConfig` from a TOML configuration string
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    // Various sanity checks
    let expected_config_version = "0.1";
    if !root.config_version.eq(expected_config_version) {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if let Some(ref trx) = root.trx {
        if !trx.extra.is_empty() {
            return Err(format!("Unrecognized fields: trx::{:?}", sorted_keys(&trx.extra)).into());
        }
    }
    if let Some(ref ctrl) = root.ctrl {
        if !ctrl.extra.is_empty() {
            return Err(format!("Unrecognized fields: ctrl::{:?}", sorted_keys(&ctrl.extra)).into());
        }
    }
    if let Some(ref sched) = root.sched {
        if !sched.extra.is_empty() {
            return Err(format!("Unrecognized fields: sched::{:?}", sorted_keys(&sched.extra)).into());
        }
    }
    if let Some(ref clock) = root.clock {
        if !clock.extra.is_empty() {
            return Err(format!("Unrecognized fields: clock::{:?}", sorted_keys(&clock.extra)).into());
        }
    }
    if !root.radio.extra.is_empty() {
        return Err(format!("Unrecognized fields: radio::{:?}", sorted_keys(&root.radio.extra)).into());
    }
    if let Some(ref hopping) = root.radio.hopping {
        if !hopping.extra.is_empty() {
            return Err(format!("Unrecognized fields: radio.hopping::{:?}", sorted_keys(&hopping.extra)).into());
        }
    }
    for ts in root.radio.timeslots.iter().flatten() {
        if !ts.extra.is_empty() {
            return Err(format!("Unrecognized fields: radio.timeslots::{:?}", sorted_keys(&ts.extra)).into());
        }
    }

    // Build config from required and optional values
    let mut cfg = StackConfig::new(root.radio.band_arfcn);
    cfg.debug_log = root.debug_log;

    if let Some(trx) = root.trx {
        apply_trx_patch(&mut cfg.trx, trx);
    }
    if let Some(ctrl) = root.ctrl {
        apply_ctrl_patch(&mut cfg.ctrl, ctrl);
    }
    if let Some(sched) = root.sched {
        apply_sched_patch(&mut cfg.sched, sched);
    }
    if let Some(clock) = root.clock {
        apply_clock_patch(&mut cfg.clock, clock);
    }
    apply_radio_patch(&mut cfg.radio, root.radio);

    // Reported as an error here, SharedConfig would panic on it
    if let Err(e) = cfg.validate() {
        return Err(format!("Invalid configuration: {}", e).into());
    }

    Ok(SharedConfig::from_config(cfg))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    let r = BufReader::new(f);
    let cfg = from_reader(r)?;
    Ok(cfg)
}

fn apply_trx_patch(dst: &mut CfgTrxIf, src: TrxDto) {
    if let Some(v) = src.local_host {
        dst.local_host = v;
    }
    if let Some(v) = src.remote_host {
        dst.remote_host = v;
    }
    if let Some(v) = src.base_port {
        dst.base_port = v;
    }
    if let Some(v) = src.trxd_version {
        dst.trxd_version = v;
    }
}

fn apply_ctrl_patch(dst: &mut CfgCtrl, src: CtrlDto) {
    if let Some(v) = src.rsp_timeout_ms {
        dst.rsp_timeout_ms = v;
    }
    if let Some(v) = src.retry_limit {
        dst.retry_limit = v;
    }
}

fn apply_sched_patch(dst: &mut CfgScheduler, src: SchedDto) {
    if let Some(v) = src.fn_advance {
        dst.fn_advance = v;
    }
    if let Some(v) = src.tsc {
        dst.tsc = v;
    }
    if let Some(v) = src.filler {
        dst.filler = v;
    }
    if let Some(v) = src.loss_periods {
        dst.loss_periods = v;
    }
}

fn apply_clock_patch(dst: &mut CfgClock, src: ClockDto) {
    if let Some(v) = src.max_fn_skew {
        dst.max_fn_skew = v;
    }
    if let Some(v) = src.loss_frames {
        dst.loss_frames = v;
    }
}

fn apply_radio_patch(dst: &mut CfgRadio, src: RadioDto) {
    dst.band_arfcn = src.band_arfcn;

    if let Some(v) = src.pcs {
        dst.pcs = v;
    }
    if let Some(v) = src.ta {
        dst.ta = v;
    }
    if let Some(v) = src.power_attenuation {
        dst.power_attenuation = v;
    }

    dst.hopping = src.hopping.map(|h| CfgHopping { hsn: h.hsn, maio: h.maio, ma: h.ma });

    if let Some(timeslots) = src.timeslots {
        dst.timeslots = timeslots
            .into_iter()
            .map(|ts| CfgTimeslot { tn: ts.tn, pchan: ts.pchan })
            .collect();
    }
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&str> {
    let mut v: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    v.sort_unstable();
    v
}

/// ----------------------- DTOs for input shape -----------------------

#[derive(Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,

    #[serde(default)]
    trx: Option<TrxDto>,

    #[serde(default)]
    ctrl: Option<CtrlDto>,

    #[serde(default)]
    sched: Option<SchedDto>,

    #[serde(default)]
    clock: Option<ClockDto>,

    radio: RadioDto,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct TrxDto {
    pub local_host: Option<String>,
    pub remote_host: Option<String>,
    pub base_port: Option<u16>,
    pub trxd_version: Option<u8>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct CtrlDto {
    pub rsp_timeout_ms: Option<u64>,
    pub retry_limit: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct SchedDto {
    pub fn_advance: Option<u32>,
    pub tsc: Option<u8>,
    pub filler: Option<FillerPattern>,
    pub loss_periods: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Default, Deserialize)]
struct ClockDto {
    pub max_fn_skew: Option<u32>,
    pub loss_frames: Option<u32>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct RadioDto {
    pub band_arfcn: u16,
    pub pcs: Option<bool>,
    pub ta: Option<i8>,
    pub power_attenuation: Option<u8>,

    #[serde(default)]
    pub hopping: Option<HoppingDto>,

    #[serde(default)]
    pub timeslots: Option<Vec<TimeslotDto>>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct HoppingDto {
    pub hsn: u8,
    pub maio: u8,
    pub ma: Vec<u16>,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct TimeslotDto {
    pub tn: u8,
    pub pchan: PchanConfig,

    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"
        config_version = "0.1"
        debug_log = "/tmp/trxcon.log"

        [trx]
        remote_host = "192.168.1.10"
        base_port = 5700
        trxd_version = 1

        [ctrl]
        rsp_timeout_ms = 500

        [sched]
        fn_advance = 2
        tsc = 7
        filler = "Random"

        [radio]
        band_arfcn = 871
        ta = 2

        [radio.hopping]
        hsn = 5
        maio = 1
        ma = [512, 520, 530]

        [[radio.timeslots]]
        tn = 0
        pchan = "CcchSdcch4"

        [[radio.timeslots]]
        tn = 2
        pchan = "TchF"
    "#;

    #[test]
    fn test_full_config() {
        let shared = from_toml_str(FULL_CONFIG).unwrap();
        let cfg = shared.config();
        assert_eq!(cfg.debug_log.as_deref(), Some("/tmp/trxcon.log"));
        assert_eq!(cfg.trx.remote_host, "192.168.1.10");
        assert_eq!(cfg.trx.local_host, "127.0.0.1");
        assert_eq!(cfg.trx.ctrl_remote(), "192.168.1.10:5701");
        assert_eq!(cfg.trx.trxd_version, 1);
        assert_eq!(cfg.ctrl.rsp_timeout_ms, 500);
        assert_eq!(cfg.ctrl.retry_limit, 3);
        assert_eq!(cfg.sched.fn_advance, 2);
        assert_eq!(cfg.sched.filler, FillerPattern::Random);
        assert_eq!(cfg.clock.max_fn_skew, 50);
        assert_eq!(cfg.radio.hopping.as_ref().unwrap().ma, vec![512, 520, 530]);
        assert_eq!(cfg.radio.timeslots.len(), 2);
        assert_eq!(cfg.radio.timeslots[1].pchan, PchanConfig::TchF);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let shared = from_toml_str("config_version = \"0.1\"\n[radio]\nband_arfcn = 1\n").unwrap();
        let cfg = shared.config();
        assert_eq!(cfg.trx.base_port, 6700);
        assert_eq!(cfg.sched.fn_advance, 3);
        assert_eq!(cfg.radio.timeslots.len(), 1);
        assert_eq!(cfg.radio.timeslots[0].pchan, PchanConfig::Ccch);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = from_toml_str("config_version = \"0.1\"\n[radio]\nband_arfcn = 1\nfoo = 3\n").err().unwrap();
        assert!(err.to_string().contains("radio::[\"foo\"]"));

        let err = from_toml_str("config_version = \"0.1\"\nbar = 1\n[radio]\nband_arfcn = 1\n").err().unwrap();
        assert!(err.to_string().contains("top-level"));
    }

    #[test]
    fn test_rejects_wrong_version_and_invalid_values() {
        assert!(from_toml_str("config_version = \"0.5\"\n[radio]\nband_arfcn = 1\n").is_err());
        assert!(from_toml_str("config_version = \"0.1\"\n[radio]\nband_arfcn = 2000\n").is_err());
    }
}
