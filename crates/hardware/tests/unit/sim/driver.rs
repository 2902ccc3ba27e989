//! Driver front-end tests.

use pretty_assertions::assert_eq;
use tcmbus_core::bus::ResponseCode;
use tcmbus_core::common::{BusAddr, Precondition};
use tcmbus_core::config::{Config, RegionConfig, RegionKind};
use tcmbus_core::core::{DeviceState, ScriptedHart};
use tcmbus_core::soc::devices::csr::{PC_START_HI, PC_START_LO, STATUS};
use tcmbus_core::DriverError;

use crate::common::harness::{CSR_BASE, DTCM_BASE, ITCM_BASE, TCM_SIZE, TestContext, pattern};

fn tcm_only() -> Config {
    let mut config = Config::default();
    config.memory.regions = vec![RegionConfig {
        name: "tcm".into(),
        kind: RegionKind::Tcm,
        base: 0,
        size: 0x1_0000,
        latency: 1,
    }];
    config
}

// ══════════════════════════════════════════════════════════
// 1. Memory access
// ══════════════════════════════════════════════════════════

#[test]
fn words_are_little_endian() {
    let mut ctx = TestContext::new().loaded();
    ctx.driver.write_word(DTCM_BASE + 0x10, 0x1122_3344).unwrap();
    assert_eq!(
        ctx.driver.read(DTCM_BASE + 0x10, 4).unwrap(),
        vec![0x44, 0x33, 0x22, 0x11]
    );
    assert_eq!(ctx.driver.read_word(DTCM_BASE + 0x11).unwrap(), 0x0011_2233);
}

#[test]
fn large_transfer_across_burst_boundaries_round_trips() {
    let mut ctx = TestContext::new().loaded();
    let data = pattern(10_000, 3);
    ctx.driver.write(DTCM_BASE + 0xFF9, &data).unwrap();
    assert_eq!(ctx.driver.read(DTCM_BASE + 0xFF9, 10_000).unwrap(), data);
    assert!(ctx.driver.stats().bursts_issued > 2 * (10_000 / 256));
}

#[test]
fn whole_bank_is_addressable_up_to_its_last_byte() {
    let mut ctx = TestContext::new().loaded();
    ctx.driver.write(ITCM_BASE + TCM_SIZE - 1, &[0x5A]).unwrap();
    assert_eq!(ctx.driver.read(ITCM_BASE + TCM_SIZE - 1, 1).unwrap(), vec![0x5A]);
}

#[test]
fn zero_length_requests_are_rejected_before_the_bus() {
    let mut ctx = TestContext::new().loaded();
    let err = ctx.driver.read(DTCM_BASE, 0).unwrap_err();
    assert_eq!(
        err.precondition(),
        Some(&Precondition::ZeroLength(BusAddr(DTCM_BASE)))
    );
    assert!(ctx.driver.write(DTCM_BASE, &[]).is_err());
    assert_eq!(ctx.driver.stats().bursts_issued, 0);
}

#[test]
fn out_of_bounds_requests_are_rejected_before_the_bus() {
    let mut ctx = TestContext::new().loaded();
    let crossing = ctx.driver.read(ITCM_BASE + TCM_SIZE - 2, 4).unwrap_err();
    assert!(crossing.precondition().unwrap().is_alignment_or_bounds());
    let unmapped = ctx.driver.write(0x00F0_0000, &[1]).unwrap_err();
    assert!(unmapped.precondition().unwrap().is_alignment_or_bounds());
    assert_eq!(ctx.driver.stats().bursts_issued, 0);
    assert_eq!(ctx.driver.cycle_count(), 0);
}

#[test]
fn refused_write_aborts_with_the_failing_burst() {
    let mut ctx = TestContext::new().loaded();
    let err = ctx.driver.write_word(CSR_BASE + STATUS, 1).unwrap_err();
    match err {
        DriverError::BusResponse { descriptor, code } => {
            assert_eq!(code, ResponseCode::SlaveError);
            assert_eq!(descriptor.base, BusAddr(CSR_BASE));
        }
        other => panic!("expected a bus response error, got {other:?}"),
    }
}

#[test]
fn start_pc_accepts_a_full_64_bit_write() {
    let mut ctx = TestContext::new().loaded();
    ctx.driver
        .write(CSR_BASE + PC_START_LO, &0x0000_0001_0000_0040u64.to_le_bytes())
        .unwrap();
    assert_eq!(ctx.driver.read_word(CSR_BASE + PC_START_HI).unwrap(), 1);
    assert_eq!(ctx.driver.read_word(CSR_BASE + PC_START_LO).unwrap(), 0x40);
}

// ══════════════════════════════════════════════════════════
// 2. Execution
// ══════════════════════════════════════════════════════════

#[test]
fn execute_from_programs_start_pc_and_runs() {
    let mut ctx = TestContext::new().loaded();
    ctx.driver.execute_from(0x100).unwrap();
    assert_eq!(ctx.driver.state(), DeviceState::Running);
    assert_eq!(ctx.driver.read_register("pc").unwrap(), "0x100");
    assert_eq!(ctx.driver.read_word(CSR_BASE + PC_START_LO).unwrap(), 0x100);
    assert_eq!(ctx.driver.controller().entry_point(), Some(0x100));
}

#[test]
fn execute_from_without_csr_block_records_entry_directly() {
    let mut ctx = TestContext::with_config(tcm_only()).loaded();
    ctx.driver.execute_from(0x40).unwrap();
    assert_eq!(ctx.driver.controller().entry_point(), Some(0x40));
    assert_eq!(ctx.driver.read_register("pc").unwrap(), "0x40");
}

#[test]
fn execute_from_requires_a_loaded_device() {
    let mut ctx = TestContext::new();
    let err = ctx.driver.execute_from(0x100).unwrap_err();
    assert!(matches!(
        err.precondition(),
        Some(Precondition::InvalidState {
            state: DeviceState::Reset,
            ..
        })
    ));
}

#[test]
fn run_to_halt_reports_cycles_waited() {
    let mut ctx = TestContext::with_hart(Config::default(), ScriptedHart::halting_after(12)).loaded();
    assert_eq!(ctx.driver.run_to_halt(100).unwrap(), 12);
    assert_eq!(ctx.driver.cycle_count(), 12);
    assert_eq!(ctx.driver.read_register("mcycle").unwrap(), "0xc");
}

#[test]
fn unknown_register_is_reported_by_name() {
    let ctx = TestContext::new();
    let err = ctx.driver.read_register("f31").unwrap_err();
    assert_eq!(
        err.precondition(),
        Some(&Precondition::UnknownRegister("f31".into()))
    );
    assert_eq!(err.to_string(), "precondition violated: unknown register `f31`");
}

#[test]
fn memory_survives_reset_and_reload() {
    let mut ctx = TestContext::new().loaded();
    ctx.driver.write(DTCM_BASE, &[9, 8, 7]).unwrap();
    ctx.driver.reset();
    assert!(ctx.driver.read(DTCM_BASE, 3).is_err());
    ctx = ctx.loaded();
    assert_eq!(ctx.driver.read(DTCM_BASE, 3).unwrap(), vec![9, 8, 7]);
}

#[test]
fn write_abandoned_by_timeout_never_lands_after_reset() {
    let mut config = Config::default();
    config.system.response_timeout_cycles = 60;
    for region in &mut config.memory.regions {
        if region.kind == RegionKind::Tcm {
            region.latency = 50;
        }
    }
    let mut ctx = TestContext::with_config(config).loaded();

    let err = ctx.driver.write(DTCM_BASE, &[0xAA; 256]).unwrap_err();
    assert!(matches!(
        err,
        DriverError::ResponseTimeout {
            outstanding: 1,
            cycles: 60
        }
    ));

    ctx.driver.reset();
    ctx = ctx.loaded();
    assert_eq!(ctx.driver.step(200), 200);
    assert_eq!(ctx.driver.read(DTCM_BASE, 4).unwrap(), vec![0; 4]);
    assert_eq!(ctx.driver.report().stats.abandoned_responses, 0);
}
