//! Transaction scheduler tests.
//!
//! Verifies issue-order draining under out-of-order completion, the pipeline depth
//! limit, error surfacing, and that abandoned or unknown responses are never matched.

use pretty_assertions::assert_eq;
use tcmbus_core::bus::descriptor::full_mask;
use tcmbus_core::bus::{BurstDescriptor, ResponseCode, Scheduler, TransactionKind};
use tcmbus_core::common::{BusAddr, DriverError};
use tcmbus_core::config::Config;
use tcmbus_core::core::{ExecutionController, ScriptedHart};
use tcmbus_core::soc::System;

use crate::common::harness::{CSR_BASE, DTCM_BASE, init_tracing};

fn setup(config: &Config) -> (Scheduler, ExecutionController<ScriptedHart>) {
    init_tracing();
    let ctl = ExecutionController::new(System::new(config, ScriptedHart::new()));
    (Scheduler::new(&config.system, true), ctl)
}

fn full(addr: u64, beats: u64) -> BurstDescriptor {
    BurstDescriptor {
        base: BusAddr(addr),
        beats,
        width: 16,
        first_mask: full_mask(16),
        last_mask: full_mask(16),
    }
}

// ══════════════════════════════════════════════════════════
// 1. Ordering
// ══════════════════════════════════════════════════════════

#[test]
fn drain_returns_issue_order_when_completion_is_reordered() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);

    let slow = full(DTCM_BASE, 16);
    let fast = full(CSR_BASE, 1);
    let _ = sched.issue(&mut ctl, TransactionKind::Read, slow, Vec::new()).unwrap();
    let _ = sched.issue(&mut ctl, TransactionKind::Read, fast, Vec::new()).unwrap();

    let responses = sched.drain(&mut ctl).unwrap();
    let order: Vec<BusAddr> = responses.iter().map(|r| r.descriptor.base).collect();
    assert_eq!(order, vec![slow.base, fast.base]);
    assert_eq!(responses[0].data.len(), 256);
    assert_eq!(responses[1].data.len(), 16);
    assert_eq!(sched.outstanding(), 0);
}

#[test]
fn write_burst_lands_in_memory() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);

    let data: Vec<u8> = (0..32).collect();
    let _ = sched
        .issue(&mut ctl, TransactionKind::Write, full(DTCM_BASE, 2), data.clone())
        .unwrap();
    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 2), Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses[0].code, ResponseCode::Okay);
    assert_eq!(responses[1].data, data);
}

// ══════════════════════════════════════════════════════════
// 2. Pipelining
// ══════════════════════════════════════════════════════════

#[test]
fn in_flight_never_exceeds_pipeline_depth() {
    let mut config = Config::default();
    config.system.pipeline_depth = 2;
    let (mut sched, mut ctl) = setup(&config);

    for i in 0..6 {
        let _ = sched
            .issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE + 16 * i, 1), Vec::new())
            .unwrap();
        assert!(sched.in_flight() <= 2);
    }
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 6);
    assert_eq!(sched.stats().peak_outstanding, 2);
    assert_eq!(sched.stats().bursts_issued, 6);
    assert!(ctl.cycles() > 0);
}

#[test]
fn tickets_carry_unique_increasing_tags() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);
    let a = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 1), Vec::new()).unwrap();
    let b = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 1), Vec::new()).unwrap();
    assert!(b.tag() > a.tag());
    let _ = sched.drain(&mut ctl).unwrap();
}

// ══════════════════════════════════════════════════════════
// 3. Errors
// ══════════════════════════════════════════════════════════

#[test]
fn decode_error_is_surfaced_not_retried() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);
    let _ = sched
        .issue(&mut ctl, TransactionKind::Read, full(0x0030_0000, 1), Vec::new())
        .unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].code, ResponseCode::DecodeError);
    assert!(responses[0].data.is_empty());
    assert_eq!(sched.stats().bus_errors, 1);
    assert_eq!(sched.stats().bursts_issued, 1);
}

#[test]
fn response_timeout_abandons_outstanding_bursts() {
    let mut config = Config::default();
    config.system.response_timeout_cycles = 3;
    let (mut sched, mut ctl) = setup(&config);

    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 16), Vec::new()).unwrap();
    let err = sched.drain(&mut ctl).unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        DriverError::ResponseTimeout { outstanding: 1, cycles: 3 }
    ));
    assert_eq!(sched.outstanding(), 0);

    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(CSR_BASE, 1), Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].descriptor.base, BusAddr(CSR_BASE));

    for _ in 0..32 {
        ctl.cycle();
    }
    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(CSR_BASE, 1), Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(sched.stats().abandoned_responses, 1);
}

// ══════════════════════════════════════════════════════════
// 4. Cancellation
// ══════════════════════════════════════════════════════════

#[test]
fn abandoned_response_is_discarded_when_it_arrives() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);

    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 4), Vec::new()).unwrap();
    assert_eq!(sched.abandon_outstanding(), 1);
    for _ in 0..16 {
        ctl.cycle();
    }

    let fresh = full(DTCM_BASE + 0x100, 1);
    let _ = sched.issue(&mut ctl, TransactionKind::Read, fresh, Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].descriptor, fresh);
    assert_eq!(sched.stats().abandoned_responses, 1);
    assert_eq!(sched.stats().responses, 1);
}

#[test]
fn reset_forgets_bursts_issued_before_it() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);

    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE, 4), Vec::new()).unwrap();
    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(CSR_BASE, 1), Vec::new()).unwrap();
    for _ in 0..3 {
        ctl.cycle();
    }
    sched.reset(&mut ctl);
    assert_eq!(sched.outstanding(), 0);
    assert_eq!(ctl.bus_mut().in_flight(), 0);
    assert_eq!(sched.stats().abandoned_responses, 1);

    for _ in 0..16 {
        ctl.cycle();
    }
    let fresh = full(DTCM_BASE + 0x100, 1);
    let _ = sched.issue(&mut ctl, TransactionKind::Read, fresh, Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].descriptor, fresh);
    assert_eq!(sched.stats().abandoned_responses, 1);
    assert_eq!(sched.stats().stray_responses, 0);
}

#[test]
fn response_with_unknown_tag_is_counted_as_stray() {
    let config = Config::default();
    let (mut sched, mut ctl) = setup(&config);

    ctl.bus_mut()
        .submit(9_999, TransactionKind::Read, full(DTCM_BASE, 1), Vec::new());
    let _ = sched.issue(&mut ctl, TransactionKind::Read, full(DTCM_BASE + 16, 1), Vec::new()).unwrap();
    let responses = sched.drain(&mut ctl).unwrap();
    assert_eq!(responses.len(), 1);
    assert_eq!(sched.stats().stray_responses, 1);
}
