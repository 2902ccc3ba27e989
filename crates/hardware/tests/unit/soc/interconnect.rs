//! Interconnect tests.
//!
//! Verifies completion timing, per-target ordering, strobed writes, decode errors and
//! the zero-latency core port.

use pretty_assertions::assert_eq;
use tcmbus_core::bus::descriptor::{full_mask, lane_mask};
use tcmbus_core::bus::{BurstDescriptor, ResponseCode, TransactionKind};
use tcmbus_core::common::BusAddr;
use tcmbus_core::soc::devices::CsrBlock;
use tcmbus_core::soc::interconnect::{BusReply, Interconnect};
use tcmbus_core::soc::memory::TcmBank;
use tcmbus_core::soc::traits::MemoryPort;

const TCM: u64 = 0x1000;
const CSR: u64 = 0x8000;

fn bus() -> Interconnect {
    let mut bus = Interconnect::new();
    bus.add_target(Box::new(TcmBank::new("tcm", TCM, 0x100, 2)));
    bus.add_target(Box::new(CsrBlock::new("csr", CSR, 0x100, 1)));
    bus
}

fn burst(addr: u64, beats: u64) -> BurstDescriptor {
    BurstDescriptor {
        base: BusAddr(addr),
        beats,
        width: 16,
        first_mask: full_mask(16),
        last_mask: full_mask(16),
    }
}

/// Ticks until `n` replies have arrived, returning them in arrival order.
fn collect(bus: &mut Interconnect, n: usize) -> Vec<BusReply> {
    let mut out = Vec::new();
    for cycle in 1..=100 {
        bus.tick(cycle);
        while let Some(reply) = bus.take_response() {
            out.push(reply);
        }
        if out.len() >= n {
            break;
        }
    }
    out
}

#[test]
fn burst_completes_after_latency_plus_beats() {
    let mut bus = bus();
    bus.submit(7, TransactionKind::Read, burst(TCM, 2), Vec::new());
    assert_eq!(bus.in_flight(), 1);
    for cycle in 1..4 {
        bus.tick(cycle);
        assert_eq!(bus.take_response(), None);
    }
    bus.tick(4);
    let reply = bus.take_response().unwrap();
    assert_eq!(reply.tag, 7);
    assert_eq!(reply.code, ResponseCode::Okay);
    assert_eq!(reply.data.len(), 32);
    assert_eq!(bus.bus_cycles(), 4);
    assert_eq!(Interconnect::transit_time(2, 2), 4);
}

#[test]
fn same_target_completes_in_acceptance_order() {
    let mut bus = bus();
    bus.submit(1, TransactionKind::Read, burst(TCM, 8), Vec::new());
    bus.submit(2, TransactionKind::Read, burst(TCM + 0x80, 1), Vec::new());
    let tags: Vec<u64> = collect(&mut bus, 2).iter().map(|r| r.tag).collect();
    assert_eq!(tags, vec![1, 2]);
}

#[test]
fn different_targets_may_complete_out_of_order() {
    let mut bus = bus();
    bus.submit(1, TransactionKind::Read, burst(TCM, 8), Vec::new());
    bus.submit(2, TransactionKind::Read, burst(CSR, 1), Vec::new());
    let tags: Vec<u64> = collect(&mut bus, 2).iter().map(|r| r.tag).collect();
    assert_eq!(tags, vec![2, 1]);
}

#[test]
fn write_applies_only_strobed_lanes() {
    let mut bus = bus();
    bus.write_bytes(BusAddr(TCM), &[0x55; 32]).unwrap();

    let descriptor = BurstDescriptor {
        first_mask: lane_mask(4, 16),
        last_mask: lane_mask(0, 2),
        ..burst(TCM, 2)
    };
    bus.submit(3, TransactionKind::Write, descriptor, vec![0xAA; 32]);
    let replies = collect(&mut bus, 1);
    assert_eq!(replies[0].code, ResponseCode::Okay);
    assert!(replies[0].data.is_empty());

    let mut back = [0u8; 32];
    bus.read_bytes(BusAddr(TCM), &mut back).unwrap();
    assert_eq!(&back[..4], &[0x55; 4]);
    assert_eq!(&back[4..18], &[0xAA; 14]);
    assert_eq!(&back[18..], &[0x55; 14]);
}

#[test]
fn write_with_short_payload_answers_slave_error() {
    let mut bus = bus();
    bus.write_bytes(BusAddr(TCM), &[0x55; 4]).unwrap();
    bus.submit(1, TransactionKind::Write, burst(TCM, 2), vec![0u8; 4]);
    let replies = collect(&mut bus, 1);
    assert_eq!(replies[0].code, ResponseCode::SlaveError);

    let mut back = [0u8; 4];
    bus.read_bytes(BusAddr(TCM), &mut back).unwrap();
    assert_eq!(back, [0x55; 4]);
}

#[test]
fn aborted_bursts_never_reach_the_target() {
    let mut bus = bus();
    bus.submit(1, TransactionKind::Write, burst(TCM, 2), vec![0xAA; 32]);
    bus.submit(2, TransactionKind::Read, burst(CSR, 1), Vec::new());
    bus.tick(1);
    assert_eq!(bus.abort_in_flight(), 2);
    assert_eq!(bus.in_flight(), 0);

    for cycle in 2..20 {
        bus.tick(cycle);
    }
    assert_eq!(bus.take_response(), None);
    let mut back = [0u8; 32];
    bus.read_bytes(BusAddr(TCM), &mut back).unwrap();
    assert_eq!(back, [0; 32]);

    bus.submit(3, TransactionKind::Read, burst(TCM, 1), Vec::new());
    let replies = collect(&mut bus, 1);
    assert_eq!(replies[0].tag, 3);
    assert_eq!(bus.bus_cycles(), 19 + 3);
}

#[test]
fn unmapped_burst_answers_decode_error_next_cycle() {
    let mut bus = bus();
    bus.submit(9, TransactionKind::Read, burst(0x4000, 1), Vec::new());
    bus.tick(1);
    let reply = bus.take_response().unwrap();
    assert_eq!(reply.code, ResponseCode::DecodeError);
    assert!(reply.data.is_empty());
}

#[test]
fn burst_running_past_target_end_answers_decode_error() {
    let mut bus = bus();
    bus.submit(4, TransactionKind::Read, burst(TCM + 0xF0, 2), Vec::new());
    let replies = collect(&mut bus, 1);
    assert_eq!(replies[0].code, ResponseCode::DecodeError);
}

#[test]
fn refused_csr_write_answers_slave_error() {
    let mut bus = bus();
    let descriptor = BurstDescriptor {
        first_mask: lane_mask(8, 12),
        last_mask: lane_mask(8, 12),
        ..burst(CSR, 1)
    };
    bus.submit(5, TransactionKind::Write, descriptor, vec![1; 16]);
    let replies = collect(&mut bus, 1);
    assert_eq!(replies[0].code, ResponseCode::SlaveError);
}

#[test]
fn core_port_reaches_targets_directly() {
    let mut bus = bus();
    bus.write_bytes(BusAddr(TCM + 3), &[1, 2, 3]).unwrap();
    let mut buf = [0u8; 5];
    bus.read_bytes(BusAddr(TCM + 2), &mut buf).unwrap();
    assert_eq!(buf, [0, 1, 2, 3, 0]);

    assert_eq!(
        bus.write_bytes(BusAddr(0x4000), &[0]),
        Err(ResponseCode::DecodeError)
    );
    assert_eq!(
        bus.read_bytes(BusAddr(TCM + 0xFE), &mut buf),
        Err(ResponseCode::DecodeError)
    );
    assert_eq!(bus.bus_cycles(), 0);
}

#[test]
fn csr_block_is_found_only_when_mapped() {
    let mut bus = bus();
    assert_eq!(bus.target_count(), 2);
    assert!(bus.csr_mut().is_some());

    let mut bare = Interconnect::new();
    bare.add_target(Box::new(TcmBank::new("tcm", TCM, 0x100, 2)));
    assert!(bare.csr_mut().is_none());
}
