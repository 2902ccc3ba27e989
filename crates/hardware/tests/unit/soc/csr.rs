//! CSR block tests.

use pretty_assertions::assert_eq;
use tcmbus_core::bus::ResponseCode;
use tcmbus_core::soc::devices::CsrBlock;
use tcmbus_core::soc::devices::csr::{
    CYCLE_HI, CYCLE_LO, PC_START_HI, PC_START_LO, STATUS, STATUS_HALTED,
};
use tcmbus_core::soc::traits::BusTarget;

fn csr() -> CsrBlock {
    CsrBlock::new("csr", 0x0020_0000, 0x1000, 1)
}

fn read_word(block: &mut CsrBlock, offset: u64) -> u32 {
    let mut buf = [0u8; 4];
    assert_eq!(block.read(offset, &mut buf), ResponseCode::Okay);
    u32::from_le_bytes(buf)
}

#[test]
fn pc_start_is_written_as_two_words() {
    let mut block = csr();
    let pc: u64 = 0x1234_5678_9ABC_DEF0;
    assert_eq!(block.write(PC_START_LO, &pc.to_le_bytes()), ResponseCode::Okay);
    assert_eq!(block.pc_start(), pc);
    assert_eq!(read_word(&mut block, PC_START_LO), 0x9ABC_DEF0);
    assert_eq!(read_word(&mut block, PC_START_HI), 0x1234_5678);

    assert_eq!(block.write(PC_START_HI, &0u32.to_le_bytes()), ResponseCode::Okay);
    assert_eq!(block.pc_start(), 0x9ABC_DEF0);
}

#[test]
fn partial_or_unaligned_writes_are_refused() {
    let mut block = csr();
    assert_eq!(block.write(PC_START_LO, &[1, 2]), ResponseCode::SlaveError);
    assert_eq!(block.write(PC_START_LO + 1, &[1, 2, 3, 4]), ResponseCode::SlaveError);
    assert_eq!(block.pc_start(), 0);
}

#[test]
fn write_touching_a_read_only_word_changes_nothing() {
    let mut block = csr();
    let data = [0xFFu8; 12];
    assert_eq!(block.write(PC_START_LO, &data), ResponseCode::SlaveError);
    assert_eq!(block.pc_start(), 0);
    assert_eq!(block.write(STATUS, &[1, 0, 0, 0]), ResponseCode::SlaveError);
    assert_eq!(block.status(), 0);
    assert_eq!(block.write(0x100, &[0; 4]), ResponseCode::SlaveError);
}

#[test]
fn reads_of_any_width_see_register_bytes() {
    let mut block = csr();
    block.set_status(STATUS_HALTED);
    block.set_pc_start(0x8000_0040);
    let mut buf = [0u8; 16];
    assert_eq!(block.read(0, &mut buf), ResponseCode::Okay);
    assert_eq!(&buf[..4], &[0x40, 0x00, 0x00, 0x80]);
    assert_eq!(buf[8], 1);
    assert!(buf[12..].iter().all(|b| *b == 0));

    let mut one = [0u8; 1];
    assert_eq!(block.read(3, &mut one), ResponseCode::Okay);
    assert_eq!(one[0], 0x80);
}

#[test]
fn cycle_counter_follows_tick_and_reset_clears() {
    let mut block = csr();
    block.tick(0x1_0000_0002);
    assert_eq!(read_word(&mut block, CYCLE_LO), 2);
    assert_eq!(read_word(&mut block, CYCLE_HI), 1);

    block.set_pc_start(0x40);
    block.set_status(STATUS_HALTED);
    block.reset();
    assert_eq!(read_word(&mut block, CYCLE_LO), 0);
    assert_eq!(block.pc_start(), 0);
    assert_eq!(block.status(), 0);
}

#[test]
fn reserved_offsets_read_as_zero() {
    let mut block = csr();
    block.set_pc_start(u64::MAX);
    assert_eq!(read_word(&mut block, 0x0C), 0);
    assert_eq!(read_word(&mut block, 0xFFC), 0);
}
