//! Control/status register block.
//!
//! A small register file mapped in the CSR region. The driver programs the start PC
//! here before releasing the core, and the execution controller mirrors the core's
//! run state into `STATUS` every cycle.
//!
//! # Registers
//!
//! * `0x00`: `PC_START_LO` (Read/Write)
//! * `0x04`: `PC_START_HI` (Read/Write)
//! * `0x08`: `STATUS` (Read Only)
//!   * bit 0: halted
//!   * bit 1: fault
//!   * bit 2: waiting for interrupt
//! * `0x10`: `CYCLE_LO` (Read Only)
//! * `0x14`: `CYCLE_HI` (Read Only)
//!
//! Reads may be any width; unmapped offsets read as zero. Writes must cover whole,
//! word-aligned registers. A write touching a read-only or unmapped word, or a partial
//! word, answers `SLVERR` and changes nothing.

use crate::bus::ResponseCode;
use crate::soc::traits::BusTarget;

/// Offset of the low word of the start PC.
pub const PC_START_LO: u64 = 0x00;
/// Offset of the high word of the start PC.
pub const PC_START_HI: u64 = 0x04;
/// Offset of the status register.
pub const STATUS: u64 = 0x08;
/// Offset of the low word of the cycle counter.
pub const CYCLE_LO: u64 = 0x10;
/// Offset of the high word of the cycle counter.
pub const CYCLE_HI: u64 = 0x14;

/// `STATUS` bit: core halted.
pub const STATUS_HALTED: u32 = 1 << 0;
/// `STATUS` bit: core reported a fault.
pub const STATUS_FAULT: u32 = 1 << 1;
/// `STATUS` bit: core is waiting for an interrupt.
pub const STATUS_WFI: u32 = 1 << 2;

/// Memory-mapped control/status registers.
#[derive(Clone, Debug)]
pub struct CsrBlock {
    name: String,
    base_addr: u64,
    size: u64,
    latency: u64,
    pc_start: u64,
    status: u32,
    cycle: u64,
}

impl CsrBlock {
    /// Creates a register block with all registers zero.
    ///
    /// # Arguments
    ///
    /// * `name` - Region name.
    /// * `base_addr` - Base bus address.
    /// * `size` - Size of the mapped window in bytes.
    /// * `latency` - Access latency in cycles.
    pub fn new(name: impl Into<String>, base_addr: u64, size: u64, latency: u64) -> Self {
        Self {
            name: name.into(),
            base_addr,
            size,
            latency,
            pc_start: 0,
            status: 0,
            cycle: 0,
        }
    }

    /// Current start PC.
    pub const fn pc_start(&self) -> u64 {
        self.pc_start
    }

    /// Sets the start PC (device side; used when an image is loaded).
    pub fn set_pc_start(&mut self, pc: u64) {
        self.pc_start = pc;
    }

    /// Current `STATUS` bits.
    pub const fn status(&self) -> u32 {
        self.status
    }

    /// Replaces the `STATUS` bits.
    pub fn set_status(&mut self, bits: u32) {
        self.status = bits;
    }

    /// Clears all registers, as on device reset.
    pub fn reset(&mut self) {
        self.pc_start = 0;
        self.status = 0;
        self.cycle = 0;
    }

    fn word(&self, offset: u64) -> u32 {
        match offset {
            PC_START_LO => self.pc_start as u32,
            PC_START_HI => (self.pc_start >> 32) as u32,
            STATUS => self.status,
            CYCLE_LO => self.cycle as u32,
            CYCLE_HI => (self.cycle >> 32) as u32,
            _ => 0,
        }
    }
}

impl BusTarget for CsrBlock {
    fn name(&self) -> &str {
        &self.name
    }

    fn address_range(&self) -> (u64, u64) {
        (self.base_addr, self.size)
    }

    fn latency(&self) -> u64 {
        self.latency
    }

    fn read(&mut self, offset: u64, buf: &mut [u8]) -> ResponseCode {
        for (i, byte) in buf.iter_mut().enumerate() {
            let addr = offset + i as u64;
            let word = self.word(addr & !3).to_le_bytes();
            *byte = word[(addr & 3) as usize];
        }
        ResponseCode::Okay
    }

    fn write(&mut self, offset: u64, data: &[u8]) -> ResponseCode {
        if offset % 4 != 0 || data.len() % 4 != 0 {
            return ResponseCode::SlaveError;
        }
        let words: Vec<(u64, u32)> = data
            .chunks_exact(4)
            .enumerate()
            .map(|(i, c)| (offset + 4 * i as u64, u32::from_le_bytes([c[0], c[1], c[2], c[3]])))
            .collect();
        if words
            .iter()
            .any(|&(off, _)| off != PC_START_LO && off != PC_START_HI)
        {
            return ResponseCode::SlaveError;
        }
        for (off, val) in words {
            if off == PC_START_LO {
                self.pc_start = (self.pc_start & !0xFFFF_FFFF) | u64::from(val);
            } else {
                self.pc_start = (self.pc_start & 0xFFFF_FFFF) | (u64::from(val) << 32);
            }
        }
        ResponseCode::Okay
    }

    fn tick(&mut self, cycle: u64) {
        self.cycle = cycle;
    }

    fn as_csr_mut(&mut self) -> Option<&mut CsrBlock> {
        Some(self)
    }
}
