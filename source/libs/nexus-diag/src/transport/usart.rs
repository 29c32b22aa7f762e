// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Polled STM32 USART transmitter for diagnostics.

use spin::Mutex;

use crate::config::TX_POLL_LIMIT;
use crate::dispatch::Transport;

const USART_CR1: usize = 0x00;
const USART_ISR: usize = 0x1c;
const USART_TDR: usize = 0x28;
const CR1_UE: u32 = 1 << 0;
const CR1_TE: u32 = 1 << 3;
const ISR_TXE: u32 = 1 << 7;

#[derive(Clone, Copy)]
struct UsartRegs {
    base: usize,
}

impl UsartRegs {
    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `UsartTransport::new` requires `base` to address a mapped USART block.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn write(&self, offset: usize, value: u32) {
        // SAFETY: same register block as `read`; every offset used is a 32-bit register.
        unsafe { core::ptr::write_volatile((self.base + offset) as *mut u32, value) }
    }

    /// Waits for TXE, then writes one byte. Returns false when the peripheral
    /// never became ready within the poll budget.
    fn put(&self, byte: u8) -> bool {
        let mut polls = 0;
        while self.read(USART_ISR) & ISR_TXE == 0 {
            polls += 1;
            if polls >= TX_POLL_LIMIT {
                return false;
            }
            core::hint::spin_loop();
        }
        self.write(USART_TDR, byte as u32);
        true
    }

    fn put_all(&self, bytes: &[u8]) {
        for &byte in bytes {
            if byte == b'\n' && !self.put(b'\r') {
                return;
            }
            if !self.put(byte) {
                return;
            }
        }
    }
}

/// USART transport. Normal writes are serialized by a spin lock; fatal writes
/// go straight to the registers since the lock owner may be suspended.
pub struct UsartTransport {
    regs: Mutex<UsartRegs>,
    raw: UsartRegs,
}

impl UsartTransport {
    /// # Safety
    ///
    /// `base` must be the address of a USART register block (CR1 at +0x00, ISR
    /// at +0x1c, TDR at +0x28) that stays mapped for the transport's lifetime.
    pub const unsafe fn new(base: usize) -> Self {
        Self { regs: Mutex::new(UsartRegs { base }), raw: UsartRegs { base } }
    }
}

impl Transport for UsartTransport {
    fn write(&self, bytes: &[u8]) {
        let regs = self.regs.lock();
        regs.put_all(bytes);
    }

    fn write_fatal(&self, bytes: &[u8]) {
        self.raw.put_all(bytes);
    }

    /// Enables the transmitter. Clock and baud setup belong to board bring-up.
    fn init(&self) {
        let regs = self.regs.lock();
        let cr1 = regs.read(USART_CR1);
        regs.write(USART_CR1, cr1 | CR1_UE | CR1_TE);
    }

    fn deinit(&self) {
        let regs = self.regs.lock();
        let cr1 = regs.read(USART_CR1);
        regs.write(USART_CR1, cr1 & !CR1_TE);
    }
}
