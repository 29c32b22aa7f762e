// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! ARM ITM stimulus-port 0 transport (SWO trace viewer).

use spin::Mutex;

use crate::config::TX_POLL_LIMIT;
use crate::dispatch::Transport;

const ITM_STIM0: usize = 0x000;
const ITM_TER0: usize = 0xe00;
const ITM_TCR: usize = 0xe80;
const TCR_ITMENA: u32 = 1 << 0;
const TER_PORT0: u32 = 1 << 0;
const STIM_FIFOREADY: u32 = 1 << 0;

/// ITM transport. The lock keeps lines from different callers whole; fatal
/// writes skip it.
pub struct ItmTransport {
    base: usize,
    line: Mutex<()>,
}

impl ItmTransport {
    /// Architectural ITM address on Armv7-M/Armv8-M.
    pub const ARCH_BASE: usize = 0xe000_0000;

    /// # Safety
    ///
    /// `base` must be the address of the core's ITM block.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base, line: Mutex::new(()) }
    }

    fn read(&self, offset: usize) -> u32 {
        // SAFETY: `new` requires `base` to address the ITM block; offsets are word registers inside it.
        unsafe { core::ptr::read_volatile((self.base + offset) as *const u32) }
    }

    fn port_enabled(&self) -> bool {
        self.read(ITM_TCR) & TCR_ITMENA != 0 && self.read(ITM_TER0) & TER_PORT0 != 0
    }

    fn put(&self, byte: u8) -> bool {
        let mut polls = 0;
        while self.read(ITM_STIM0) & STIM_FIFOREADY == 0 {
            polls += 1;
            if polls >= TX_POLL_LIMIT {
                return false;
            }
            core::hint::spin_loop();
        }
        // SAFETY: `new` requires `base` to address the ITM block; STIM0 accepts byte writes.
        unsafe { core::ptr::write_volatile((self.base + ITM_STIM0) as *mut u8, byte) };
        true
    }

    fn put_all(&self, bytes: &[u8]) {
        // No debugger attached: drop silently.
        if !self.port_enabled() {
            return;
        }
        for &byte in bytes {
            if !self.put(byte) {
                return;
            }
        }
    }
}

impl Transport for ItmTransport {
    fn write(&self, bytes: &[u8]) {
        let _line = self.line.lock();
        self.put_all(bytes);
    }

    fn write_fatal(&self, bytes: &[u8]) {
        self.put_all(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::{ItmTransport, ITM_TCR, ITM_TER0, STIM_FIFOREADY, TCR_ITMENA, TER_PORT0};
    use crate::dispatch::Transport;

    /// Covers STIM0 (+0x000) through TCR (+0xe80).
    #[repr(C, align(4))]
    struct FakeItm([u32; ITM_TCR / 4 + 1]);

    fn fake(enabled: bool) -> Box<FakeItm> {
        let mut itm = Box::new(FakeItm([0; ITM_TCR / 4 + 1]));
        itm.0[0] = STIM_FIFOREADY;
        if enabled {
            itm.0[ITM_TER0 / 4] = TER_PORT0;
            itm.0[ITM_TCR / 4] = TCR_ITMENA;
        }
        itm
    }

    fn stim_byte(itm: &FakeItm) -> u8 {
        let word = unsafe { core::ptr::read_volatile(itm.0.as_ptr()) };
        word.to_ne_bytes()[0]
    }

    #[test]
    fn disabled_port_drops_output() {
        let mut itm = fake(false);
        let transport = unsafe { ItmTransport::new(itm.0.as_mut_ptr() as usize) };
        transport.write(b"k");
        assert_eq!(stim_byte(&itm), STIM_FIFOREADY.to_ne_bytes()[0]);
    }

    #[test]
    fn enabled_port_receives_bytes() {
        let mut itm = fake(true);
        let transport = unsafe { ItmTransport::new(itm.0.as_mut_ptr() as usize) };
        // The fake echoes the written byte back as status, so use bytes with bit 0 set.
        transport.write(b"ok");
        assert_eq!(stim_byte(&itm), b'k');
    }
}
