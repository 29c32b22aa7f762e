// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Reference transports and the board output-mode selection
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per transport (USART against a fake register block, ring buffer)
//! INVARIANTS: Polled waits are bounded; fatal writes never wait on a lock

mod itm;
mod null;
mod ring;
mod usart;

pub use itm::ItmTransport;
pub use null::NullTransport;
pub use ring::RingTransport;
pub use usart::UsartTransport;

#[cfg(feature = "output-uart")]
pub type BoardTransport = UsartTransport;

#[cfg(all(feature = "output-itm", not(feature = "output-uart")))]
pub type BoardTransport = ItmTransport;

#[cfg(all(feature = "output-none", not(any(feature = "output-uart", feature = "output-itm"))))]
pub type BoardTransport = NullTransport;

/// Transport for the output mode selected at build time.
#[cfg(feature = "output-uart")]
pub const fn board_transport() -> BoardTransport {
    // SAFETY: USART_BASE is the board's USART register block (or an explicit build override).
    unsafe { UsartTransport::new(crate::config::USART_BASE) }
}

#[cfg(all(feature = "output-itm", not(feature = "output-uart")))]
pub const fn board_transport() -> BoardTransport {
    // SAFETY: the ITM block sits at its architectural address on every Armv7-M/Armv8-M core.
    unsafe { ItmTransport::new(ItmTransport::ARCH_BASE) }
}

#[cfg(all(feature = "output-none", not(any(feature = "output-uart", feature = "output-itm"))))]
pub const fn board_transport() -> BoardTransport {
    NullTransport
}
