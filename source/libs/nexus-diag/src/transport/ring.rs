// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Buffered transport: records queue in RAM and a logging task drains them to
//! the wire with `pump()`, so callers never wait on the peripheral. Whatever is
//! still queued when a fatal assertion hits is what the dying gasp pushes out.

use core::sync::atomic::{AtomicU32, Ordering};

use spin::Mutex;

use crate::dispatch::Transport;
use crate::fatal::{DyingGasp, FlushProgress};

/// Bytes moved per pump step / dying-gasp attempt.
const DRAIN_CHUNK: usize = 64;

struct ByteRing<const N: usize> {
    buf: [u8; N],
    head: usize,
    len: usize,
}

impl<const N: usize> ByteRing<N> {
    const fn new() -> Self {
        Self { buf: [0u8; N], head: 0, len: 0 }
    }

    /// Queues a whole record or nothing.
    fn push(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > N - self.len {
            return false;
        }
        for &byte in bytes {
            let tail = (self.head + self.len) % N;
            self.buf[tail] = byte;
            self.len += 1;
        }
        true
    }

    fn pop_into(&mut self, out: &mut [u8]) -> usize {
        let n = core::cmp::min(out.len(), self.len);
        for slot in &mut out[..n] {
            *slot = self.buf[self.head];
            self.head = (self.head + 1) % N;
        }
        self.len -= n;
        n
    }
}

/// Ring-buffered wrapper around another transport.
pub struct RingTransport<S, const N: usize> {
    inner: S,
    ring: Mutex<ByteRing<N>>,
    dropped: AtomicU32,
}

impl<S: Transport, const N: usize> RingTransport<S, N> {
    pub const fn new(inner: S) -> Self {
        Self { inner, ring: Mutex::new(ByteRing::new()), dropped: AtomicU32::new(0) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Bytes queued and not yet written to the inner transport.
    pub fn pending(&self) -> usize {
        self.ring.lock().len
    }

    /// Records rejected because the ring was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Drains the ring to the inner transport. Meant for a single logging task;
    /// returns the number of bytes written.
    pub fn pump(&self) -> usize {
        let mut chunk = [0u8; DRAIN_CHUNK];
        let mut total = 0;
        loop {
            let n = self.ring.lock().pop_into(&mut chunk);
            if n == 0 {
                return total;
            }
            self.inner.write(&chunk[..n]);
            total += n;
        }
    }
}

impl<S: Transport, const N: usize> Transport for RingTransport<S, N> {
    fn write(&self, bytes: &[u8]) {
        if !self.ring.lock().push(bytes) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// The assertion record bypasses the ring; it goes out after the gasp.
    fn write_fatal(&self, bytes: &[u8]) {
        self.inner.write_fatal(bytes);
    }

    fn init(&self) {
        self.inner.init();
    }

    fn deinit(&self) {
        self.pump();
        self.inner.deinit();
    }

    fn dying_gasp(&self) -> Option<&dyn DyingGasp> {
        Some(self)
    }
}

impl<S: Transport, const N: usize> DyingGasp for RingTransport<S, N> {
    fn try_flush(&self) -> FlushProgress {
        // A suspended task may own the lock; never spin on it here.
        let Some(mut ring) = self.ring.try_lock() else {
            return FlushProgress::Unavailable;
        };
        let mut chunk = [0u8; DRAIN_CHUNK];
        let n = ring.pop_into(&mut chunk);
        let drained = ring.len == 0;
        drop(ring);
        if n > 0 {
            self.inner.write_fatal(&chunk[..n]);
        }
        if drained {
            FlushProgress::Drained
        } else {
            FlushProgress::Pending
        }
    }
}
