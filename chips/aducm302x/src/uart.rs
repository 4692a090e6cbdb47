// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Chunked UART transfer engine for the ADuCM302x UARTs.
//!
//! The vendor peripheral accepts one bounded buffer submission per
//! direction at a time, at most [`MAX_CHUNK_BYTES`] each. This driver
//! presents arbitrarily large transfers on top of that: blocking `read` and
//! `write` carve the request into chunks and wait out each one in turn,
//! while `submit_read` and `submit_write` arm the first chunk and return
//! immediately, with every later chunk submitted from the completion
//! callback until the request is exhausted.
//!
//! Concurrency model: there are exactly two writers of a direction's
//! transfer state. The public entry points start a transfer, and from that
//! point the completion callback (running in interrupt dispatch context)
//! owns the cursor until the direction goes idle again. The `BUSY` check on
//! submission is what keeps those writers from overlapping; no locks are
//! involved. The two directions of a port are fully independent.
//!
//! A transfer ends only by completing or by an error event. Closing a port
//! mid-transfer abandons the outstanding bytes: they are never moved and no
//! completion callback fires for them.

use core::cell::Cell;
use core::cmp;
use core::ops::Range;

use aducm_hil as hil;
use aducm_hil::lease::LeasedBuffer;
use aducm_hil::uart::{
    ErrorFlags, Parameters, Peripheral, PeripheralClient, ReceiveClient, TransmitClient,
};
use aducm_hil::ErrorCode;

use tock_registers::interfaces::{Readable, Writeable};
use tock_registers::registers::InMemoryRegister;

use crate::baud;

/// Largest buffer the vendor facility accepts in one submission.
pub const MAX_CHUNK_BYTES: usize = 1024;

/// Physical UART instances served by this driver. UART0 exists on every
/// family member; UART1 is present on the ADuCM4x50 superset parts.
pub const NUM_UART_DEVICES: usize = 2;

/// Record of which UART ports are currently open.
///
/// The registry is an owned value the board wires up, not module state, so
/// independent registries never collide. `claim` enforces at most one open
/// port per id.
pub struct PortRegistry {
    open: [Cell<bool>; NUM_UART_DEVICES],
}

impl PortRegistry {
    pub const fn new() -> PortRegistry {
        PortRegistry {
            open: [Cell::new(false), Cell::new(false)],
        }
    }

    fn claim(&self, id: usize) -> Result<(), ErrorCode> {
        let slot = self.open.get(id).ok_or(ErrorCode::NODEVICE)?;
        if slot.get() {
            return Err(ErrorCode::ALREADY);
        }
        slot.set(true);
        Ok(())
    }

    fn release(&self, id: usize) {
        if let Some(slot) = self.open.get(id) {
            slot.set(false);
        }
    }

    /// Whether `id` is currently open. Out-of-range ids read as closed.
    pub fn is_open(&self, id: usize) -> bool {
        self.open.get(id).map_or(false, Cell::get)
    }
}

/// One direction's in-flight non-blocking transfer.
///
/// While `in_progress` is set the completion callback is the sole writer of
/// the cursor fields, and the leased buffer from the cursor onward belongs
/// to the driver. `remaining` is 0 whenever the direction is idle.
struct DirectionState {
    in_progress: Cell<bool>,
    /// Bytes not yet handed to the peripheral.
    remaining: Cell<usize>,
    /// Index into the leased buffer where the next chunk begins.
    cursor: Cell<usize>,
    /// The caller's window at submission time, restored before the buffer
    /// is handed back.
    region_start: Cell<usize>,
    region_end: Cell<usize>,
}

impl DirectionState {
    const fn new() -> DirectionState {
        DirectionState {
            in_progress: Cell::new(false),
            remaining: Cell::new(0),
            cursor: Cell::new(0),
            region_start: Cell::new(0),
            region_end: Cell::new(0),
        }
    }

    /// Accept a transfer over `window` and carve the first chunk.
    fn begin(&self, window: Range<usize>) -> Range<usize> {
        let requested = window.end - window.start;
        let first = cmp::min(requested, MAX_CHUNK_BYTES);
        self.in_progress.set(true);
        self.region_start.set(window.start);
        self.region_end.set(window.end);
        self.cursor.set(window.start + first);
        self.remaining.set(requested - first);
        window.start..window.start + first
    }

    /// Carve the next chunk and advance the cursor. Only called with
    /// `remaining > 0`.
    fn next_chunk(&self) -> Range<usize> {
        let start = self.cursor.get();
        let len = cmp::min(self.remaining.get(), MAX_CHUNK_BYTES);
        self.cursor.set(start + len);
        self.remaining.set(self.remaining.get() - len);
        start..start + len
    }

    fn requested(&self) -> usize {
        self.region_end.get() - self.region_start.get()
    }

    fn idle(&self) {
        self.in_progress.set(false);
        self.remaining.set(0);
    }

    /// Restore the caller's window on a buffer about to be handed back.
    fn restore_region(&self, buf: &mut LeasedBuffer<'static>) {
        buf.reset();
        buf.slice(self.region_start.get()..self.region_end.get());
    }
}

/// One UART port: the transfer engine over a vendor peripheral.
pub struct Uart<'a> {
    device: &'a dyn Peripheral<'a>,
    registry: &'a PortRegistry,
    id: usize,
    opened: Cell<bool>,
    baud_rate: Cell<u32>,
    tx: DirectionState,
    rx: DirectionState,
    /// Sticky line errors, OR-ed in by the completion path and drained by
    /// `take_errors`.
    errors: InMemoryRegister<u32, hil::uart::ERRORS::Register>,
    tx_client: Cell<Option<&'a dyn TransmitClient>>,
    rx_client: Cell<Option<&'a dyn ReceiveClient>>,
}

impl<'a> Uart<'a> {
    pub fn new(device: &'a dyn Peripheral<'a>, registry: &'a PortRegistry, id: usize) -> Uart<'a> {
        Uart {
            device,
            registry,
            id,
            opened: Cell::new(false),
            baud_rate: Cell::new(0),
            tx: DirectionState::new(),
            rx: DirectionState::new(),
            errors: InMemoryRegister::new(0),
            tx_client: Cell::new(None),
            rx_client: Cell::new(None),
        }
    }

    pub fn set_transmit_client(&self, client: &'a dyn TransmitClient) {
        self.tx_client.set(Some(client));
    }

    pub fn set_receive_client(&self, client: &'a dyn ReceiveClient) {
        self.rx_client.set(Some(client));
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate.get()
    }

    /// Open the port: claim the registry slot, power the peripheral, apply
    /// the line configuration and the precomputed baud divisors, and
    /// register for completion events.
    ///
    /// Fails with `ALREADY` if the id is open, `NODEVICE` if it does not
    /// exist, `NOSUPPORT` if the baud rate has no divisor entry, and `FAIL`
    /// if the peripheral clock does not match the table's. Any failure
    /// unwinds completely: the peripheral is released and the registry slot
    /// cleared.
    pub fn open(&'a self, params: Parameters) -> Result<(), ErrorCode> {
        self.registry.claim(self.id)?;
        if let Err(e) = self.device.enable() {
            self.registry.release(self.id);
            return Err(e);
        }
        if let Err(e) = self.device.configure(params) {
            self.abort_open();
            return Err(e);
        }
        let divisors = match baud::divisors_for(params.baud_rate) {
            Some(divisors) => divisors,
            None => {
                self.abort_open();
                return Err(ErrorCode::NOSUPPORT);
            }
        };
        if self.device.clock_frequency() != baud::CLOCK_FREQ_HZ {
            self.abort_open();
            return Err(ErrorCode::FAIL);
        }
        if let Err(e) = self.device.configure_baud(divisors) {
            self.abort_open();
            return Err(e);
        }
        self.device.set_client(self);
        self.baud_rate.set(params.baud_rate);
        self.opened.set(true);
        Ok(())
    }

    fn abort_open(&self) {
        let _ = self.device.disable();
        self.registry.release(self.id);
    }

    /// Close the port.
    ///
    /// Outstanding transfers are abandoned: bytes not yet moved are lost
    /// and no completion callback fires for them. A release error from the
    /// peripheral is returned, but the registry slot is cleared regardless,
    /// so the id can be opened again.
    pub fn close(&self) -> Result<(), ErrorCode> {
        if !self.opened.get() {
            return Err(ErrorCode::OFF);
        }
        self.tx.idle();
        self.rx.idle();
        let ret = self.device.disable();
        self.opened.set(false);
        self.registry.release(self.id);
        ret
    }

    /// Atomically read and clear the sticky error mask accumulated since
    /// the last call.
    pub fn take_errors(&self) -> ErrorFlags {
        let flags = ErrorFlags::new(self.errors.get());
        self.errors.set(0);
        flags
    }

    fn accumulate(&self, flags: ErrorFlags) {
        self.errors.set(self.errors.get() | flags.get());
    }

    /// Write `data` to the port, blocking until every byte is on the wire.
    ///
    /// If a non-blocking write is still in flight the call first waits for
    /// it to finish. The transfer is all-or-nothing: a chunk error records
    /// the line flags in the sticky mask and fails the whole call with
    /// `FAIL`, reporting no partial byte count.
    pub fn write(&self, data: &[u8]) -> Result<usize, ErrorCode> {
        if !self.opened.get() {
            return Err(ErrorCode::OFF);
        }
        if data.len() == 0 {
            return Err(ErrorCode::INVAL);
        }
        while self.tx.in_progress.get() {
            self.device.service_pending_interrupts();
        }
        let mut sent = 0;
        while sent < data.len() {
            let chunk = cmp::min(data.len() - sent, MAX_CHUNK_BYTES);
            if let Err(flags) = self.device.transmit_chunk_sync(&data[sent..sent + chunk]) {
                self.accumulate(flags);
                return Err(ErrorCode::FAIL);
            }
            sent += chunk;
        }
        Ok(sent)
    }

    /// Read exactly `data.len()` bytes from the port, blocking until all
    /// have arrived. Semantics mirror [`write`](Self::write).
    pub fn read(&self, data: &mut [u8]) -> Result<usize, ErrorCode> {
        if !self.opened.get() {
            return Err(ErrorCode::OFF);
        }
        if data.len() == 0 {
            return Err(ErrorCode::INVAL);
        }
        while self.rx.in_progress.get() {
            self.device.service_pending_interrupts();
        }
        let mut received = 0;
        while received < data.len() {
            let chunk = cmp::min(data.len() - received, MAX_CHUNK_BYTES);
            if let Err(flags) = self
                .device
                .receive_chunk_sync(&mut data[received..received + chunk])
            {
                self.accumulate(flags);
                return Err(ErrorCode::FAIL);
            }
            received += chunk;
        }
        Ok(received)
    }

    /// Submit a write covering `tx`'s active window and return immediately.
    ///
    /// Acceptance means only that the first chunk was armed. The one
    /// completion report, success or failure, arrives through the
    /// registered [`TransmitClient`]. Fails with `BUSY` while a previous
    /// write submission is in flight; a second request is never queued.
    pub fn submit_write(
        &self,
        tx: LeasedBuffer<'static>,
    ) -> Result<(), (ErrorCode, LeasedBuffer<'static>)> {
        if !self.opened.get() {
            return Err((ErrorCode::OFF, tx));
        }
        if tx.len() == 0 {
            return Err((ErrorCode::INVAL, tx));
        }
        if self.tx.in_progress.get() {
            return Err((ErrorCode::BUSY, tx));
        }
        let mut tx = tx;
        let first = self.tx.begin(tx.window());
        tx.reset();
        tx.slice(first);
        match self.device.submit_transmit(tx) {
            Ok(()) => Ok(()),
            Err((code, mut buf)) => {
                self.tx.restore_region(&mut buf);
                self.tx.idle();
                Err((code, buf))
            }
        }
    }

    /// Submit a read filling `rx`'s active window and return immediately.
    /// Semantics mirror [`submit_write`](Self::submit_write).
    pub fn submit_read(
        &self,
        rx: LeasedBuffer<'static>,
    ) -> Result<(), (ErrorCode, LeasedBuffer<'static>)> {
        if !self.opened.get() {
            return Err((ErrorCode::OFF, rx));
        }
        if rx.len() == 0 {
            return Err((ErrorCode::INVAL, rx));
        }
        if self.rx.in_progress.get() {
            return Err((ErrorCode::BUSY, rx));
        }
        let mut rx = rx;
        let first = self.rx.begin(rx.window());
        rx.reset();
        rx.slice(first);
        match self.device.submit_receive(rx) {
            Ok(()) => Ok(()),
            Err((code, mut buf)) => {
                self.rx.restore_region(&mut buf);
                self.rx.idle();
                Err((code, buf))
            }
        }
    }
}

/// Continuation logic. Runs in the peripheral's interrupt dispatch context
/// and therefore only moves cursors and re-arms submissions; it never
/// blocks and never copies data.
impl<'a> PeripheralClient for Uart<'a> {
    fn chunk_transmitted(&self, tx: LeasedBuffer<'static>, status: Result<(), ErrorFlags>) {
        let mut tx = tx;
        match status {
            Err(flags) => {
                self.accumulate(flags);
                self.tx.restore_region(&mut tx);
                self.tx.idle();
                if let Some(client) = self.tx_client.get() {
                    client.transmitted_buffer(tx, 0, Err(ErrorCode::FAIL));
                }
            }
            Ok(()) => {
                if self.tx.remaining.get() > 0 {
                    let next = self.tx.next_chunk();
                    tx.reset();
                    tx.slice(next);
                    if let Err((code, mut buf)) = self.device.submit_transmit(tx) {
                        self.tx.restore_region(&mut buf);
                        self.tx.idle();
                        if let Some(client) = self.tx_client.get() {
                            client.transmitted_buffer(buf, 0, Err(code));
                        }
                    }
                } else {
                    let len = self.tx.requested();
                    self.tx.restore_region(&mut tx);
                    self.tx.idle();
                    if let Some(client) = self.tx_client.get() {
                        client.transmitted_buffer(tx, len, Ok(()));
                    }
                }
            }
        }
    }

    fn chunk_received(&self, rx: LeasedBuffer<'static>, status: Result<(), ErrorFlags>) {
        let mut rx = rx;
        match status {
            Err(flags) => {
                self.accumulate(flags);
                self.rx.restore_region(&mut rx);
                self.rx.idle();
                if let Some(client) = self.rx_client.get() {
                    client.received_buffer(rx, 0, Err(ErrorCode::FAIL));
                }
            }
            Ok(()) => {
                if self.rx.remaining.get() > 0 {
                    let next = self.rx.next_chunk();
                    rx.reset();
                    rx.slice(next);
                    if let Err((code, mut buf)) = self.device.submit_receive(rx) {
                        self.rx.restore_region(&mut buf);
                        self.rx.idle();
                        if let Some(client) = self.rx_client.get() {
                            client.received_buffer(buf, 0, Err(code));
                        }
                    }
                } else {
                    let len = self.rx.requested();
                    self.rx.restore_region(&mut rx);
                    self.rx.idle();
                    if let Some(client) = self.rx_client.get() {
                        client.received_buffer(rx, len, Ok(()));
                    }
                }
            }
        }
    }
}
