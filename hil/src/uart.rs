// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Interfaces for UART communications.
//!
//! Transfers are split-phase: a driver arms the vendor peripheral with one
//! bounded buffer submission at a time through [`Peripheral`], and the
//! peripheral reports each submission's outcome exactly once through
//! [`PeripheralClient`]. Drivers built on top of this contract present
//! arbitrarily large transfers to their own callers and signal completion
//! through [`TransmitClient`] and [`ReceiveClient`].

use crate::lease::LeasedBuffer;
use crate::ErrorCode;

use tock_registers::{register_bitfields, LocalRegisterCopy};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Width {
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StopBits {
    One = 1,
    Two = 2,
}

/// UART line configuration requested at port open.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// Baud rate in bit/s. Must be present in the platform's divisor table.
    pub baud_rate: u32,
    pub width: Width,
    pub parity: Parity,
    pub stop_bits: StopBits,
}

/// Precomputed fractional baud divisors handed to the peripheral.
///
/// The generated rate is
/// `clock / ((div_m + div_n / 2048) * 2^(osr + 2) * div_c)`; platforms keep a
/// table of quadruples per supported rate rather than deriving them at run
/// time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BaudDivisors {
    /// Fractional divisor N, 0..=2047.
    pub div_n: u16,
    /// Integer divisor M, 1..=3.
    pub div_m: u8,
    /// Prescaler C, 1..=65535.
    pub div_c: u16,
    /// Oversample rate selector, 0..=3.
    pub osr: u8,
}

register_bitfields![u32,
    /// Line and transport error events a peripheral can report: receive
    /// framing, parity, overrun and break conditions, plus a fault in the
    /// DMA facility while it moved a submission.
    pub ERRORS [
        RX_FRAMING OFFSET(0) NUMBITS(1) [],
        RX_PARITY OFFSET(1) NUMBITS(1) [],
        RX_OVERRUN OFFSET(2) NUMBITS(1) [],
        RX_BREAK OFFSET(3) NUMBITS(1) [],
        DMA_FAULT OFFSET(4) NUMBITS(1) [],
    ],
];

/// One peripheral's error report: a snapshot of [`ERRORS`] bits.
///
/// Reports accumulate in the owning port's sticky error mask until the
/// caller drains it with `take_errors`.
pub type ErrorFlags = LocalRegisterCopy<u32, ERRORS::Register>;

/// One direction's bounded submission capability of a vendor UART
/// peripheral.
///
/// Implementations accept at most one in-flight submission per direction and
/// deliver exactly one [`PeripheralClient`] callback per accepted
/// submission. The callback runs in the peripheral's interrupt dispatch
/// context: implementations must not invoke it from within `submit_transmit`
/// or `submit_receive` themselves, so that a driver's continuation logic is
/// never reentered from its own downcall.
pub trait Peripheral<'a> {
    /// Register the client completion events are delivered to.
    fn set_client(&self, client: &'a dyn PeripheralClient);

    /// Power up the peripheral. Counterpart of [`disable`](Self::disable).
    fn enable(&self) -> Result<(), ErrorCode>;

    /// Release the peripheral. Any in-flight submission is abandoned.
    fn disable(&self) -> Result<(), ErrorCode>;

    /// Apply the word length, parity, and stop bit configuration.
    fn configure(&self, params: Parameters) -> Result<(), ErrorCode>;

    /// Load the baud divisors. The caller has already validated them
    /// against the platform's divisor table and clock.
    fn configure_baud(&self, divisors: BaudDivisors) -> Result<(), ErrorCode>;

    /// The peripheral clock feeding the baud generator, in Hz.
    fn clock_frequency(&self) -> u32;

    /// Transmit one bounded chunk, returning once it is on the wire.
    ///
    /// Fails with the reported line errors if the hardware signals a fault
    /// mid-chunk.
    fn transmit_chunk_sync(&self, chunk: &[u8]) -> Result<(), ErrorFlags>;

    /// Receive exactly `chunk.len()` bytes, returning once all have
    /// arrived.
    fn receive_chunk_sync(&self, chunk: &mut [u8]) -> Result<(), ErrorFlags>;

    /// Arm one bounded transmit submission covering `tx`'s active window.
    ///
    /// On success the peripheral owns the lease until it is returned by
    /// [`PeripheralClient::chunk_transmitted`]. On failure nothing was
    /// armed and the lease is handed straight back.
    fn submit_transmit(
        &self,
        tx: LeasedBuffer<'static>,
    ) -> Result<(), (ErrorCode, LeasedBuffer<'static>)>;

    /// Arm one bounded receive submission filling `rx`'s active window.
    fn submit_receive(
        &self,
        rx: LeasedBuffer<'static>,
    ) -> Result<(), (ErrorCode, LeasedBuffer<'static>)>;

    /// Deliver pending completion events to the registered client.
    ///
    /// On hardware this is driven by the UART interrupt; a busy-waiting
    /// caller invokes it so completions make progress while it spins.
    fn service_pending_interrupts(&self);
}

/// Callbacks a [`Peripheral`] delivers, once per accepted submission.
///
/// These run in interrupt dispatch context and must not block; any
/// unbounded work belongs in the caller's context.
pub trait PeripheralClient {
    /// The in-flight transmit submission finished, successfully or with the
    /// reported line errors. The lease is returned with the window it was
    /// submitted with.
    fn chunk_transmitted(&self, tx: LeasedBuffer<'static>, status: Result<(), ErrorFlags>);

    /// The in-flight receive submission finished. On success the window
    /// holds the received bytes.
    fn chunk_received(&self, rx: LeasedBuffer<'static>, status: Result<(), ErrorFlags>);
}

/// Client of a driver's non-blocking transmit path.
pub trait TransmitClient {
    /// A previously accepted transmit request ended.
    ///
    /// On success `tx_len` is the full requested length. On failure no byte
    /// count is reported; the transfer is all-or-nothing and the line-level
    /// cause is retained in the port's sticky error mask.
    fn transmitted_buffer(
        &self,
        tx_buffer: LeasedBuffer<'static>,
        tx_len: usize,
        rcode: Result<(), ErrorCode>,
    );
}

/// Client of a driver's non-blocking receive path.
pub trait ReceiveClient {
    /// A previously accepted receive request ended.
    fn received_buffer(
        &self,
        rx_buffer: LeasedBuffer<'static>,
        rx_len: usize,
        rcode: Result<(), ErrorCode>,
    );
}
