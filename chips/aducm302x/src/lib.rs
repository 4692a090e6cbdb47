// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral drivers for the Analog Devices ADuCM302x family.
//!
//! The centerpiece is the UART driver: a chunked transfer engine that
//! presents arbitrarily large blocking and non-blocking reads and writes on
//! top of a vendor facility that only accepts one bounded buffer submission
//! per direction at a time. The driver is written against the traits in
//! `aducm-hil`, so the same engine runs over the real peripheral on
//! hardware and over a loopback double in the unit tests.

#![no_std]

// This is used to run the tests on a host.
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod baud;
pub mod memory;
pub mod uart;
