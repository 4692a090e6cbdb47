// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Hardware interface layer for the ADuCM peripheral driver suite.
//!
//! This crate holds the contracts between the portable driver code and the
//! platform it runs on: the trait a vendor UART peripheral must provide, the
//! client traits completion events are delivered through, and the small
//! vocabulary types (error codes, configuration parameters, leased buffers)
//! shared by every layer.
//!
//! Nothing in this crate touches hardware. Platform crates (for example
//! `aducm302x`) implement the driver logic against these interfaces, and
//! board or test code supplies the peripheral implementations.

#![no_std]

pub mod display;
pub mod lease;
pub mod uart;

mod errorcode;
pub use errorcode::ErrorCode;
