// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Standard error enum for invoking driver operations.

/// Standard errors across the driver suite.
///
/// Argument and lifecycle misuse is detected synchronously and reported with
/// one of these codes before any I/O is attempted. Hardware errors detected
/// on the completion path are reported as [`FAIL`](ErrorCode::FAIL), with the
/// line-level detail retained in the port's sticky error accumulator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 0,
    /// Underlying system is busy; retry
    BUSY = 1,
    /// The state requested is already set
    ALREADY = 2,
    /// The component is powered down
    OFF = 3,
    /// An invalid parameter was passed
    INVAL = 4,
    /// Parameter passed was too large
    SIZE = 5,
    /// Operation or command is unsupported
    NOSUPPORT = 6,
    /// Device does not exist
    NODEVICE = 7,
}

impl From<ErrorCode> for usize {
    fn from(err: ErrorCode) -> usize {
        err as usize
    }
}
