// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Precomputed UART baud divisors for the 26 MHz peripheral clock.
//!
//! The baud generator produces
//! `CLOCK_FREQ_HZ / ((div_m + div_n / 2048) * 2^(osr + 2) * div_c)`.
//! Rather than solving that at run time, the supported rates ship as a
//! table; a requested rate that is not in the table is rejected at port
//! open.

use aducm_hil::uart::BaudDivisors;

/// Peripheral clock the table below was computed for, in Hz. Opening a
/// port fails if the part is clocked differently.
pub const CLOCK_FREQ_HZ: u32 = 26_000_000;

struct BaudEntry {
    baud_rate: u32,
    divisors: BaudDivisors,
}

#[rustfmt::skip]
static BAUD_RATES_26MHZ: [BaudEntry; 10] = [
    BaudEntry { baud_rate:    9600, divisors: BaudDivisors { div_n: 1078, div_m: 3, div_c: 24, osr: 3 } },
    BaudEntry { baud_rate:   19200, divisors: BaudDivisors { div_n: 1078, div_m: 3, div_c: 12, osr: 3 } },
    BaudEntry { baud_rate:   38400, divisors: BaudDivisors { div_n: 1321, div_m: 3, div_c:  8, osr: 2 } },
    BaudEntry { baud_rate:   57600, divisors: BaudDivisors { div_n: 1078, div_m: 3, div_c:  4, osr: 3 } },
    BaudEntry { baud_rate:  115200, divisors: BaudDivisors { div_n: 1563, div_m: 1, div_c:  4, osr: 3 } },
    BaudEntry { baud_rate:  230400, divisors: BaudDivisors { div_n: 1563, div_m: 1, div_c:  2, osr: 3 } },
    BaudEntry { baud_rate:  460800, divisors: BaudDivisors { div_n: 1563, div_m: 1, div_c:  1, osr: 3 } },
    BaudEntry { baud_rate:  921600, divisors: BaudDivisors { div_n: 1563, div_m: 1, div_c:  1, osr: 2 } },
    BaudEntry { baud_rate: 1000000, divisors: BaudDivisors { div_n: 1280, div_m: 1, div_c:  1, osr: 2 } },
    BaudEntry { baud_rate: 1500000, divisors: BaudDivisors { div_n:  171, div_m: 1, div_c:  1, osr: 2 } },
];

/// Divisors for `baud_rate`, or `None` when the rate has no precomputed
/// entry.
pub fn divisors_for(baud_rate: u32) -> Option<BaudDivisors> {
    BAUD_RATES_26MHZ
        .iter()
        .find(|entry| entry.baud_rate == baud_rate)
        .map(|entry| entry.divisors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_rates_resolve() {
        let divisors = divisors_for(115200).unwrap();
        assert_eq!(divisors.div_n, 1563);
        assert_eq!(divisors.div_m, 1);
        assert_eq!(divisors.div_c, 4);
        assert_eq!(divisors.osr, 3);
        assert!(divisors_for(9600).is_some());
        assert!(divisors_for(1_500_000).is_some());
    }

    #[test]
    fn unknown_rates_do_not() {
        assert!(divisors_for(0).is_none());
        assert!(divisors_for(12345).is_none());
        assert!(divisors_for(2_000_000).is_none());
    }

    #[test]
    fn table_is_sorted_and_unique() {
        for pair in BAUD_RATES_26MHZ.windows(2) {
            assert!(pair[0].baud_rate < pair[1].baud_rate);
        }
    }
}
