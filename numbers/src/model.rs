// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! High-level data types.

use derive_getters::Getters;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters allowed in the random part of an ASIN.
const ASIN_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Computes the check digit of an EAN code, which also applies to ISBN-13 codes.
///
/// Data digits are weighted 3 and 1 alternately starting from the rightmost one.
fn ean_check_digit(digits: &[u8]) -> u8 {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 3 } else { 1 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

/// Computes the check character of an ISBN-10 code from its first nine digits.
fn isbn10_check_char(digits: &[u8; 9]) -> char {
    let sum: u32 = digits.iter().enumerate().map(|(i, d)| (i as u32 + 1) * u32::from(*d)).sum();
    match sum % 11 {
        10 => 'X',
        n => char::from(b'0' + n as u8),
    }
}

/// Renders `digits` as a string.
fn to_string(digits: &[u8]) -> String {
    digits.iter().map(|d| char::from(b'0' + d)).collect()
}

/// Generates `n` random decimal digits.
fn random_digits<R: Rng>(rng: &mut R, n: usize) -> Vec<u8> {
    (0..n).map(|_| rng.random_range(0..10)).collect()
}

/// Codes handed out for a new book.
#[derive(Clone, Debug, Deserialize, Getters, PartialEq, Serialize)]
pub struct BookNumbers {
    /// The 10-digit ISBN.
    isbn_10: String,

    /// The 13-digit ISBN.
    isbn_13: String,

    /// The Amazon Standard Identification Number.
    asin: String,

    /// The 8-digit European Article Number.
    ean_8: String,

    /// The 13-digit European Article Number.
    ean_13: String,
}

impl BookNumbers {
    /// Generates a new set of random but well-formed codes using `rng`.
    ///
    /// Both ISBNs share the same registration digits, like real ISBNs do.  If `separator` is true,
    /// the ISBNs are split into their group, publisher, title and check parts with hyphens.
    pub fn generate<R: Rng>(rng: &mut R, separator: bool) -> Self {
        let core: [u8; 9] = std::array::from_fn(|_| rng.random_range(0..10));

        let isbn_10 = format!("{}{}", to_string(&core), isbn10_check_char(&core));

        let mut isbn_13 = vec![9, 7, 8];
        isbn_13.extend_from_slice(&core);
        isbn_13.push(ean_check_digit(&isbn_13));
        let isbn_13 = to_string(&isbn_13);

        let (isbn_10, isbn_13) = if separator {
            (hyphenate(&isbn_10), format!("{}-{}", &isbn_13[0..3], hyphenate(&isbn_13[3..])))
        } else {
            (isbn_10, isbn_13)
        };

        let mut ean_8 = random_digits(rng, 7);
        ean_8.push(ean_check_digit(&ean_8));

        let mut ean_13 = random_digits(rng, 12);
        ean_13.push(ean_check_digit(&ean_13));

        let asin: String = (0..8)
            .map(|_| char::from(ASIN_CHARS[rng.random_range(0..ASIN_CHARS.len())]))
            .collect();

        Self {
            isbn_10,
            isbn_13,
            asin: format!("B0{}", asin),
            ean_8: to_string(&ean_8),
            ean_13: to_string(&ean_13),
        }
    }
}

/// Splits a 10-character ISBN body into its 1-3-5-1 parts.
fn hyphenate(isbn: &str) -> String {
    format!("{}-{}-{}-{}", &isbn[0..1], &isbn[1..4], &isbn[4..9], &isbn[9..10])
}
