// SPDX-License-Identifier: MIT

pub mod checksum;
