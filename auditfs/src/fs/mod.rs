// SPDX-License-Identifier: MIT

pub mod exfat;
