// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Descriptors of the platform devices the firmware drives itself.
//!
//! Each parser finds the first node compatible with the given string, in
//! depth-first order, and decodes its base address plus a few optional `u32`
//! properties. Other nodes with the same compatible string are ignored.

use log::debug;

use crate::cells::{self, CELL_SIZE};
use crate::error::DeviceError;
use crate::fdt::Fdt;

/// An 8250-compatible UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartData {
    /// The base address of the registers.
    pub address: u64,
    /// The input clock frequency in Hz, from `clock-frequency`.
    pub frequency: Option<u32>,
    /// The configured baud rate, from `current-speed`.
    pub baud: Option<u32>,
}

/// A RISC-V platform-level interrupt controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlicData {
    /// The base address of the registers.
    pub address: u64,
    /// The number of interrupt sources, from `riscv,ndev`.
    pub sources: Option<u32>,
}

/// A RISC-V core-local interruptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClintData {
    /// The base address of the registers.
    pub address: u64,
}

/// The optional properties read for a kind of device.
struct Schema<const N: usize> {
    optional: [&'static str; N],
}

const UART8250: Schema<2> = Schema {
    optional: ["clock-frequency", "current-speed"],
};
const PLIC: Schema<1> = Schema {
    optional: ["riscv,ndev"],
};
const CLINT: Schema<0> = Schema { optional: [] };

struct RawDevice<const N: usize> {
    address: u64,
    optional: [Option<u32>; N],
}

impl<const N: usize> Schema<N> {
    fn parse(&self, fdt: &Fdt<'_>, compatible: &str) -> Result<RawDevice<N>, DeviceError> {
        let node = fdt
            .find_compatible(compatible)?
            .ok_or(DeviceError::NotFound)?;
        if node.parent_address_space().address_cells == 0 {
            return Err(DeviceError::Malformed("parent has no address cells"));
        }
        let reg = node
            .first_reg()?
            .ok_or(DeviceError::Malformed("missing or truncated `reg` property"))?;
        let address = reg.address.to_u64();
        if address == 0 {
            return Err(DeviceError::Malformed("zero base address"));
        }
        if reg.size.to_u64() == 0 {
            return Err(DeviceError::Malformed("zero size"));
        }

        let mut optional = [None; N];
        for (value, name) in optional.iter_mut().zip(self.optional) {
            *value = node
                .property(name)?
                .map(|property| property.value())
                .filter(|value| value.len() >= CELL_SIZE)
                .and_then(|value| u32::try_from(cells::decode(value, 1)).ok());
        }
        debug!("{compatible}: found {} at {address:#x}", node.name().unwrap_or("?"));
        Ok(RawDevice { address, optional })
    }
}

/// Decodes the first 8250 UART compatible with `compatible`.
///
/// # Errors
///
/// Returns [`DeviceError::NotFound`] if no node matches, or
/// [`DeviceError::Malformed`] if its `reg` property is missing or describes
/// an empty range at address zero.
pub fn parse_uart8250(fdt: &Fdt<'_>, compatible: &str) -> Result<UartData, DeviceError> {
    let RawDevice {
        address,
        optional: [frequency, baud],
    } = UART8250.parse(fdt, compatible)?;
    Ok(UartData {
        address,
        frequency,
        baud,
    })
}

/// Decodes the first PLIC compatible with `compatible`.
///
/// # Errors
///
/// See [`parse_uart8250`].
pub fn parse_plic(fdt: &Fdt<'_>, compatible: &str) -> Result<PlicData, DeviceError> {
    let RawDevice {
        address,
        optional: [sources],
    } = PLIC.parse(fdt, compatible)?;
    Ok(PlicData { address, sources })
}

/// Decodes the first CLINT compatible with `compatible`.
///
/// # Errors
///
/// See [`parse_uart8250`].
pub fn parse_clint(fdt: &Fdt<'_>, compatible: &str) -> Result<ClintData, DeviceError> {
    let RawDevice { address, .. } = CLINT.parse(fdt, compatible)?;
    Ok(ClintData { address })
}
