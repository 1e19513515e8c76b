// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Boot-time fixups applied to the device tree before it is handed over to
//! the next boot stage.
//!
//! Each fixup projects a fact only known to the firmware at runtime into the
//! tree:
//!
//! - [`cpu_fixup`] disables the harts the platform can't use,
//! - [`plic_fixup`] hides the M-mode external interrupt of each hart from the
//!   interrupt controller's `interrupts-extended` list,
//! - [`reserved_memory_fixup`] describes the memory protected by PMP as
//!   `no-map` children of `/reserved-memory`.
//!
//! The platform facts come from the [`Platform`] and [`PmpRegions`] traits,
//! which the firmware implements.

mod cpu;
mod plic;
mod reserved_memory;

use bitflags::bitflags;
use log::warn;

pub use self::cpu::cpu_fixup;
pub use self::plic::plic_fixup;
pub use self::reserved_memory::reserved_memory_fixup;
use crate::blob::FdtBlob;
use crate::error::{FdtError, FixupError};

/// Free space reserved before running [`cpu_fixup`].
pub const CPU_FIXUP_SLACK: usize = 32;

/// Free space reserved before running [`reserved_memory_fixup`].
pub const RESERVED_MEMORY_FIXUP_SLACK: usize = 256;

/// Interrupt number of the machine-level external interrupt.
pub const IRQ_M_EXT: u32 = 11;

/// Interrupt specifier that doesn't route to any hart context.
pub const IRQ_MASKED: u32 = 0xffff_ffff;

/// Compatible string of the interrupt controller fixed up by
/// [`apply_fixups`].
pub const DEFAULT_PLIC_COMPATIBLE: &str = "riscv,plic0";

/// Facts about the harts of the platform.
pub trait Platform {
    /// Returns the number of harts. Hart IDs are assumed to run from 0 to
    /// `hart_count() - 1`.
    fn hart_count(&self) -> u32;

    /// Returns whether the given hart exists in the tree but can't be used.
    fn hart_invalid(&self, hart: u32) -> bool;

    /// Returns whether the harts have PMP (physical memory protection).
    fn has_pmp(&self) -> bool;
}

/// The table of PMP regions programmed by the firmware.
pub trait PmpRegions {
    /// Returns the number of PMP entries.
    fn count(&self) -> usize;

    /// Returns the PMP entry at `index`, which is less than
    /// [`count()`](PmpRegions::count).
    fn region(&self, index: usize) -> PmpRegion;
}

impl PmpRegions for [PmpRegion] {
    fn count(&self) -> usize {
        self.len()
    }

    fn region(&self, index: usize) -> PmpRegion {
        self[index]
    }
}

bitflags! {
    /// The permission and address-matching bits of a PMP configuration
    /// register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PmpFlags: u8 {
        /// Reads are allowed.
        const READ = 1 << 0;
        /// Writes are allowed.
        const WRITE = 1 << 1;
        /// Instruction fetches are allowed.
        const EXEC = 1 << 2;
        /// The two-bit address-matching mode. The entry is disabled when both
        /// bits are clear.
        const ADDRESS_MATCH = 0b11 << 3;
    }
}

impl PmpFlags {
    /// Returns whether the entry matches any address.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self.intersects(Self::ADDRESS_MATCH)
    }

    /// Returns whether the entry grants none of read, write or execute.
    #[must_use]
    pub fn is_inaccessible(self) -> bool {
        !self.intersects(Self::READ | Self::WRITE | Self::EXEC)
    }
}

/// A PMP entry: a physical memory range and what lower privilege levels may
/// do with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PmpRegion {
    /// The permission and address-matching bits.
    pub flags: PmpFlags,
    /// The base physical address.
    pub address: u64,
    /// The size of the region in bytes.
    pub size: u64,
}

impl PmpRegion {
    /// Returns whether the region is enabled and inaccessible, meaning the
    /// operating system must not touch it.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.flags.is_enabled() && self.flags.is_inaccessible()
    }
}

/// Grows `blob` by `extra` bytes of free space before a fixup adds to it.
///
/// # Errors
///
/// Returns [`FixupError::OutOfSpace`] if the blob can't grow that much. The
/// blob is unchanged in that case.
pub fn expand(blob: &mut FdtBlob, extra: usize) -> Result<(), FixupError> {
    blob.grow(extra).map_err(|err| match err {
        FdtError::NoSpace { requested, limit } => FixupError::OutOfSpace { requested, limit },
        err => FixupError::TreeWrite(err),
    })
}

/// Applies the fixups every boot needs: [`plic_fixup`] for
/// [`DEFAULT_PLIC_COMPATIBLE`], then [`reserved_memory_fixup`].
///
/// Both fixups run even if the first one fails, and each failure is logged.
///
/// # Errors
///
/// Returns the first error encountered. The tree is still usable and may hold
/// the changes made before the failure.
pub fn apply_fixups<P, R>(blob: &mut FdtBlob, platform: &P, pmp: &R) -> Result<(), FixupError>
where
    P: Platform + ?Sized,
    R: PmpRegions + ?Sized,
{
    let plic = plic_fixup(blob, DEFAULT_PLIC_COMPATIBLE);
    if let Err(err) = &plic {
        warn!("PLIC fixup failed: {err}");
    }
    let reserved_memory = reserved_memory_fixup(blob, platform, pmp).map(|_| ());
    if let Err(err) = &reserved_memory {
        warn!("reserved memory fixup failed: {err}");
    }
    plic.and(reserved_memory)
}
