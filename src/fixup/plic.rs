// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use log::debug;
use zerocopy::{FromBytes, big_endian};

use super::{IRQ_M_EXT, IRQ_MASKED};
use crate::blob::FdtBlob;
use crate::cells::CELL_SIZE;
use crate::error::FixupError;

/// Masks the M-mode external interrupt of every hart in the
/// `interrupts-extended` property of the first node compatible with
/// `compatible`. The root node is never considered, even if it carries the
/// same compatible string.
///
/// The property is a list of `<phandle interrupt>` pairs. Every interrupt
/// equal to [`IRQ_M_EXT`] is replaced by [`IRQ_MASKED`], in place. Nothing
/// happens if there is no such node or property. A trailing unpaired cell is
/// left as is.
///
/// # Errors
///
/// Returns [`FixupError::TreeWrite`] if the tree can't be read.
pub fn plic_fixup(blob: &mut FdtBlob, compatible: &str) -> Result<(), FixupError> {
    let Some(plic) = blob.node_offset_by_compatible(compatible)? else {
        return Ok(());
    };
    let Some(value) = blob.property_mut(plic, "interrupts-extended")? else {
        return Ok(());
    };

    let count = value.len() / CELL_SIZE;
    let Ok((cells, _)) = <[big_endian::U32]>::mut_from_prefix_with_elems(value, count) else {
        return Ok(());
    };
    let mut masked = 0;
    for pair in cells.chunks_exact_mut(2) {
        if pair[1].get() == IRQ_M_EXT {
            pair[1].set(IRQ_MASKED);
            masked += 1;
        }
    }
    debug!("{compatible}: masked {masked} M-mode external interrupt(s)");
    Ok(())
}
