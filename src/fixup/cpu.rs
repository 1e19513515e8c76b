// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::format;

use log::debug;

use super::{CPU_FIXUP_SLACK, Platform, expand};
use crate::blob::FdtBlob;
use crate::error::FixupError;
use crate::standard::Status;

/// Sets `status = "disabled"` on the `/cpus/cpu@<id>` node of every hart the
/// platform reports as invalid.
///
/// Hart IDs are assumed to be contiguous and to match the unit addresses of
/// the CPU nodes. Harts without a CPU node are skipped.
///
/// # Errors
///
/// Returns [`FixupError::OutOfSpace`] if the blob can't be grown, in which
/// case nothing is changed, or [`FixupError::TreeWrite`] if a `status`
/// property can't be written.
pub fn cpu_fixup<P: Platform + ?Sized>(blob: &mut FdtBlob, platform: &P) -> Result<(), FixupError> {
    expand(blob, CPU_FIXUP_SLACK)?;

    for hart in 0..platform.hart_count() {
        if !platform.hart_invalid(hart) {
            continue;
        }
        let path = format!("/cpus/cpu@{hart}");
        let Some(cpu) = blob.node_offset(&path)? else {
            continue;
        };
        blob.set_property_str(cpu, "status", Status::Disabled.as_str())?;
        debug!("{path}: disabled invalid hart");
    }
    Ok(())
}
