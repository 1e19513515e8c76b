// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use core::fmt::{self, Display, Formatter};
use core::str::FromStr;

use crate::error::FdtError;

/// The value of a `status` property.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Status {
    /// The device is operational.
    #[default]
    Okay,
    /// The device is not currently operational, but might become so.
    Disabled,
    /// The device is operational but shouldn't be used.
    Reserved,
    /// The device is not operational.
    Fail,
    /// The device is not operational, with some device-specific error
    /// condition.
    FailSss,
}

impl Status {
    /// Returns the string stored in the property for this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Okay => "okay",
            Status::Disabled => "disabled",
            Status::Reserved => "reserved",
            Status::Fail => "fail",
            Status::FailSss => "fail-sss",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = FdtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // "ok" predates the specification but is still found in the wild.
            "okay" | "ok" => Ok(Self::Okay),
            "disabled" => Ok(Self::Disabled),
            "reserved" => Ok(Self::Reserved),
            "fail" => Ok(Self::Fail),
            "fail-sss" => Ok(Self::FailSss),
            _ => Err(FdtError::InvalidStatus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!("disabled".parse(), Ok(Status::Disabled));
        assert_eq!("ok".parse(), Ok(Status::Okay));
        assert_eq!("broken".parse::<Status>(), Err(FdtError::InvalidStatus));
        assert_eq!(Status::Disabled.as_str(), "disabled");
    }
}
