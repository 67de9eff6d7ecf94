// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Ownership and visibility rules shared by every owned aggregate.
//!
//! Writes require the caller to be the owner. Reads are allowed for the
//! owner, or for anyone when the record is public. A record that fails the
//! read check is reported as absent so callers cannot detect existence.

use crate::domain::identity::UserId;

pub trait Owned {
    /// The user stamped on the record at creation.
    fn owner(&self) -> &UserId;

    /// Whether the record is readable by non-owners.
    fn is_public(&self) -> bool {
        false
    }

    fn is_owned_by(&self, user: &UserId) -> bool {
        self.owner() == user
    }

    fn is_visible_to(&self, caller: Option<&UserId>) -> bool {
        self.is_public() || caller.is_some_and(|user| self.is_owned_by(user))
    }
}
