// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Authorization steps shared by the record handlers.

use crate::application::error::{PlatformError, PlatformResult};
use crate::domain::identity::{AuthResolver, CallerIdentity, RequestContext};
use crate::domain::ownership::Owned;

/// Resolve the caller or fail with `Unauthenticated`.
pub(crate) async fn require_caller(
    resolver: &dyn AuthResolver,
    ctx: &RequestContext,
) -> PlatformResult<CallerIdentity> {
    resolver
        .resolve_caller(ctx)
        .await
        .ok_or(PlatformError::Unauthenticated)
}

/// Keep `record` only when the caller owns it; missing and foreign records
/// produce the same error.
pub(crate) fn owned_by<T: Owned>(
    record: Option<T>,
    caller: &CallerIdentity,
    kind: &'static str,
) -> PlatformResult<T> {
    record
        .filter(|r| r.is_owned_by(&caller.user_id))
        .ok_or(PlatformError::NotFoundOrForbidden(kind))
}

/// Keep `record` only when the caller may read it.
pub(crate) fn visible_to<T: Owned>(record: Option<T>, caller: Option<&CallerIdentity>) -> Option<T> {
    record.filter(|r| r.is_visible_to(caller.map(|c| &c.user_id)))
}
