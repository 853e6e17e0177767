//! Typed identifiers for identity entities

use kernel::id::Id;

pub struct UserMarker;
pub type UserId = Id<UserMarker>;

pub struct SessionMarker;
pub type SessionId = Id<SessionMarker>;

pub struct CodeMarker;
pub type CodeId = Id<CodeMarker>;
