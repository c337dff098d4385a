/// Solid objects.
///
/// - **volume**: collision boxes and multi-volume bodies
/// - **contact**: per-tick contact classification results
/// - **riding**: resolver-owned support records and standing latches
/// - **resolver**: the per-tick resolution pass

pub mod contact;
pub mod resolver;
pub mod riding;
pub mod volume;

pub use contact::{ContactResult, ObjectContacts};
pub use resolver::{resolve_actor, resolve_solids, ActorResolution, ResolverRules, VolumeSnapshot};
pub use riding::{RideRecord, RidingState, StandingLatch, VolumeKey};
pub use volume::{SolidBody, SolidPiece, SolidVolume};
