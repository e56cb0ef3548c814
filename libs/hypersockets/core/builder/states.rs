//! Type-state markers for the builder
//!
//! The URL and router stages carry their data, so `build()` only exists
//! once both are present and never has to unwrap an option.

use super::RoutingBuilder;
use crate::traits::MessageRouter;

/// Marker trait for URL state
pub trait UrlState {}

/// URL has not been set
pub struct NoUrl;
impl UrlState for NoUrl {}

/// URL has been set
pub struct HasUrl(pub(crate) String);
impl UrlState for HasUrl {}

/// Marker trait for Router state
pub trait RouterState {}

/// Router has not been set
pub struct NoRouter;
impl RouterState for NoRouter {}

/// Router and its per-route handlers have been set
pub struct HasRouter<R>
where
    R: MessageRouter,
{
    pub(crate) router: R,
    pub(crate) routing: RoutingBuilder<R>,
}
impl<R> RouterState for HasRouter<R> where R: MessageRouter {}
