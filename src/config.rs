use std::fmt;

use futures::Stream;

use crate::{event::ChangeEvent, normalize::NormalizationPolicy};

/// Parameters for [`run`](crate::run).
pub trait Config {
    /// Errors yielded by [`subscribe`](Self::subscribe).
    ///
    /// These are logged and skipped; the subscription is expected to recover by itself.
    type SubscribeErr: fmt::Display + 'static;

    /// Subscribe to the changes to render.
    fn subscribe(&self) -> impl Stream<Item = Result<ChangeEvent, Self::SubscribeErr>> + Unpin;

    /// The policy applied to both sides of every update.
    fn policy(&self) -> NormalizationPolicy;
}

pub struct Builder<StreamErr, Subscriber, SubscriberFn>
where
    Subscriber: Stream<Item = Result<ChangeEvent, StreamErr>>,
    SubscriberFn: Fn() -> Subscriber,
{
    subscriber: SubscriberFn,
    policy: NormalizationPolicy,
}

impl<StreamErr, Subscriber, SubscriberFn> Builder<StreamErr, Subscriber, SubscriberFn>
where
    Subscriber: Stream<Item = Result<ChangeEvent, StreamErr>>,
    SubscriberFn: Fn() -> Subscriber,
{
    /// Replaces the default [`NormalizationPolicy`].
    pub fn policy(mut self, policy: NormalizationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl<StreamErr, Subscriber, SubscriberFn> Config for Builder<StreamErr, Subscriber, SubscriberFn>
where
    StreamErr: fmt::Display + 'static,
    Subscriber: Stream<Item = Result<ChangeEvent, StreamErr>> + Unpin,
    SubscriberFn: Fn() -> Subscriber,
{
    type SubscribeErr = StreamErr;

    fn subscribe(&self) -> impl Stream<Item = Result<ChangeEvent, Self::SubscribeErr>> + Unpin {
        (self.subscriber)()
    }

    fn policy(&self) -> NormalizationPolicy {
        self.policy
    }
}

/// Starts building a [`Config`] around a subscriber, e.g. [`subscriber::changes`](crate::subscriber::changes).
pub fn on<StreamErr, Subscriber, SubscriberFn>(
    subscriber: SubscriberFn,
) -> Builder<StreamErr, Subscriber, SubscriberFn>
where
    Subscriber: Stream<Item = Result<ChangeEvent, StreamErr>>,
    SubscriberFn: Fn() -> Subscriber,
{
    Builder {
        subscriber,
        policy: NormalizationPolicy::default(),
    }
}
