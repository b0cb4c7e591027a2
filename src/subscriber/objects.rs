use std::{collections::HashSet, fmt::Debug, hash::Hash};

use futures::{stream, Stream, TryStreamExt};
use kube_client::Api;
use kube_core::{Resource, ResourceExt};
use kube_runtime::{reflector, watcher, WatchStreamExt};
use serde::{de::DeserializeOwned, Serialize};

use super::Error;
use crate::event::{ChangeEvent, Snapshot};

/// Subscriber producing a [`ChangeEvent`] for every change to objects of the type `dyntype`.
///
/// Transient watch failures are yielded as [`Error::Watch`] and retried with backoff.
pub fn changes<K>(
    api: Api<K>,
    watcher_config: watcher::Config,
    dyntype: K::DynamicType,
) -> impl Stream<Item = Result<ChangeEvent, Error>>
where
    K: 'static + Resource + Debug + Clone + DeserializeOwned + Serialize + Send,
    K::DynamicType: Clone + Eq + Hash,
{
    let mut tracker = Tracker::new(dyntype);

    watcher(api, watcher_config)
        .default_backoff()
        .map_err(Error::Watch)
        .map_ok(move |event| {
            let changes: Vec<_> = match tracker.track(event) {
                Ok(changes) => changes.into_iter().map(Ok).collect(),
                Err(err) => vec![Err(Error::Snapshot(err))],
            };
            stream::iter(changes)
        })
        .try_flatten()
}

/// Remembers the last seen version of every object to pair watch events with their previous state.
pub struct Tracker<K>
where
    K: 'static + Resource,
    K::DynamicType: Clone + Eq + Hash,
{
    writer: reflector::store::Writer<K>,
    store: reflector::Store<K>,
    dyntype: K::DynamicType,
}

impl<K> Tracker<K>
where
    K: 'static + Resource + Clone + Serialize,
    K::DynamicType: Clone + Eq + Hash,
{
    pub fn new(dyntype: K::DynamicType) -> Self {
        let writer = reflector::store::Writer::new(dyntype.clone());
        let store = writer.as_reader();
        Self {
            writer,
            store,
            dyntype,
        }
    }

    /// Translates a watch event into change events and records it.
    ///
    /// A relist reports objects missing from the new list as deleted, unknown objects as added,
    /// and known objects as updated only if their `resourceVersion` moved.
    pub fn track(&mut self, event: watcher::Event<K>) -> Result<Vec<ChangeEvent>, serde_json::Error> {
        let changes = match &event {
            watcher::Event::Applied(obj) => self.applied(obj).map(|change| vec![change]),
            watcher::Event::Deleted(obj) => Snapshot::from_object(obj).map(|s| vec![ChangeEvent::Deleted(s)]),
            watcher::Event::Restarted(objs) => self.relisted(objs),
        };
        self.writer.apply_watcher_event(&event);
        changes
    }

    fn key(&self, obj: &K) -> reflector::ObjectRef<K> {
        reflector::ObjectRef::from_obj_with(obj, self.dyntype.clone())
    }

    fn applied(&self, obj: &K) -> Result<ChangeEvent, serde_json::Error> {
        let after = Snapshot::from_object(obj)?;
        Ok(match self.store.get(&self.key(obj)) {
            Some(prev) => ChangeEvent::Updated {
                before: Snapshot::from_object(&*prev)?,
                after,
            },
            None => ChangeEvent::Added(after),
        })
    }

    fn relisted(&self, objs: &[K]) -> Result<Vec<ChangeEvent>, serde_json::Error> {
        let listed: HashSet<_> = objs.iter().map(|obj| self.key(obj)).collect();

        let mut gone: Vec<_> = self
            .store
            .state()
            .into_iter()
            .filter(|prev| !listed.contains(&self.key(prev)))
            .collect();
        gone.sort_by_key(|prev| (prev.namespace(), prev.name_any()));

        let mut changes = Vec::with_capacity(gone.len() + objs.len());
        for prev in gone {
            changes.push(ChangeEvent::Deleted(Snapshot::from_object(&*prev)?));
        }
        for obj in objs {
            match self.store.get(&self.key(obj)) {
                None => changes.push(ChangeEvent::Added(Snapshot::from_object(obj)?)),
                Some(prev) if prev.resource_version() != obj.resource_version() => {
                    changes.push(ChangeEvent::Updated {
                        before: Snapshot::from_object(&*prev)?,
                        after: Snapshot::from_object(obj)?,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(changes)
    }
}
