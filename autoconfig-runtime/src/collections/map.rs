use super::{DynamicContainer, InstanceBound, SaveBinding};
use crate::error::ProfileResult;
use autoconfig_model::ProfileOwner;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::{self, Entry};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// A key-ordered map that saves its profile after each mutation.
pub struct ProfileMap<K, V, B = InstanceBound> {
    entries: Arc<RwLock<BTreeMap<K, V>>>,
    binding: B,
}

impl<K: Ord, V, B: SaveBinding + Default> ProfileMap<K, V, B> {
    pub fn new() -> Self {
        Self::with_binding(B::default())
    }
}

impl<K: Ord, V, B: SaveBinding> ProfileMap<K, V, B> {
    pub fn with_binding(binding: B) -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            binding,
        }
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    /// Inserts or replaces, returning the previous value.
    pub fn insert(&self, key: K, value: V) -> ProfileResult<Option<V>> {
        self.mutate(|entries| entries.insert(key, value))
    }

    /// Inserts only when `key` is absent. Returns whether it was inserted;
    /// saves either way.
    pub fn try_insert(&self, key: K, value: V) -> ProfileResult<bool> {
        self.mutate(|entries| match entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            Entry::Occupied(_) => false,
        })
    }

    /// Inserts every pair, then saves once.
    pub fn extend(&self, pairs: impl IntoIterator<Item = (K, V)>) -> ProfileResult<()> {
        self.mutate(|entries| entries.extend(pairs))
    }

    /// Removes `key`. Saves even when the key was absent.
    pub fn remove(&self, key: &K) -> ProfileResult<Option<V>> {
        self.mutate(|entries| entries.remove(key))
    }

    pub fn clear(&self) -> ProfileResult<()> {
        self.mutate(BTreeMap::clear)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.read().values().any(|v| v == value)
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.read().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.read().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.read().clone()
    }

    /// Iterates over a snapshot taken now, in key order.
    pub fn iter(&self) -> btree_map::IntoIter<K, V>
    where
        K: Clone,
        V: Clone,
    {
        self.to_map().into_iter()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<K, V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> ProfileResult<R> {
        let result = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut entries)
        };
        self.binding.fire()?;
        Ok(result)
    }
}

impl<K, V> ProfileMap<K, V, InstanceBound> {
    /// Installs the profile instance this map saves through.
    pub fn bind_owner(&self, owner: ProfileOwner) {
        self.binding.bind(owner);
    }

    pub fn owner(&self) -> ProfileOwner {
        self.binding.owner()
    }

    pub fn is_owned(&self) -> bool {
        self.binding.owner().is_attached()
    }
}

impl<K: Ord, V, B: SaveBinding + Default> Default for ProfileMap<K, V, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, B: SaveBinding> Clone for ProfileMap<K, V, B> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            binding: self.binding.clone(),
        }
    }
}

impl<K: Ord, V, B: SaveBinding + Default> From<BTreeMap<K, V>> for ProfileMap<K, V, B> {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
            binding: B::default(),
        }
    }
}

impl<K: Ord, V, B: SaveBinding + Default> FromIterator<(K, V)> for ProfileMap<K, V, B> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}

impl<K: Ord, V: PartialEq, B: SaveBinding> PartialEq for ProfileMap<K, V, B> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || *self.read() == *other.read()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug, B: SaveBinding> fmt::Debug for ProfileMap<K, V, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.read().iter()).finish()
    }
}

impl<K: Ord + Serialize, V: Serialize, B: SaveBinding> Serialize for ProfileMap<K, V, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

impl<'de, K, V, B> Deserialize<'de> for ProfileMap<K, V, B>
where
    K: Ord + Deserialize<'de>,
    V: Deserialize<'de>,
    B: SaveBinding + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<K, V>::deserialize(deserializer).map(Self::from)
    }
}

/// Elements are `[key, value]` pairs.
impl<K, V, B> DynamicContainer for ProfileMap<K, V, B>
where
    K: Ord + DeserializeOwned,
    V: Serialize + DeserializeOwned,
    B: SaveBinding,
{
    fn len(&self) -> usize {
        ProfileMap::len(self)
    }

    /// Compares against values only.
    fn contains_value(&self, value: &Value) -> bool {
        self.read()
            .values()
            .any(|v| serde_json::to_value(v).is_ok_and(|v| &v == value))
    }

    fn push_value(&self, value: Value) -> ProfileResult<()> {
        let (key, value): (K, V) = serde_json::from_value(value)?;
        self.insert(key, value).map(|_| ())
    }
}
