use super::{DynamicContainer, InstanceBound, SaveBinding};
use crate::error::{ProfileError, ProfileResult};
use autoconfig_model::ProfileOwner;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// An ordered list that saves its profile after each mutation.
pub struct ProfileList<T, B = InstanceBound> {
    items: Arc<RwLock<Vec<T>>>,
    binding: B,
}

impl<T, B: SaveBinding + Default> ProfileList<T, B> {
    pub fn new() -> Self {
        Self::with_binding(B::default())
    }
}

impl<T, B: SaveBinding> ProfileList<T, B> {
    pub fn with_binding(binding: B) -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            binding,
        }
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    pub fn push(&self, item: T) -> ProfileResult<()> {
        self.mutate(|items| items.push(item))
    }

    /// Appends every item, then saves once.
    pub fn extend(&self, items: impl IntoIterator<Item = T>) -> ProfileResult<()> {
        self.mutate(|current| current.extend(items))
    }

    /// Inserts at `index`; `index == len` appends.
    pub fn insert(&self, index: usize, item: T) -> ProfileResult<()> {
        self.mutate_checked(index, true, |items| items.insert(index, item))
    }

    /// Removes the first element equal to `item`. Saves even when nothing
    /// was removed.
    pub fn remove(&self, item: &T) -> ProfileResult<bool>
    where
        T: PartialEq,
    {
        self.mutate(|items| match items.iter().position(|x| x == item) {
            Some(index) => {
                items.remove(index);
                true
            }
            None => false,
        })
    }

    pub fn remove_at(&self, index: usize) -> ProfileResult<T> {
        self.mutate_checked(index, false, |items| items.remove(index))
    }

    pub fn clear(&self) -> ProfileResult<()> {
        self.mutate(Vec::clear)
    }

    /// Replaces the element at `index`, returning the old one.
    pub fn set(&self, index: usize, item: T) -> ProfileResult<T> {
        self.mutate_checked(index, false, |items| std::mem::replace(&mut items[index], item))
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.read().contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize>
    where
        T: PartialEq,
    {
        self.read().iter().position(|x| x == item)
    }

    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.read().clone()
    }

    /// Iterates over a snapshot taken now.
    pub fn iter(&self) -> std::vec::IntoIter<T>
    where
        T: Clone,
    {
        self.to_vec().into_iter()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> ProfileResult<R> {
        let result = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut items)
        };
        self.binding.fire()?;
        Ok(result)
    }

    /// Like `mutate`, but fails without mutating or saving when `index` is
    /// out of range. `allow_end` admits `index == len`.
    fn mutate_checked<R>(&self, index: usize, allow_end: bool, f: impl FnOnce(&mut Vec<T>) -> R) -> ProfileResult<R> {
        let result = {
            let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
            let len = items.len();
            if index > len || (index == len && !allow_end) {
                return Err(ProfileError::IndexOutOfRange { index, len });
            }
            f(&mut items)
        };
        self.binding.fire()?;
        Ok(result)
    }
}

impl<T> ProfileList<T, InstanceBound> {
    /// Installs the profile instance this list saves through.
    pub fn bind_owner(&self, owner: ProfileOwner) {
        self.binding.bind(owner);
    }

    pub fn owner(&self) -> ProfileOwner {
        self.binding.owner()
    }

    /// Whether saves currently reach a live instance.
    pub fn is_owned(&self) -> bool {
        self.binding.owner().is_attached()
    }
}

impl<T, B: SaveBinding + Default> Default for ProfileList<T, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, B: SaveBinding> Clone for ProfileList<T, B> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
            binding: self.binding.clone(),
        }
    }
}

impl<T, B: SaveBinding + Default> From<Vec<T>> for ProfileList<T, B> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: Arc::new(RwLock::new(items)),
            binding: B::default(),
        }
    }
}

impl<T, B: SaveBinding + Default> FromIterator<T> for ProfileList<T, B> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: PartialEq, B: SaveBinding> PartialEq for ProfileList<T, B> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.items, &other.items) || *self.read() == *other.read()
    }
}

impl<T: fmt::Debug, B: SaveBinding> fmt::Debug for ProfileList<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.read().iter()).finish()
    }
}

impl<T: Serialize, B: SaveBinding> Serialize for ProfileList<T, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>, B: SaveBinding + Default> Deserialize<'de> for ProfileList<T, B> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T, B> DynamicContainer for ProfileList<T, B>
where
    T: Serialize + DeserializeOwned,
    B: SaveBinding,
{
    fn len(&self) -> usize {
        ProfileList::len(self)
    }

    fn contains_value(&self, value: &Value) -> bool {
        self.read()
            .iter()
            .any(|item| serde_json::to_value(item).is_ok_and(|item| &item == value))
    }

    fn push_value(&self, value: Value) -> ProfileResult<()> {
        self.push(serde_json::from_value(value)?)
    }
}
