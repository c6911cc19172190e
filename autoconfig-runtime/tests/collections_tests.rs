mod common;

use autoconfig_model::{ModelError, ModelResult, ProfileOwner, SaveTarget};
use autoconfig_runtime::{
    DynamicContainer, ProfileConfig, ProfileError, ProfileList, ProfileMap, ProfileRegistry, ProfileState,
};
use common::{Audited, COUNTED_SAVES, Counted, Inventory, registry};
use pretty_assertions::assert_eq;
use serde_json::json;
use serial_test::serial;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Counter {
    saves: AtomicUsize,
    fail: bool,
}

impl Counter {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            saves: AtomicUsize::new(0),
            fail: false,
        })
    }

    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl SaveTarget for Counter {
    fn profile_name(&self) -> &str {
        "Counter"
    }

    fn save_profile(&self) -> ModelResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ModelError::Save("read-only".into()));
        }
        Ok(())
    }
}

fn bound_list(counter: &Arc<Counter>) -> ProfileList<String> {
    let list: ProfileList<String> = ProfileList::new();
    list.bind_owner(ProfileOwner::new(counter));
    list
}

fn bound_map(counter: &Arc<Counter>) -> ProfileMap<String, i64> {
    let map: ProfileMap<String, i64> = ProfileMap::new();
    map.bind_owner(ProfileOwner::new(counter));
    map
}

// ── List saves ───────────────────────────────────────────────────

#[test]
fn each_list_mutation_saves_once() {
    let counter = Counter::new();
    let list = bound_list(&counter);

    list.push("a".into()).unwrap();
    assert_eq!(counter.saves(), 1);
    list.extend(["b".to_string(), "c".to_string()]).unwrap();
    assert_eq!(counter.saves(), 2);
    list.insert(0, "z".into()).unwrap();
    assert_eq!(counter.saves(), 3);
    assert!(list.remove(&"z".to_string()).unwrap());
    assert_eq!(counter.saves(), 4);
    assert_eq!(list.set(0, "A".into()).unwrap(), "a");
    assert_eq!(counter.saves(), 5);
    assert_eq!(list.remove_at(2).unwrap(), "c");
    assert_eq!(counter.saves(), 6);
    list.clear().unwrap();
    assert_eq!(counter.saves(), 7);
    assert!(list.is_empty());
}

#[test]
fn removing_missing_value_still_saves() {
    let counter = Counter::new();
    let list = bound_list(&counter);
    assert!(!list.remove(&"ghost".to_string()).unwrap());
    assert_eq!(counter.saves(), 1);
}

#[test]
fn list_reads_never_save() {
    let counter = Counter::new();
    let list: ProfileList<String> = vec!["a".to_string(), "b".to_string()].into();
    list.bind_owner(ProfileOwner::new(&counter));

    assert!(list.contains(&"a".to_string()));
    assert_eq!(list.index_of(&"b".to_string()), Some(1));
    assert_eq!(list.get(0).as_deref(), Some("a"));
    assert_eq!(list.get(5), None);
    assert_eq!(list.len(), 2);
    assert!(!list.is_empty());
    assert_eq!(list.to_vec(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(list.iter().count(), 2);
    assert_eq!(counter.saves(), 0);
}

#[test]
fn out_of_range_index_fails_without_saving() {
    let counter = Counter::new();
    let list = bound_list(&counter);
    list.push("only".into()).unwrap();

    let err = list.insert(5, "x".into()).unwrap_err();
    assert!(matches!(err, ProfileError::IndexOutOfRange { index: 5, len: 1 }));
    assert!(matches!(list.remove_at(1), Err(ProfileError::IndexOutOfRange { .. })));
    assert!(matches!(list.set(1, "y".into()), Err(ProfileError::IndexOutOfRange { .. })));

    assert_eq!(counter.saves(), 1);
    assert_eq!(list.to_vec(), vec!["only".to_string()]);

    list.insert(1, "end".into()).unwrap();
    assert_eq!(list.to_vec(), vec!["only".to_string(), "end".to_string()]);
}

#[test]
fn unbound_list_mutates_without_saving() {
    let list: ProfileList<i64> = ProfileList::new();
    assert!(!list.is_owned());
    list.push(1).unwrap();
    assert_eq!(list.to_vec(), vec![1]);
}

#[test]
fn dropped_owner_skips_save() {
    let counter = Counter::new();
    let list = bound_list(&counter);
    drop(counter);
    assert!(!list.is_owned());
    list.push("after".into()).unwrap();
}

#[test]
fn save_failure_propagates_after_mutation() {
    let counter = Arc::new(Counter {
        saves: AtomicUsize::new(0),
        fail: true,
    });
    let list = bound_list(&counter);
    let err = list.push("x".into()).unwrap_err();
    assert!(matches!(err, ProfileError::Model(ModelError::Save(_))), "got {err:?}");
    assert_eq!(list.len(), 1);
}

#[test]
fn clones_share_items_and_owner() {
    let counter = Counter::new();
    let list: ProfileList<String> = ProfileList::new();
    let clone = list.clone();
    clone.bind_owner(ProfileOwner::new(&counter));

    list.push("shared".into()).unwrap();
    assert_eq!(clone.to_vec(), vec!["shared".to_string()]);
    assert_eq!(counter.saves(), 1);
    assert!(list.owner().same_target(&clone.owner()));
    assert_eq!(list, clone);
}

// ── Map saves ────────────────────────────────────────────────────

#[test]
fn each_map_mutation_saves_once() {
    let counter = Counter::new();
    let map = bound_map(&counter);

    assert_eq!(map.insert("a".into(), 1).unwrap(), None);
    assert_eq!(map.insert("a".into(), 2).unwrap(), Some(1));
    assert!(map.try_insert("b".into(), 3).unwrap());
    assert!(!map.try_insert("b".into(), 4).unwrap());
    map.extend([("c".to_string(), 5), ("d".to_string(), 6)]).unwrap();
    assert_eq!(map.remove(&"c".to_string()).unwrap(), Some(5));
    assert_eq!(map.remove(&"missing".to_string()).unwrap(), None);
    assert_eq!(counter.saves(), 7);

    map.clear().unwrap();
    assert_eq!(counter.saves(), 8);
    assert!(map.is_empty());
}

#[test]
fn map_reads_never_save() {
    let counter = Counter::new();
    let map: ProfileMap<String, i64> = [("b".to_string(), 2), ("a".to_string(), 1)].into_iter().collect();
    map.bind_owner(ProfileOwner::new(&counter));

    assert!(map.contains_key(&"a".to_string()));
    assert!(map.contains_value(&2));
    assert_eq!(map.get(&"b".to_string()), Some(2));
    assert_eq!(map.keys(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(map.values(), vec![1, 2]);
    assert_eq!(map.len(), 2);
    assert_eq!(
        map.to_map(),
        BTreeMap::from([("a".to_string(), 1), ("b".to_string(), 2)])
    );
    assert_eq!(map.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(counter.saves(), 0);
}

// ── Weakly-typed access ──────────────────────────────────────────

#[test]
fn dynamic_reads_never_save() {
    let counter = Counter::new();
    let list = bound_list(&counter);
    list.push("a".into()).unwrap();

    let dynamic: &dyn DynamicContainer = &list;
    assert_eq!(dynamic.len(), 1);
    assert!(!dynamic.is_empty());
    assert!(dynamic.contains_value(&json!("a")));
    assert!(!dynamic.contains_value(&json!(1)));
    assert_eq!(counter.saves(), 1);

    dynamic.push_value(json!("b")).unwrap();
    assert_eq!(counter.saves(), 2);
    assert!(dynamic.push_value(json!({"not": "a string"})).is_err());
    assert_eq!(counter.saves(), 2);
}

#[test]
fn dynamic_map_pushes_pairs() {
    let counter = Counter::new();
    let map = bound_map(&counter);
    let dynamic: &dyn DynamicContainer = &map;
    dynamic.push_value(json!(["k", 7])).unwrap();
    assert!(dynamic.contains_value(&json!(7)));
    assert_eq!(map.get(&"k".to_string()), Some(7));
    assert_eq!(counter.saves(), 1);
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn containers_serialize_transparently() {
    let list: ProfileList<i64> = vec![1, 2].into();
    assert_eq!(serde_json::to_value(&list).unwrap(), json!([1, 2]));

    let map: ProfileMap<String, bool> = [("on".to_string(), true)].into_iter().collect();
    assert_eq!(serde_json::to_value(&map).unwrap(), json!({"on": true}));

    let back: ProfileList<i64> = serde_json::from_value(json!([3])).unwrap();
    assert_eq!(back.to_vec(), vec![3]);
    assert!(!back.is_owned());
}

// ── Type-bound saves ─────────────────────────────────────────────

#[test]
#[serial]
fn type_bound_list_saves_through_profile_type() {
    let counted = Counted::default();
    let before = COUNTED_SAVES.load(Ordering::SeqCst);

    counted.entries.push(1).unwrap();
    counted.entries.extend([2, 3]).unwrap();
    assert!(!counted.entries.remove(&9).unwrap());
    assert_eq!(COUNTED_SAVES.load(Ordering::SeqCst) - before, 3);

    assert!(counted.entries.contains(&2));
    assert_eq!(counted.entries.len(), 3);
    assert_eq!(COUNTED_SAVES.load(Ordering::SeqCst) - before, 3);
}

// ── Through a registered profile ─────────────────────────────────

#[test]
fn first_read_installs_owner_and_mutations_persist() {
    let (dir, registry) = registry();
    let instance = registry.initialize::<Inventory>().unwrap();

    let raw = instance.read(|inventory| inventory.items.clone());
    assert!(!raw.is_owned());

    let items: ProfileList<String> = registry.get::<Inventory, _>("Items").unwrap();
    assert!(items.is_owned());
    assert!(raw.is_owned(), "clones share the owner slot");

    items.push("apple".into()).unwrap();
    let prices: ProfileMap<String, i64> = registry.get::<Inventory, _>("Prices").unwrap();
    prices.insert("apple".into(), 3).unwrap();
    registry.flush();

    let text = fs::read_to_string(instance.path()).unwrap();
    assert_eq!(text, "[+-Items-+]\n[\"apple\"]\n[+-Prices-+]\n{\"apple\":3}\n");

    let fresh = ProfileRegistry::new(ProfileConfig::with_default_root(dir.path()));
    fresh.initialize::<Inventory>().unwrap();
    let reloaded: ProfileList<String> = fresh.get::<Inventory, _>("Items").unwrap();
    assert_eq!(reloaded.to_vec(), vec!["apple".to_string()]);
}

#[test]
fn set_hook_mutating_owned_container_saves_once_lock_is_released() {
    let (_dir, registry) = registry();
    let instance = registry.initialize::<Audited>().unwrap();
    let history: ProfileList<String> = registry.get::<Audited, _>("History").unwrap();
    assert!(history.is_owned());

    let (done_tx, done_rx) = mpsc::channel();
    let worker = registry.clone();
    std::thread::spawn(move || {
        let _ = done_tx.send(worker.set::<Audited, _>("Name", "north"));
    });
    done_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("set returned")
        .unwrap();
    registry.flush();

    assert_eq!(history.to_vec(), vec!["renamed to north".to_string()]);
    assert_eq!(instance.state(), ProfileState::Persisted);
    let text = fs::read_to_string(instance.path()).unwrap();
    assert_eq!(text, "[+-Name-+]\n\"north\"\n[+-History-+]\n[\"renamed to north\"]\n");
}

#[test]
fn container_outliving_instance_skips_saves() {
    let (_dir, registry) = registry();
    registry.initialize::<Inventory>().unwrap();
    let items: ProfileList<String> = registry.get::<Inventory, _>("Items").unwrap();
    registry.reset::<Inventory>();

    assert!(!items.is_owned());
    items.push("orphan".into()).unwrap();
    assert_eq!(items.len(), 1);
}
