//! Property tests: what a strategy saves, it loads back unchanged.

mod common;

use autoconfig_runtime::{ProfileConfig, ProfileRegistry};
use common::{JsonWide, Nested, Wide, registry};
use proptest::prelude::*;
use std::collections::BTreeMap;
use tempfile::TempDir;

/// Lines mixing plain text with header-like and backslash-led lines.
fn note_strategy() -> impl Strategy<Value = String> {
    let line = prop_oneof![
        prop::string::string_regex(r"\[\+-[A-Za-z]{0,6}-\+\]").unwrap(),
        prop::string::string_regex(r"\\[a-z\\]{0,6}").unwrap(),
        prop::string::string_regex(r#"[a-z0-9 "{}:,]{0,10}"#).unwrap(),
    ];
    prop::collection::vec(line, 0..5).prop_map(|lines| lines.join("\n"))
}

fn nested_strategy() -> impl Strategy<Value = Nested> {
    (any::<i64>(), note_strategy()).prop_map(|(id, label)| Nested { id, label })
}

fn table_strategy() -> impl Strategy<Value = BTreeMap<i32, String>> {
    prop::collection::btree_map(any::<i32>(), "[a-z ]{0,8}", 0..4)
}

/// Quarter steps stay exact through a JSON number.
fn ratio_strategy() -> impl Strategy<Value = f64> {
    (-4000i32..4000).prop_map(|n| f64::from(n) / 4.0)
}

prop_compose! {
    fn wide_strategy()(
        flag in any::<bool>(),
        ratio in ratio_strategy(),
        maybe in prop::option::of(any::<u32>()),
        big in any::<u64>(),
        table in table_strategy(),
        nested in nested_strategy(),
        note in note_strategy(),
    ) -> Wide {
        Wide { flag, ratio, maybe, big, table, nested, note }
    }
}

fn json_wide(wide: &Wide) -> JsonWide {
    JsonWide {
        flag: wide.flag,
        ratio: wide.ratio,
        maybe: wide.maybe,
        big: wide.big,
        table: wide.table.clone(),
        nested: wide.nested.clone(),
        note: wide.note.clone(),
    }
}

/// A registry with nothing on disk yet.
fn empty_registry() -> (TempDir, ProfileRegistry) {
    let dir = TempDir::new().unwrap();
    let registry = ProfileRegistry::new(ProfileConfig::with_default_root(dir.path()));
    (dir, registry)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Dictionary export imported into a fresh default instance restores every field.
    #[test]
    fn dictionary_save_then_load_restores_profile(wide in wide_strategy()) {
        let (_dir, source) = registry();
        source.initialize::<Wide>().unwrap();
        wide.apply(&source).unwrap();
        let text = source.export::<Wide>().unwrap();
        source.flush();

        let (_other, target) = empty_registry();
        target.initialize::<Wide>().unwrap();
        target.import::<Wide>(&text).unwrap();
        prop_assert_eq!(target.current::<Wide>().unwrap().read(Wide::clone), wide);
    }

    /// JSON export imported into a fresh default instance restores every field.
    #[test]
    fn json_save_then_load_restores_profile(wide in wide_strategy()) {
        let expected = json_wide(&wide);
        let (_dir, source) = registry();
        source.initialize::<JsonWide>().unwrap();
        expected.apply(&source).unwrap();
        let text = source.export::<JsonWide>().unwrap();
        source.flush();

        let (_other, target) = empty_registry();
        target.initialize::<JsonWide>().unwrap();
        target.import::<JsonWide>(&text).unwrap();
        prop_assert_eq!(target.current::<JsonWide>().unwrap().read(JsonWide::clone), expected);
    }
}
