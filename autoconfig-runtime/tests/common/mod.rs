//! Shared fixtures for runtime tests.

#![allow(dead_code)]

use autoconfig_model::{
    GetFlow, GetScope, HookArg, ProfileOperationMode, ProfileSchema, SetFlow, SetScope, get_hook, profile_schema,
    set_hook,
};
use autoconfig_runtime::{
    AccessorHooks, CustomOperations, Profile, ProfileConfig, ProfileList, ProfileMap, ProfileRegistry, ProfileResult,
    ProfileSettings, SynthesisMode, TypeBound,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A registry rooted in a fresh temporary directory.
pub fn registry() -> (TempDir, ProfileRegistry) {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let registry = ProfileRegistry::new(ProfileConfig::with_default_root(dir.path()));
    (dir, registry)
}

// ── Plain profiles ───────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    pub name: String,
    pub count: i64,
}

impl AccessorHooks for Shop {}

impl Profile for Shop {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Shop { name: String, count: i64 })
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonShop {
    pub name: String,
    pub count: i64,
    pub tags: Vec<String>,
}

impl AccessorHooks for JsonShop {}

impl Profile for JsonShop {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(JsonShop {
            name: String,
            count: i64,
            tags: Vec<String>,
        })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_mode(ProfileOperationMode::Json)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlShop {
    pub title: String,
    pub enabled: bool,
    pub limit: u32,
}

impl Default for XmlShop {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            enabled: false,
            limit: 10,
        }
    }
}

impl AccessorHooks for XmlShop {}

impl Profile for XmlShop {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(XmlShop {
            title: String,
            enabled: bool,
            limit: u32,
        })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_mode(ProfileOperationMode::Xml)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Manual {
    pub flag: bool,
}

impl AccessorHooks for Manual {}

impl Profile for Manual {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Manual { flag: bool })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_auto_load(false)
    }
}

/// Root for profiles whose settings carry an explicit path.
pub fn override_root() -> &'static Path {
    static ROOT: OnceLock<TempDir> = OnceLock::new();
    ROOT.get_or_init(|| TempDir::new().unwrap()).path()
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Relocated {
    pub port: u16,
}

impl AccessorHooks for Relocated {}

impl Profile for Relocated {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Relocated { port: u16 })
    }

    fn profile_name() -> String {
        "relocated".to_string()
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_path(override_root().join("nested").join("server"))
    }
}

/// Two fields that derive the same accessor name.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Clash {
    pub _name: String,
    pub name: String,
}

impl AccessorHooks for Clash {}

impl Profile for Clash {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Clash { _name: String, name: String })
    }
}

// ── Hooked profile ───────────────────────────────────────────────

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Hooked {
    pub _title: String,
    pub greeting: String,
    pub answer: i64,
    pub level: i64,
    pub motto: String,
    pub locked: bool,
    pub label: String,
    pub stamp: String,
    pub ghost: String,
}

fn default_title(scope: &GetScope<'_, Hooked>) -> GetFlow {
    if scope.profile()._title.is_empty() {
        GetFlow::Return(json!("untitled"))
    } else {
        GetFlow::Continue
    }
}

fn clamp_level(scope: &mut SetScope<'_, Hooked>) -> SetFlow {
    let level = scope.value().as_i64().unwrap_or(0).clamp(0, 10);
    scope.set_value(json!(level));
    SetFlow::Continue
}

fn guard_motto(scope: &mut SetScope<'_, Hooked>) -> SetFlow {
    if scope.profile().locked {
        SetFlow::Handled
    } else {
        SetFlow::Continue
    }
}

fn shout_motto(scope: &mut SetScope<'_, Hooked>) -> SetFlow {
    if let Some(loud) = scope.value().as_str().map(str::to_uppercase) {
        scope.set_value(json!(loud));
    }
    SetFlow::Continue
}

impl AccessorHooks for Hooked {}

impl Profile for Hooked {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Hooked {
            _title: String => |field| field.add_get(get_hook("default_title(profile)", default_title)),
            greeting: String => |field| field.add_get(HookArg::template("Hello, {Title}!")),
            answer: i64 => |field| field.add_get(HookArg::literal("42")),
            level: i64 => |field| field.add_set(set_hook("clamp(value, 0, 10)", clamp_level)),
            motto: String => |field| field
                .add_set(set_hook("shout(value)", shout_motto))
                .add_set(set_hook("guard(locked)", guard_motto)),
            locked: bool,
            label: String => |field| field.add_set(HookArg::template("[{value}]")),
            stamp: String => |field| field.add_set(HookArg::literal("stamped")),
            ghost: String => |field| field
                .add_get(HookArg::Unrecognized("$$ghost".to_string()))
                .add_set(HookArg::Unrecognized("$$ghost".to_string())),
        })
    }
}

// ── Split-mode profile ───────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Split {
    pub amount: i64,
    #[serde(skip)]
    pub reads: AtomicUsize,
    #[serde(skip)]
    pub writes: usize,
}

impl AccessorHooks for Split {
    fn before_get(&self, _accessor: &str) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }

    fn before_set(&mut self, _accessor: &str, value: &mut Value) {
        self.writes += 1;
        if let Some(amount) = value.as_i64() {
            *value = json!(amount * 2);
        }
    }
}

impl Profile for Split {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Split { amount: i64 })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_synthesis(SynthesisMode::Split)
    }
}

// ── Custom-mode profile ──────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    pub holder: String,
    pub balance: i64,
}

impl AccessorHooks for Ledger {}

impl Profile for Ledger {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Ledger { holder: String, balance: i64 })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_mode(ProfileOperationMode::Custom)
    }

    fn custom_operations() -> CustomOperations<Self> {
        CustomOperations::new()
            .with_save(|ledger: &Ledger| Ok(format!("{};{}", ledger.holder, ledger.balance)))
            .with_load(|ledger: &mut Ledger, text: &str| {
                let (holder, balance) = text.split_once(';').unwrap_or((text, "0"));
                ledger.holder = holder.to_string();
                ledger.balance = balance.trim().parse().unwrap_or(0);
                Ok(None)
            })
            .with_extension(".ledger")
    }
}

/// Custom mode with no delegates at all.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Bare {
    pub value: i64,
}

impl AccessorHooks for Bare {}

impl Profile for Bare {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Bare { value: i64 })
    }

    fn settings() -> ProfileSettings {
        ProfileSettings::default().with_mode(ProfileOperationMode::Custom)
    }
}

// ── Wide profiles ────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nested {
    pub id: i64,
    pub label: String,
}

/// One field of each shape the persistence strategies have to carry.
macro_rules! wide_profile {
    ($name:ident, $mode:expr) => {
        #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub flag: bool,
            pub ratio: f64,
            pub maybe: Option<u32>,
            pub big: u64,
            pub table: BTreeMap<i32, String>,
            pub nested: Nested,
            pub note: String,
        }

        impl AccessorHooks for $name {}

        impl Profile for $name {
            fn schema() -> ProfileSchema<Self> {
                profile_schema!($name {
                    flag: bool,
                    ratio: f64,
                    maybe: Option<u32>,
                    big: u64,
                    table: BTreeMap<i32, String>,
                    nested: Nested,
                    note: String,
                })
            }

            fn settings() -> ProfileSettings {
                ProfileSettings::default().with_mode($mode)
            }
        }

        impl $name {
            /// Writes every field through its accessor.
            pub fn apply(&self, registry: &ProfileRegistry) -> ProfileResult<()> {
                registry.set::<$name, _>("Flag", self.flag)?;
                registry.set::<$name, _>("Ratio", self.ratio)?;
                registry.set::<$name, _>("Maybe", self.maybe)?;
                registry.set::<$name, _>("Big", self.big)?;
                registry.set::<$name, _>("Table", &self.table)?;
                registry.set::<$name, _>("Nested", &self.nested)?;
                registry.set::<$name, _>("Note", &self.note)
            }
        }
    };
}

wide_profile!(Wide, ProfileOperationMode::Dictionary);
wide_profile!(JsonWide, ProfileOperationMode::Json);

// ── Container profiles ───────────────────────────────────────────

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub items: ProfileList<String>,
    pub prices: ProfileMap<String, i64>,
}

fn bind_items(scope: &GetScope<'_, Inventory>) -> GetFlow {
    scope.profile().items.bind_owner(scope.owner());
    GetFlow::Continue
}

fn bind_prices(scope: &GetScope<'_, Inventory>) -> GetFlow {
    scope.profile().prices.bind_owner(scope.owner());
    GetFlow::Continue
}

impl AccessorHooks for Inventory {}

impl Profile for Inventory {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Inventory {
            items: ProfileList<String> => |field| field.add_get(get_hook("bind_owner(items)", bind_items)),
            prices: ProfileMap<String, i64> => |field| field.add_get(get_hook("bind_owner(prices)", bind_prices)),
        })
    }
}

/// A set hook that records every rename in a list the profile owns.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Audited {
    pub name: String,
    pub history: ProfileList<String>,
}

fn record_rename(scope: &mut SetScope<'_, Audited>) -> SetFlow {
    let entry = format!("renamed to {}", scope.value().as_str().unwrap_or_default());
    let _ = scope.profile().history.push(entry);
    SetFlow::Continue
}

fn bind_history(scope: &GetScope<'_, Audited>) -> GetFlow {
    scope.profile().history.bind_owner(scope.owner());
    GetFlow::Continue
}

impl AccessorHooks for Audited {}

impl Profile for Audited {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Audited {
            name: String => |field| field.add_set(set_hook("record_rename(value)", record_rename)),
            history: ProfileList<String> => |field| field.add_get(get_hook("bind_owner(history)", bind_history)),
        })
    }
}

/// Save count of [`Counted::save_profile`].
pub static COUNTED_SAVES: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Counted {
    pub entries: ProfileList<i64, TypeBound<Counted>>,
}

impl AccessorHooks for Counted {}

impl Profile for Counted {
    fn schema() -> ProfileSchema<Self> {
        profile_schema!(Counted {
            entries: ProfileList<i64, TypeBound<Counted>>,
        })
    }

    fn save_profile() -> ProfileResult<()> {
        COUNTED_SAVES.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
