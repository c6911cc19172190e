use autoconfig_model::{DICTIONARY_EXTENSION, JSON_EXTENSION, ProfileOperationMode, XML_EXTENSION};

#[test]
fn dictionary_is_default() {
    assert_eq!(ProfileOperationMode::default(), ProfileOperationMode::Dictionary);
}

#[test]
fn extensions_per_mode() {
    assert_eq!(ProfileOperationMode::Dictionary.default_extension(), Some(DICTIONARY_EXTENSION));
    assert_eq!(ProfileOperationMode::Json.default_extension(), Some(JSON_EXTENSION));
    assert_eq!(ProfileOperationMode::Xml.default_extension(), Some(XML_EXTENSION));
    assert_eq!(ProfileOperationMode::Custom.default_extension(), None);
}

#[test]
fn only_whole_object_modes_replace_instance() {
    assert!(!ProfileOperationMode::Dictionary.replaces_instance());
    assert!(ProfileOperationMode::Json.replaces_instance());
    assert!(ProfileOperationMode::Xml.replaces_instance());
    assert!(!ProfileOperationMode::Custom.replaces_instance());
}

#[test]
fn parses_names_case_insensitively() {
    assert_eq!("JSON".parse::<ProfileOperationMode>(), Ok(ProfileOperationMode::Json));
    assert_eq!("xpf".parse::<ProfileOperationMode>(), Ok(ProfileOperationMode::Dictionary));
    assert!("yaml".parse::<ProfileOperationMode>().is_err());
}

#[test]
fn serde_uses_snake_case() {
    let text = serde_json::to_string(&ProfileOperationMode::Custom).unwrap();
    assert_eq!(text, "\"custom\"");
    let mode: ProfileOperationMode = serde_json::from_str("\"xml\"").unwrap();
    assert_eq!(mode, ProfileOperationMode::Xml);
    assert_eq!(mode.to_string(), "xml");
}
