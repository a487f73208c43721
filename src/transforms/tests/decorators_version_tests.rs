//! Version dispatch: flag encoding, helper selection, and construction-time
//! configuration errors.

use super::*;
use crate::diagnostics::codes;
use crate::transforms::decorators_class::ElementKind;

#[test]
fn test_parse_round_trip() {
    for s in ["2021-12", "2022-03", "2023-01", "2023-05"] {
        let v = DecoratorVersion::parse(s).expect("known version");
        assert_eq!(v.as_str(), s);
    }
    assert!(DecoratorVersion::parse("2022-02").is_none());
    assert!(DecoratorVersion::parse("legacy").is_none());
}

#[test]
fn test_flag_encoding_2023_05_is_bitwise() {
    let v = DecoratorVersion::V2023_05;
    assert_eq!(v.encode_flag(ElementKind::Field, false, false), 0);
    assert_eq!(v.encode_flag(ElementKind::Accessor, false, false), 1);
    assert_eq!(v.encode_flag(ElementKind::Method, false, false), 2);
    assert_eq!(v.encode_flag(ElementKind::Getter, false, false), 3);
    assert_eq!(v.encode_flag(ElementKind::Setter, false, false), 4);
    // Bit 3: static. Bit 4: receiver pairs.
    assert_eq!(v.encode_flag(ElementKind::Field, true, false), 8);
    assert_eq!(v.encode_flag(ElementKind::Method, true, false), 10);
    assert_eq!(v.encode_flag(ElementKind::Field, false, true), 16);
    assert_eq!(v.encode_flag(ElementKind::Setter, true, true), 28);
}

#[test]
fn test_flag_encoding_legacy_adds_five_for_static() {
    for v in [
        DecoratorVersion::V2021_12,
        DecoratorVersion::V2022_03,
        DecoratorVersion::V2023_01,
    ] {
        assert_eq!(v.encode_flag(ElementKind::Field, false, false), 0);
        assert_eq!(v.encode_flag(ElementKind::Field, true, false), 5);
        assert_eq!(v.encode_flag(ElementKind::Method, true, false), 7);
        assert_eq!(v.encode_flag(ElementKind::Setter, true, false), 9);
        // Receivers are never tracked before "2023-05".
        assert_eq!(
            v.encode_flag(ElementKind::Field, false, true),
            v.encode_flag(ElementKind::Field, false, false)
        );
    }
}

#[test]
fn test_unknown_version_is_a_config_error() {
    let options = DecoratorOptions {
        version: "2022-02".to_string(),
        ..Default::default()
    };
    let err = DecoratorLowering::new(&options).expect_err("unknown version");
    assert_eq!(err.code, codes::UNKNOWN_DECORATOR_VERSION);
    assert!(err.span.is_dummy());
}

#[test]
fn test_host_too_old_is_a_config_error() {
    let options = DecoratorOptions {
        version: "2023-05".to_string(),
        host_version: (7, 20, 3),
        ..Default::default()
    };
    let err = DecoratorLowering::new(&options).expect_err("host too old");
    assert_eq!(err.code, codes::HOST_VERSION_TOO_OLD);

    let ok = DecoratorOptions {
        version: "2021-12".to_string(),
        host_version: (7, 16, 0),
        ..Default::default()
    };
    assert!(DecoratorLowering::new(&ok).is_ok());

    let too_old = DecoratorOptions {
        version: "2022-03".to_string(),
        host_version: (7, 18, 9),
        ..Default::default()
    };
    assert!(DecoratorLowering::new(&too_old).is_err());
}

#[test]
fn test_version_accessor() {
    let pass = DecoratorLowering::new(&DecoratorOptions::default()).expect("valid options");
    assert_eq!(pass.version(), DecoratorVersion::V2023_05);
}
