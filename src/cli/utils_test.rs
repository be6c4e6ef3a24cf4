use crate::cli::error::CliError;
use crate::cli::utils::*;
use crate::db::Properties;

#[test]
fn test_truncate_with_ellipsis_short_string() {
    let result = truncate_with_ellipsis("hello", 10);
    assert_eq!(result, "hello");
}

#[test]
fn test_truncate_with_ellipsis_long_string() {
    let result = truncate_with_ellipsis("hello world this is a long string", 10);
    assert_eq!(result, "hello w...");
}

#[test]
fn test_truncate_with_ellipsis_unicode() {
    let result = truncate_with_ellipsis("hello 世界", 7);
    assert_eq!(result, "hell...");
}

#[test]
fn test_parse_properties() {
    let inputs = vec![
        "color=red".to_string(),
        "note=a=b".to_string(),
        "empty=".to_string(),
    ];

    let properties = parse_properties(&inputs).unwrap();

    assert_eq!(properties["color"], "red");
    assert_eq!(properties["note"], "a=b");
    assert_eq!(properties["empty"], "");
}

#[test]
fn test_parse_properties_later_key_wins() {
    let inputs = vec!["a=1".to_string(), "a=2".to_string()];
    assert_eq!(parse_properties(&inputs).unwrap()["a"], "2");
}

#[test]
fn test_parse_properties_rejects_bad_input() {
    for input in ["novalue", "=x", "_lm=2017", "_private=1"] {
        let err = parse_properties(&[input.to_string()]).unwrap_err();
        assert!(
            matches!(err, CliError::InvalidProperty { .. }),
            "accepted {}",
            input
        );
    }
}

#[test]
fn test_format_properties() {
    let mut properties = Properties::new();
    assert_eq!(format_properties(&properties, 20), "-");

    properties.insert("b".to_string(), "2".to_string());
    properties.insert("a".to_string(), "1".to_string());
    assert_eq!(format_properties(&properties, 20), "a=1, b=2");
    assert_eq!(format_properties(&properties, 6), "a=1...");
}
