use rstest::rstest;
use serde::Deserialize;
use serde_json::json;
use serde_sexpr::{decode_to_value, from_str, from_str_with_options, DecodeOptions, ErrorKind, Value};

#[derive(Debug, Deserialize)]
struct Envelope {
    id: u32,
    payload: Value,
}

#[rstest]
#[case(r#"("[]int" (1 2 3))"#, json!([1, 2, 3]))]
#[case(r#"("map[string]int" (("a" 1) ("b" 2)))"#, json!({"a": 1, "b": 2}))]
#[case(r#"("[3]float" (1.5 2))"#, json!([1.5, 2.0, 0.0]))]
#[case(r#"("[][]string" (("a") () ("b" "c")))"#, json!([["a"], [], ["b", "c"]]))]
#[case(r#"("map[string][]bool" (("on" (t nil))))"#, json!({"on": [true, false]}))]
#[case(r#"("string" "hi")"#, json!("hi"))]
#[case(r#"("[]int" nil)"#, json!([]))]
#[case(r#"("[2]string" nil)"#, json!(["", ""]))]
fn test_dynamic_slot_to_json(#[case] input: &str, #[case] expected: serde_json::Value) {
    assert_eq!(decode_to_value(input).unwrap().into_json(), expected);
}

#[rstest]
fn test_scalar_shapes_keep_their_kind() {
    assert_eq!(decode_to_value(r#"("uint" 7)"#).unwrap(), Value::Uint(7));
    assert_eq!(decode_to_value(r#"("int" -7)"#).unwrap(), Value::Int(-7));
    assert_eq!(decode_to_value(r#"("float" 7)"#).unwrap(), Value::Float(7.0));
    assert_eq!(decode_to_value(r#"("bool" t)"#).unwrap(), Value::Bool(true));
    assert_eq!(decode_to_value(r#"("bool" nil)"#).unwrap(), Value::Bool(false));
    assert_eq!(decode_to_value(r#"("string" nil)"#).unwrap(), Value::from(""));
}

#[rstest]
fn test_bare_atoms_decode_by_token() {
    assert_eq!(decode_to_value("42").unwrap(), Value::Int(42));
    assert_eq!(decode_to_value("2.5").unwrap(), Value::Float(2.5));
    assert_eq!(decode_to_value(r#""s""#).unwrap(), Value::from("s"));
    assert_eq!(decode_to_value("t").unwrap(), Value::Bool(true));
    assert!(decode_to_value("nil").unwrap().is_nil());
}

#[rstest]
fn test_composite_map_keys() {
    let value = decode_to_value(r#"("map[[2]int]string" (((1 2) "a") ((3 4) "b")))"#).unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.get(&Value::from(vec![1i64, 2])), Some(&Value::from("a")));
    assert_eq!(map.get(&Value::from(vec![3i64, 4])), Some(&Value::from("b")));
}

#[rstest]
fn test_dynamic_field_in_record() {
    let envelope: Envelope = from_str(r#"((id 9) (payload ("[]string" ("x" "y"))))"#).unwrap();
    assert_eq!(envelope.id, 9);
    assert_eq!(envelope.payload.into_json(), json!(["x", "y"]));
}

#[rstest]
fn test_dynamic_elements_in_sequence() {
    let values: Vec<Value> = from_str(r#"(1 ("uint" 2) ("[]int" (3)))"#).unwrap();
    assert_eq!(
        values,
        vec![Value::Int(1), Value::Uint(2), Value::from(vec![3i64])]
    );
}

#[rstest]
#[case(r#"("widget" 1)"#, "widget")]
#[case(r#"("[]widget" (1))"#, "widget")]
#[case(r#"("map[string]" ())"#, "")]
#[case(r#"("[x]int" ())"#, "[x]int")]
fn test_unknown_type(#[case] input: &str, #[case] leaf: &str) {
    let err = decode_to_value(input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownType);
    assert!(err.message.contains(&format!("{leaf:?}")), "{}", err.message);
    assert_eq!(err.location.map(|loc| loc.column), Some(2));
}

#[rstest]
fn test_value_must_fit_shape() {
    let err = decode_to_value(r#"("int" "x")"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Shape);
    assert!(err.message.ends_with("into int"), "{}", err.message);

    let err = decode_to_value(r#"("[]int" (1 "x"))"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Shape);
    assert_eq!(err.location.map(|loc| loc.column), Some(13));

    let err = decode_to_value(r#"("string" (1))"#).unwrap_err();
    assert!(err.message.starts_with("cannot decode list"));
}

#[rstest]
fn test_dynamic_array_overflow() {
    let err = decode_to_value(r#"("[2]int" (1 2 3))"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Shape);
    assert!(err.message.contains("array of length 2"));
}

#[rstest]
fn test_slot_requires_descriptor() {
    let err = decode_to_value("(1 2)").unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert!(err.message.contains("want type descriptor"));
}

#[rstest]
fn test_slot_must_close_after_value() {
    let err = decode_to_value(r#"("int" 1 2)"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[rstest]
#[case(r#"("[4611686018427387903]int" nil)"#)]
#[case(r#"("[4611686018427387903]int" ())"#)]
#[case(r#"("[1048576]string" (""))"#)]
fn test_huge_array_length_is_rejected(#[case] input: &str) {
    let err = decode_to_value(input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownType);
    assert!(err.message.contains("exceeds"));
    assert!(err.location.is_some());
}

#[rstest]
fn test_deep_descriptor_is_rejected() {
    let input = format!("(\"{}int\" nil)", "[]".repeat(200_000));
    let err = decode_to_value(&input).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);
}

#[rstest]
fn test_descriptor_depth_follows_options() {
    let input = format!("(\"{}int\" nil)", "[]".repeat(5));
    let shallow = DecodeOptions::default().with_max_depth(4);
    let err = from_str_with_options::<Value>(&input, &shallow).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);

    let roomy = DecodeOptions::default().with_max_depth(8);
    assert_eq!(
        from_str_with_options::<Value>(&input, &roomy).unwrap(),
        Value::List(Vec::new())
    );
}

#[rstest]
fn test_int_slot_rejects_u64_range() {
    let err = decode_to_value(r#"("int" 18446744073709551615)"#).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Shape);
    assert!(err.message.contains("out of range for int"));
    assert_eq!(err.location.map(|loc| loc.column), Some(8));

    assert_eq!(
        decode_to_value(r#"("uint" 18446744073709551615)"#).unwrap(),
        Value::Uint(u64::MAX)
    );
    assert_eq!(
        decode_to_value(r#"("int" -9223372036854775808)"#).unwrap(),
        Value::Int(i64::MIN)
    );
}
