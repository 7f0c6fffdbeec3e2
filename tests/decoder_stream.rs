use rstest::rstest;
use serde::Deserialize;
use serde_sexpr::{DecodeOptions, Decoder, ErrorKind, Token, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct Entry {
    key: String,
    hits: u32,
}

#[rstest]
fn test_token_walk() {
    let mut decoder = Decoder::new(r#"(a "b" 3)"#);
    let expected = [
        Token::StartList,
        Token::Symbol("a".into()),
        Token::String("b".into()),
        Token::Int(3),
        Token::EndList,
    ];
    for want in expected {
        assert_eq!(decoder.token().unwrap(), want);
    }
    let err = decoder.token().unwrap_err();
    assert!(err.is_eof());
}

#[rstest]
fn test_token_unquotes_strings() {
    let mut decoder = Decoder::new(r#""tab\there" -5"#);
    assert_eq!(decoder.token().unwrap(), Token::String("tab\there".into()));
    assert_eq!(decoder.token().unwrap(), Token::Int(-5));
}

#[rstest]
#[case("@")]
#[case("1.25")]
fn test_token_rejects_other_lexemes(#[case] input: &str) {
    let err = Decoder::new(input).token().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert!(err.message.starts_with("unexpected token"), "{}", err.message);
}

#[rstest]
fn test_decode_elements_inside_open_list() {
    let input = r#"(
        ((key "a") (hits 1))
        ((key "b") (hits 2))
    )"#;
    let mut decoder = Decoder::new(input);
    assert_eq!(decoder.token().unwrap(), Token::StartList);
    let first: Entry = decoder.decode().unwrap();
    let second: Entry = decoder.decode().unwrap();
    assert_eq!(decoder.token().unwrap(), Token::EndList);
    decoder.end().unwrap();
    assert_eq!(
        first,
        Entry {
            key: "a".into(),
            hits: 1
        }
    );
    assert_eq!(second.key, "b");
}

#[rstest]
fn test_decode_stream_of_values() {
    let mut decoder = Decoder::new(r#"((key "a") (hits 1)) ((key "b") (hits 2))"#);
    let first: Entry = decoder.decode().unwrap();
    let second: Entry = decoder.decode().unwrap();
    assert_eq!(first.key, "a");
    assert_eq!(second.hits, 2);
    assert!(!decoder.more().unwrap());
    decoder.end().unwrap();
}

#[rstest]
fn test_values_iterator() {
    let mut decoder = Decoder::new(r#"1 ("uint" 2) "three""#);
    let values: Vec<Value> = decoder.values::<Value>().collect::<Result<_, _>>().unwrap();
    assert_eq!(
        values,
        vec![Value::Int(1), Value::Uint(2), Value::from("three")]
    );
}

#[rstest]
fn test_end_reports_leftover() {
    let mut decoder = Decoder::new("1 2");
    assert_eq!(decoder.decode::<i32>().unwrap(), 1);
    let err = decoder.end().unwrap_err();
    assert!(err.message.starts_with("trailing characters"));
    assert_eq!(err.location.map(|loc| loc.column), Some(3));
}

#[rstest]
fn test_decoder_honours_max_depth() {
    let options = DecodeOptions::new().with_max_depth(2);
    let mut decoder = Decoder::with_options("(((1)))", options);
    let err = decoder.decode::<Vec<Vec<Vec<i32>>>>().unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimit);
}

#[rstest]
fn test_decoder_from_slice() {
    let mut decoder = Decoder::from_slice(b"(1 2)").unwrap();
    assert_eq!(decoder.decode::<Vec<u8>>().unwrap(), vec![1, 2]);
    assert!(Decoder::from_slice(&[0xff, 0xfe]).is_err());
}
