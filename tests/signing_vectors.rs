//! Fixed signing vectors shared with other implementations of the protocol.
//!
//! If any of these change, independently written clients stop verifying.

use request_signer::{FormData, Payload, SignatureMaker, SignedRequestFactory, encode_form, get_signature};
use std::collections::{BTreeMap, HashMap};

const SERVER_KEY: &str = "CoVTr95Xv2Xlu4ZjPo2bWl7u4SnnAMAD7EFFBMS4Dy4=";
const CLIENT_KEY: &str = "oVB_b3qrP3R6IDApALqehQzFy3DpMfob6Y4627WEK5A=";
const USER_ADD_URL: &str = "http://www.example.com/accounts/user/add/";

#[test]
fn test_known_vector_with_payload() {
    let data = FormData::from([("username", "some tester"), ("first_name", "Mr. Test")]);
    let signature = get_signature(SERVER_KEY, USER_ADD_URL, &data.into()).unwrap();
    assert_eq!(signature, "4ZAQJqmWE_C9ozPkpJ3Owh0Z_DFtYkCdi4XAc-vOLtI=");
}

#[test]
fn test_known_vector_without_payload() {
    let signature = get_signature(SERVER_KEY, USER_ADD_URL, &Payload::Empty).unwrap();
    assert_eq!(signature, "2ZzgF8AGioIfYzPqedI0FfJKEDG2asRA1LR70q4IOYs=");
}

#[test]
fn test_known_vector_tilde_is_escaped() {
    let data = FormData::from([("a", "x~y")]);
    assert_eq!(encode_form(&data), "a=x%7Ey");
    let signature = get_signature(SERVER_KEY, "/p/", &data.into()).unwrap();
    assert_eq!(signature, "E7HZWEBqKYNYViK_Y9Gi6S8OOg0u9WQ2rHZvqC1r1yk=");
}

#[test]
fn test_known_vector_reserved_characters_in_payload() {
    let data = FormData::new()
        .with("email", "test@example.com")
        .with("note", "50% off & more")
        .with("tags", vec!["b,c", "a=1"])
        .with("name", "caf\u{e9}");
    assert_eq!(
        encode_form(&data),
        "email=test%40example.com&name=caf%C3%A9&note=50%25+off+%26+more&tags=a%3D1&tags=b%2Cc"
    );
    let signature = get_signature(SERVER_KEY, "/p/", &data.into()).unwrap();
    assert_eq!(signature, "4SqnT7G08THerdmlV0PH417LUJbWgsn_HzfGnlTGiaI=");
}

#[test]
fn test_known_vector_semicolon_query() {
    let signature = get_signature(SERVER_KEY, "/p/?a=1;b=2", &Payload::Empty).unwrap();
    assert_eq!(signature, "YTWl9uUxP7bsETxb4JJiKI1GKIcbzbbVsxgrc5ueZNs=");
    assert_eq!(
        signature,
        get_signature(SERVER_KEY, "/p/?b=2&a=1", &Payload::Empty).unwrap()
    );
}

#[test]
fn test_known_vector_encoded_query() {
    let signature = get_signature(
        SERVER_KEY,
        "/p/?q=caf%C3%A9&x=%7E&y=a%2Cb;z=1+2",
        &Payload::Empty,
    )
    .unwrap();
    assert_eq!(signature, "UpHPBINk1CQ3LeSFa-OELoznm8jpXSfBzhRlRP676L4=");
}

#[test]
fn test_payload_shape_does_not_matter() {
    let signer = SignatureMaker::new(SERVER_KEY).unwrap();
    let expected = "4ZAQJqmWE_C9ozPkpJ3Owh0Z_DFtYkCdi4XAc-vOLtI=";

    let from_hash_map = FormData::from(HashMap::from([
        ("username", "some tester"),
        ("first_name", "Mr. Test"),
    ]));
    let from_btree_map = FormData::from(BTreeMap::from([
        ("first_name", "Mr. Test"),
        ("username", "some tester"),
    ]));
    let from_lists = FormData::new()
        .with("username", vec!["some tester"])
        .with("first_name", vec!["Mr. Test"]);

    for data in [from_hash_map, from_btree_map, from_lists] {
        assert_eq!(signer.create_signature(USER_ADD_URL, &data.into()), expected);
    }
}

#[test]
fn test_encoding_determinism() {
    let dict = FormData::from(HashMap::from([("one", "1"), ("two", "2")]));
    let pairs = FormData::from(vec![("two", "2"), ("one", "1")]);
    assert_eq!(encode_form(&dict), "one=1&two=2");
    assert_eq!(encode_form(&pairs), "one=1&two=2");
}

#[test]
fn test_multi_value_ordering() {
    let data = FormData::new().with("four", vec!["8", "4", "0"]).with("one", "1");
    assert_eq!(encode_form(&data), "four=0&four=4&four=8&one=1");
}

#[test]
fn test_empty_payload_fixed_point() {
    assert_eq!(encode_form(&FormData::new()), "");
    assert_eq!(encode_form(&FormData::from(Vec::<(String, String)>::new())), "");
    assert_eq!(encode_form(&FormData::from(HashMap::<String, String>::new())), "");

    let signer = SignatureMaker::new(SERVER_KEY).unwrap();
    let empty = signer.create_signature(USER_ADD_URL, &Payload::Empty);
    assert_eq!(signer.create_signature(USER_ADD_URL, &FormData::new().into()), empty);
    assert_eq!(signer.create_signature(USER_ADD_URL, &Payload::raw("")), empty);
    assert_eq!(signer.create_signature(USER_ADD_URL, &None::<FormData>.into()), empty);
}

#[test]
fn test_signature_self_exclusion() {
    let signer = SignatureMaker::new(SERVER_KEY).unwrap();
    let with_field = FormData::from([("__signature", "x"), ("a", "1")]);
    let without = FormData::from([("a", "1")]);
    assert_eq!(
        signer.create_signature("/p/", &with_field.into()),
        signer.create_signature("/p/", &without.into())
    );
}

#[test]
fn test_builder_vectors() {
    let get = SignedRequestFactory::new("GET", "client_id", CLIENT_KEY).unwrap();
    let request = get.create_request("http://example.com/my/url", &FormData::new()).unwrap();
    assert_eq!(
        request.url,
        "http://example.com/my/url?__client_id=client_id&__signature=N1WOdyaBUVlPjKVyL3ionapOLAasFdvagfotfCdCW-Y="
    );

    let data = FormData::from([("some", "da ta"), ("goes", "he re")]);

    let request = get.create_request("www.myurl.com", &data).unwrap();
    assert_eq!(
        request.url,
        "www.myurl.com?__client_id=client_id&goes=he+re&some=da+ta&__signature=4wSh_P_esdOD7fu3Vtq1dFy8XgdbuvKEwhkVF-b0PPU="
    );

    let post = SignedRequestFactory::new("POST", "client_id", CLIENT_KEY).unwrap();
    let request = post.create_request("www.myurl.com", &data).unwrap();
    assert_eq!(
        request.url,
        "www.myurl.com?__client_id=client_id&__signature=3sh6DOlYgbsCGT5rNlY819eFAdfl6Fy9GiyHHgUAwLQ="
    );
}
