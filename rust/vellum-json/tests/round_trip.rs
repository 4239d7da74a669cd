//! Black-box tests against the published API: parsing, serializing, and the
//! tree-building operations used together the way a real caller would.

use vellum_json::{Allocation, Context, JsonError, Limits, NodeKind, Style};

fn parse(src: &str) -> Context {
    let mut ctx = Context::with_limits(Limits::default());
    ctx.parse(src.as_bytes().to_vec(), true).unwrap();
    ctx
}

#[test]
fn image_example_resolves_nested_members_by_key() {
    let src = r#"{"Image":{"Width":800,"Height":600,"Title":"View from 15th Floor","Thumbnail":{"Url":"http://www.example.com/image/481989943","Height":125,"Width":100},"Animated":false,"IDs":[116,943,234,38793]}}"#;
    let ctx = parse(src);
    let root = ctx.root().unwrap();
    let image = ctx.get_node(root, "Image").unwrap();
    let thumb = ctx.get_node(image, "Thumbnail").unwrap();
    let url = ctx.get_node(thumb, "Url").unwrap();
    match &ctx.node(url).kind {
        NodeKind::String(t) => assert_eq!(ctx.text(t), "http://www.example.com/image/481989943"),
        other => panic!("expected string, got {other:?}"),
    }
}

#[test]
fn compact_serialization_reparses_to_a_structurally_equal_tree() {
    let src = r#"{"Image":{"Width":800,"Height":600,"Title":"View from 15th Floor","Thumbnail":{"Url":"http://www.example.com/image/481989943","Height":125,"Width":100},"Animated":false,"IDs":[116,943,234,38793]}}"#;
    let ctx = parse(src);
    let root = ctx.root().unwrap();
    let canonical = ctx.to_string_style(root, Style::Compact, 1024).unwrap();

    let mut reparsed = Context::with_limits(Limits::default());
    let reroot = reparsed.parse(canonical.clone().into_bytes(), true).unwrap();
    let canonical_again = reparsed.to_string_style(reroot, Style::Compact, 1024).unwrap();
    assert_eq!(canonical, canonical_again);

    let ids = reparsed
        .get_node(reparsed.get_node(reroot, "Image").unwrap(), "IDs")
        .unwrap();
    assert_eq!(reparsed.count_elements(ids).unwrap(), 4);
}

#[test]
fn a_double_round_trips_through_serialize_and_reparse_bit_for_bit() {
    let ctx = parse("3.1415926535897931");
    let root = ctx.root().unwrap();
    let original = match ctx.node(root).kind {
        NodeKind::Double(d) => d,
        ref other => panic!("expected double, got {other:?}"),
    };
    let text = ctx.to_string_style(root, Style::Compact, 64).unwrap();

    let mut reparsed = Context::with_limits(Limits::default());
    let reroot = reparsed.parse(text.into_bytes(), true).unwrap();
    let round_tripped = match reparsed.node(reroot).kind {
        NodeKind::Double(d) => d,
        ref other => panic!("expected double, got {other:?}"),
    };
    assert_eq!(original.to_bits(), round_tripped.to_bits());
}

#[test]
fn truncated_input_leaves_pos_at_the_point_parsing_stopped() {
    let mut ctx = Context::with_limits(Limits::default());
    let err = ctx.parse(br#"{"a":1,"#.to_vec(), true).unwrap_err();
    assert!(matches!(err, JsonError::Incomplete { .. }));
    assert_eq!(ctx.pos(), 7);
}

#[test]
fn serializing_a_member_with_no_key_fails_with_no_string() {
    let mut ctx = Context::new(Limits::default(), Allocation::Heap);
    let root = ctx.add_first(None, NodeKind::Object, None).unwrap();
    ctx.add_last(Some(root), NodeKind::Integer(1), None).unwrap();
    let mut out = [0u8; 64];
    let err = ctx.write_to(root, &mut out, Style::Compact).unwrap_err();
    assert_eq!(err, JsonError::NoString);
}

#[test]
fn serializing_into_a_buffer_one_byte_short_overflows() {
    let ctx = parse(r#"{"a":1}"#);
    let root = ctx.root().unwrap();
    // `{"a":1}` is exactly 7 bytes; one byte short must fail, not truncate.
    let mut out = [0u8; 6];
    let err = ctx.write_to(root, &mut out, Style::Compact).unwrap_err();
    assert!(matches!(err, JsonError::Overflow { .. }));
}

#[test]
fn tree_built_by_hand_serializes_both_styles_and_reparses_structurally_equal() {
    let mut ctx = Context::new(Limits::default(), Allocation::Heap);
    let root = ctx.add_first(None, NodeKind::Object, None).unwrap();
    ctx.add_last(Some(root), NodeKind::String(vellum_json::Text::owned("vellum")), Some("name"))
        .unwrap();
    let list = ctx.add_last(Some(root), NodeKind::Array, Some("values")).unwrap();
    ctx.add_last(Some(list), NodeKind::Integer(1), None).unwrap();
    ctx.add_last(Some(list), NodeKind::Integer(2), None).unwrap();
    ctx.add_last(Some(list), NodeKind::Integer(3), None).unwrap();
    ctx.add_last(Some(root), NodeKind::Bool(true), Some("ready")).unwrap();

    for style in [Style::Compact, Style::Indented] {
        let text = ctx.to_string_style(root, style, 512).unwrap();
        let mut reparsed = Context::with_limits(Limits::default());
        let reroot = reparsed.parse(text.into_bytes(), true).unwrap();

        assert_eq!(reparsed.count_elements(reroot).unwrap(), 3);
        let values = reparsed.get_node(reroot, "values").unwrap();
        assert_eq!(reparsed.count_elements(values).unwrap(), 3);
        assert_eq!(reparsed.node(reparsed.get_element(values, 1).unwrap()).kind, NodeKind::Integer(2));
        let ready = reparsed.get_node(reroot, "ready").unwrap();
        assert_eq!(reparsed.node(ready).kind, NodeKind::Bool(true));
    }
}

#[test]
fn removing_a_member_omits_it_from_serialized_output_and_keeps_sibling_order() {
    let mut ctx = parse(r#"{"a":1,"day":2,"c":3}"#);
    let root = ctx.root().unwrap();
    let day = ctx.get_node(root, "day").unwrap();
    ctx.remove_node(day);

    let out = ctx.to_string_style(root, Style::Compact, 64).unwrap();
    assert_eq!(out, r#"{"a":1,"c":3}"#);
}

#[test]
fn overflowing_integer_preserves_its_original_lexeme_through_serialization() {
    let ctx = parse("12345678901234567890123456789");
    let root = ctx.root().unwrap();
    let out = ctx.to_string_style(root, Style::Compact, 64).unwrap();
    assert_eq!(out, "12345678901234567890123456789");
}
