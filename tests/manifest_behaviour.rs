//! Acceptance scenarios for the manifest parser.

use rstest::rstest;
use vendor_sync::manifest::{self, Node, ParseError};

const REALISTIC_MANIFEST: &str = concat!(
    "# Foreign resources consumed by the front end.\n",
    "jquery:\n",
    "  type: file\n",
    "  src: https://code.example.test/jquery-3.7.1.min.js\n",
    "  dest: jquery.min.js\n",
    "  integrity: sha384-abc\n",
    "\n",
    "icons:\n",
    "  type: tar\n",
    "  src: https://cdn.example.test/icons-1.11.tar.gz\n",
    "  dest:\n",
    "    package/fonts: fonts\n",
    "    package/css/*.css: css\n",
    "    package/LICENSE:\n",
);

#[test]
fn realistic_manifest_exposes_every_field() {
    let root = manifest::parse(REALISTIC_MANIFEST).expect("valid manifest");

    let jquery = manifest::get(&root, "jquery").expect("jquery module");
    assert_eq!(manifest::get_str(&jquery, "type").as_deref(), Some("file"));
    assert_eq!(
        manifest::get_str(&jquery, "dest").as_deref(),
        Some("jquery.min.js")
    );

    let icons = manifest::get(&root, "icons").expect("icons module");
    let dest = manifest::get(&icons, "dest").expect("dest mapping");
    assert_eq!(
        manifest::get_str(&dest, "package/fonts").as_deref(),
        Some("fonts")
    );
    let license = manifest::get(&dest, "package/LICENSE").expect("license entry");
    assert!(license.borrow().is_null());
}

#[test]
fn modules_iterate_in_manifest_order() {
    let root = manifest::parse(REALISTIC_MANIFEST).expect("valid manifest");
    let names: Vec<String> = root
        .borrow()
        .entries()
        .expect("root mapping")
        .iter()
        .map(|(name, _)| name.clone())
        .collect();
    assert_eq!(names, vec!["jquery", "icons"]);
}

#[test]
fn minimal_two_level_document_parses() {
    let root = manifest::parse("a:\n  b: c\n").expect("valid manifest");
    let a = manifest::get(&root, "a").expect("key a");
    assert_eq!(manifest::get_str(&a, "b").as_deref(), Some("c"));
}

#[test]
fn empty_value_leaf_is_null_not_empty_mapping() {
    let root = manifest::parse("leaf:\n").expect("valid manifest");
    let leaf = manifest::get(&root, "leaf").expect("leaf key");
    assert!(leaf.borrow().is_null());
    assert!(!matches!(&*leaf.borrow(), Node::Mapping(_)));
}

#[rstest]
#[case::odd(" x: y\n", ParseError::OddIndentation { line: 1 })]
#[case::odd_later("a:\n  b: c\n   d: e\n", ParseError::OddIndentation { line: 3 })]
#[case::too_deep("a:\n    b: c\n", ParseError::TooMuchIndentation { line: 2 })]
#[case::no_colon("a:\n  just text\n", ParseError::MissingColon { line: 2 })]
fn malformed_documents_fail_with_line_numbers(#[case] text: &str, #[case] expected: ParseError) {
    assert_eq!(manifest::parse(text).expect_err("malformed"), expected);
}
