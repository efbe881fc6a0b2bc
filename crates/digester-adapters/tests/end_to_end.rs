//! End-to-end conversions through the default adapters.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Utc};
use digester_adapters::{
    DefaultCaster, InputFormat, MappingLoader, build_digester, default_digester, read_input,
};
use digester_core::prelude::*;

const SOURCE_EXAMPLE: &str = "SourceTest";
const SOURCE_HTML: &str = "SourceTestHtml";
const SOURCE_PROPERTY: &str = "SourceTestProperty";
const SOURCE_JSON: &str = "SourceTestJson";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

// ── Typed targets ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
struct Address {
    address1: String,
    city: String,
}

impl Entity for Address {
    fn schema() -> Result<TargetSchema<Self>, DomainError> {
        TargetSchema::builder("address")
            .field(
                "address1",
                [
                    MappingRule::normal(SOURCE_EXAMPLE, "address"),
                    MappingRule::html_css(SOURCE_HTML, "p.address1"),
                    MappingRule::normal(SOURCE_PROPERTY, "address"),
                ],
                |a: &mut Address, v: String| a.address1 = v,
            )
            .field(
                "city",
                [
                    MappingRule::normal(SOURCE_EXAMPLE, "addressCity"),
                    MappingRule::html_xpath(SOURCE_HTML, "p > span"),
                    MappingRule::normal(SOURCE_PROPERTY, "addressCity"),
                ],
                |a: &mut Address, v: String| a.city = v,
            )
            .build()
    }
}

#[derive(Debug, Default)]
struct Person {
    name: String,
    age: Option<i32>,
    address: Option<Address>,
    phones: Vec<String>,
    phone_nodes: Vec<HtmlSelection>,
    name_node: Option<HtmlSelection>,
    born: Option<DateTime<Utc>>,
}

impl Entity for Person {
    fn schema() -> Result<TargetSchema<Self>, DomainError> {
        TargetSchema::builder("person")
            .field(
                "name",
                [
                    MappingRule::normal(SOURCE_EXAMPLE, "fullName"),
                    MappingRule::json_path(SOURCE_JSON, "$.personName"),
                    MappingRule::html_id(SOURCE_HTML, "fname"),
                    MappingRule::normal(SOURCE_PROPERTY, "personName"),
                ],
                |p: &mut Person, v: String| p.name = v,
            )
            .field(
                "age",
                [
                    MappingRule::normal(SOURCE_EXAMPLE, "age"),
                    MappingRule::html_id(SOURCE_HTML, "age"),
                    MappingRule::normal(SOURCE_PROPERTY, "age"),
                ],
                |p: &mut Person, v: i32| p.age = Some(v),
            )
            .entity(
                "address",
                [
                    MappingRule::normal(SOURCE_EXAMPLE, "personAddress"),
                    MappingRule::pass_through(SOURCE_HTML),
                    MappingRule::normal(SOURCE_PROPERTY, "personAddress"),
                ],
                |p: &mut Person, a: Address| p.address = Some(a),
            )
            .field(
                "phones",
                [MappingRule::json_path(SOURCE_JSON, "$.phones[*]")],
                |p: &mut Person, v: Vec<String>| p.phones = v,
            )
            .field(
                "phone_nodes",
                [MappingRule::html_css(SOURCE_HTML, "ul.phones li").with_html_text(false)],
                |p: &mut Person, v: Vec<HtmlSelection>| p.phone_nodes = v,
            )
            .field(
                "name_node",
                [MappingRule::html_id(SOURCE_HTML, "fname").with_html_text(false)],
                |p: &mut Person, v: HtmlSelection| p.name_node = Some(v),
            )
            .field(
                "born",
                [MappingRule::normal(SOURCE_EXAMPLE, "born")],
                |p: &mut Person, v: DateTime<Utc>| p.born = Some(v),
            )
            .build()
    }
}

// ── Typed conversions ─────────────────────────────────────────────────────────

#[test]
fn simple_map() {
    let input = RawValue::mapping([
        ("fullName", RawValue::text("Bruno")),
        ("age", RawValue::text("24")),
        (
            "personAddress",
            RawValue::mapping([
                ("address", "Av Santos Dumont, 801"),
                ("addressCity", "Joinville"),
            ]),
        ),
        ("born", RawValue::text("2015-08-06T05:43:38.239Z")),
    ]);

    let person = default_digester()
        .convert::<Person>(SOURCE_EXAMPLE, input)
        .unwrap()
        .unwrap();

    assert_eq!(person.name, "Bruno");
    assert_eq!(person.age, Some(24));
    assert_eq!(person.address.unwrap().city, "Joinville");
    let born = person.born.unwrap();
    assert_eq!((born.year(), born.month(), born.day()), (2015, 8, 6));
}

#[test]
fn simple_json_text() {
    let person = default_digester()
        .convert::<Person>(
            SOURCE_EXAMPLE,
            r#"{"fullName": "Bruno Candido Volpato da Cunha", "age": 24.9}"#,
        )
        .unwrap()
        .unwrap();

    assert_eq!(person.name, "Bruno Candido Volpato da Cunha");
    assert_eq!(person.age, Some(24));
    assert!(person.address.is_none());
}

#[test]
fn simple_json_path() {
    let person = default_digester()
        .convert::<Person>(
            SOURCE_JSON,
            r#"{"personName": "Bruno Candido Volpato da Cunha", "phones": ["555-0100", "555-0199"]}"#,
        )
        .unwrap()
        .unwrap();

    assert_eq!(person.name, "Bruno Candido Volpato da Cunha");
    assert_eq!(person.phones, ["555-0100", "555-0199"]);
}

#[test]
fn simple_html_from_reader() {
    let file = File::open(fixture("source.html")).unwrap();
    let person = default_digester()
        .convert_reader::<Person>(SOURCE_HTML, file)
        .unwrap()
        .unwrap();

    assert_eq!(person.name, "Bruno Candido Volpato da Cunha");
    assert_eq!(person.age, Some(24));

    let address = person.address.unwrap();
    assert_eq!(address.address1, "Av Santos Dumont, 831");
    assert_eq!(address.city, "Palo Alto");

    let phones: Vec<String> = person.phone_nodes.iter().map(HtmlSelection::text).collect();
    assert_eq!(phones, ["555-0100", "555-0199"]);

    let node = person.name_node.unwrap();
    assert_eq!(node.first().unwrap().id.as_deref(), Some("fname"));
    assert!(node.outer_html().starts_with("<p id=\"fname\">"));
}

#[test]
fn simple_properties() {
    let text = fs::read_to_string(fixture("person.properties")).unwrap();
    let input = read_input(
        &text,
        InputFormat::Auto,
        Some(&fixture("person.properties")),
        &DefaultCaster::new(),
    )
    .unwrap();

    let person = default_digester()
        .convert::<Person>(SOURCE_PROPERTY, input)
        .unwrap()
        .unwrap();

    assert_eq!(person.name, "Bruno");
    let address = person.address.unwrap();
    assert_eq!(address.address1, "Castro St");
    assert_eq!(address.city, "San Francisco");
}

#[test]
fn report_keeps_partial_results() {
    let input = RawValue::mapping([
        ("fullName", RawValue::text("Bruno")),
        ("age", RawValue::text("twenty")),
        ("born", RawValue::text("sometime in 2015")),
    ]);

    let conversion = default_digester()
        .convert_with_report::<Person>(SOURCE_EXAMPLE, input)
        .unwrap()
        .unwrap();

    assert_eq!(conversion.value.name, "Bruno");
    assert_eq!(conversion.value.age, None);
    assert!(!conversion.report.is_complete());

    let failed: Vec<_> = conversion
        .report
        .failures()
        .into_iter()
        .map(|(path, _)| path)
        .collect();
    assert_eq!(failed, ["age", "born"]);
    assert_eq!(conversion.report.outcome("phones"), Some(&FieldOutcome::Unmapped));
}

#[test]
fn custom_date_format() {
    let digester = build_digester(DefaultCaster::new().with_date_format("%d/%m/%Y"));
    let input = RawValue::mapping([("born", "06/08/2015")]);

    let person = digester
        .convert::<Person>(SOURCE_EXAMPLE, input)
        .unwrap()
        .unwrap();
    assert_eq!(person.born.unwrap().month(), 8);
}

// ── HTML collections ─────────────────────────────────────────────────────────

const SOURCE_LISTING: &str = "SourceTestListing";

const LISTING: &str = r#"
<html><body>
  <div class="addr"><span class="city">Joinville</span></div>
  <div class="addr"><span class="city">Atlanta</span></div>
  <table>
    <tr class="row"><td class="city">Palo Alto</td></tr>
    <tr class="row"><td class="city">Curitiba</td></tr>
  </table>
</body></html>
"#;

#[derive(Debug, Default, PartialEq)]
struct Branch {
    city: String,
}

impl Entity for Branch {
    fn schema() -> Result<TargetSchema<Self>, DomainError> {
        TargetSchema::builder("branch")
            .field(
                "city",
                [MappingRule::html_css(SOURCE_LISTING, ".city")],
                |b: &mut Branch, v: String| b.city = v,
            )
            .build()
    }
}

#[derive(Debug, Default)]
struct Listing {
    branches: Vec<Branch>,
    rows: Vec<Branch>,
}

impl Entity for Listing {
    fn schema() -> Result<TargetSchema<Self>, DomainError> {
        TargetSchema::builder("listing")
            .entities(
                "branches",
                [MappingRule::html_css(SOURCE_LISTING, "div.addr").with_html_text(false)],
                |l: &mut Listing, v: Vec<Branch>| l.branches = v,
            )
            .entities(
                "rows",
                [MappingRule::html_css(SOURCE_LISTING, "tr.row").with_html_text(false)],
                |l: &mut Listing, v: Vec<Branch>| l.rows = v,
            )
            .build()
    }
}

fn cities(branches: &[Branch]) -> Vec<&str> {
    branches.iter().map(|b| b.city.as_str()).collect()
}

#[test]
fn html_selection_converts_one_entity_per_element() {
    let conversion = default_digester()
        .convert_with_report::<Listing>(SOURCE_LISTING, LISTING)
        .unwrap()
        .unwrap();

    assert_eq!(cities(&conversion.value.branches), ["Joinville", "Atlanta"]);
    assert_eq!(cities(&conversion.value.rows), ["Palo Alto", "Curitiba"]);
    assert!(matches!(
        conversion.report.outcome("branches"),
        Some(FieldOutcome::Nested(reports)) if reports.len() == 2
    ));
}

#[test]
fn html_selection_converts_one_record_per_element() {
    let manifest = r#"
[[entity]]
name = "branch"

[[entity.field]]
name = "city"
rules = [{ source = "SourceTestListing", ref_type = "html_css", value = ".city" }]

[[entity]]
name = "listing"

[[entity.field]]
name = "rows"
type = "entities:branch"
rules = [{ source = "SourceTestListing", ref_type = "html_css", value = "tr.row", html_text = false }]
"#;
    let digester = default_digester();
    for schema in digester_adapters::mapping_loader::parse_manifest(manifest).unwrap() {
        digester.registry().register_record(schema).unwrap();
    }

    let record = digester
        .convert_record("listing", SOURCE_LISTING, LISTING)
        .unwrap()
        .unwrap()
        .value;

    assert_eq!(
        record.get("rows"),
        Some(&RawValue::Sequence(vec![
            RawValue::mapping([("city", "Palo Alto")]),
            RawValue::mapping([("city", "Curitiba")]),
        ]))
    );
}

// ── Records from mapping files ────────────────────────────────────────────────

fn record_digester() -> Digester {
    let digester = default_digester();
    let count = MappingLoader::new(fixture("mappings"))
        .register_into(digester.registry())
        .unwrap();
    assert_eq!(count, 2);
    digester
}

#[test]
fn records_from_json() {
    let digester = record_digester();
    let input = read_input(
        r#"{"fullName":"Bruno","age":"24.9","personAddress":{"address":"Av X","addressCity":"Joinville"}}"#,
        InputFormat::Auto,
        None,
        digester.caster(),
    )
    .unwrap();

    let record = digester
        .convert_record("person", SOURCE_EXAMPLE, input)
        .unwrap()
        .unwrap()
        .value;

    assert_eq!(record.get("name"), Some(&RawValue::text("Bruno")));
    assert_eq!(record.get("age"), Some(&RawValue::from(24i64)));
    assert_eq!(
        record.get("address"),
        Some(&RawValue::mapping([("address1", "Av X"), ("city", "Joinville")]))
    );
    assert_eq!(record.get("origin"), Some(&RawValue::Null));
}

#[test]
fn records_from_html() {
    let digester = record_digester();
    let html = fs::read_to_string(fixture("source.html")).unwrap();
    let input = read_input(&html, InputFormat::Html, None, digester.caster()).unwrap();

    let record = digester
        .convert_record("person", SOURCE_HTML, input)
        .unwrap()
        .unwrap()
        .value;

    assert_eq!(
        record.get("name"),
        Some(&RawValue::text("Bruno Candido Volpato da Cunha"))
    );
    assert_eq!(record.get("origin"), Some(&RawValue::text("html")));
    assert_eq!(
        record.get("address"),
        Some(&RawValue::mapping([
            ("address1", "Av Santos Dumont, 831"),
            ("city", "Palo Alto"),
        ]))
    );
}

#[test]
fn records_serialize_in_declaration_order() {
    let digester = record_digester();
    let input = RawValue::mapping([("fullName", "Bruno")]);
    let record = digester
        .convert_record("person", SOURCE_EXAMPLE, input)
        .unwrap()
        .unwrap()
        .value;

    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(
        json,
        r#"{"name":"Bruno","age":null,"address":null,"origin":null}"#
    );
}

#[test]
fn unknown_record_entity_is_fatal() {
    let digester = record_digester();
    let err = digester
        .convert_record("company", SOURCE_EXAMPLE, RawValue::mapping([("a", "b")]))
        .unwrap_err();
    assert!(matches!(
        err,
        DigesterError::Application(digester_core::application::ApplicationError::ConstructionFailed { .. })
    ));
}
