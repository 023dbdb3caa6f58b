use std::fs::File;
use std::io::Write;

use rstest::rstest;
use tempfile::tempdir;
use turntable_config::{InventoryRow, load_inventory_csv, validate_inventory_rows};

fn write_csv(lines: &[&str]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("inventory.csv");
    let mut f = File::create(&path).unwrap();
    for l in lines {
        writeln!(f, "{l}").unwrap();
    }
    (dir, path)
}

#[rstest]
fn loads_rows_and_maps_empty_payload_to_none() {
    let (_dir, path) = write_csv(&[
        "slot,has_card,qr_data",
        "0,true,CARD-0001",
        "1,false,",
        "4,true,",
    ]);
    let rows = load_inventory_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            InventoryRow {
                slot: 0,
                has_card: true,
                qr_data: Some("CARD-0001".into()),
            },
            InventoryRow {
                slot: 1,
                has_card: false,
                qr_data: None,
            },
            InventoryRow {
                slot: 4,
                has_card: true,
                qr_data: None,
            },
        ]
    );
}

#[rstest]
fn rejects_wrong_headers() {
    let (_dir, path) = write_csv(&["slot,card", "0,true"]);
    let err = load_inventory_csv(&path).expect_err("bad headers");
    assert!(format!("{err}").contains("must have headers"));
}

#[rstest]
fn rejects_bad_bool_with_row_number() {
    let (_dir, path) = write_csv(&["slot,has_card,qr_data", "0,maybe,"]);
    let err = load_inventory_csv(&path).expect_err("bad bool");
    assert!(format!("{err}").contains("invalid CSV row 2"));
}

#[rstest]
#[case(vec![InventoryRow { slot: 10, has_card: true, qr_data: None }], "out of range")]
#[case(
    vec![
        InventoryRow { slot: 3, has_card: true, qr_data: None },
        InventoryRow { slot: 3, has_card: false, qr_data: None },
    ],
    "more than once"
)]
#[case(vec![InventoryRow { slot: 2, has_card: false, qr_data: Some("X".into()) }], "no card")]
fn rejects_inconsistent_rows(#[case] rows: Vec<InventoryRow>, #[case] needle: &str) {
    let err = validate_inventory_rows(&rows).expect_err("invalid rows");
    assert!(format!("{err}").contains(needle), "{err}");
}

#[rstest]
fn missing_file_is_an_error() {
    let dir = tempdir().unwrap();
    let err = load_inventory_csv(&dir.path().join("nope.csv")).expect_err("missing file");
    assert!(format!("{err}").contains("open inventory CSV"));
}
