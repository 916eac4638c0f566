use catalog_scraper::transform::{transform, TransformConfig};
use catalog_scraper::{RawRecord, TransformError};

fn raw(fields: [&str; 6]) -> RawRecord {
    let [title, price, rating, colors, size, gender] = fields.map(|f| Some(f.to_string()));
    RawRecord {
        title,
        price,
        rating,
        colors,
        size,
        gender,
        timestamp: Some("2025-01-01T00:00:00".to_string()),
    }
}

fn sample_batch() -> Vec<RawRecord> {
    vec![
        raw(["T-Shirt A", "$10", "4.5 / 5", "3 Colors", "Size: M", "Gender: Unisex"]),
        raw(["Unknown Product", "$5", "Invalid Rating", "Red,Blue", "Size: L", "Gender: Men"]),
        raw(["Jacket B", "Price Unavailable", "4", "2", "M", "Women"]),
    ]
}

#[test]
fn end_to_end_batch_keeps_only_valid_record() {
    let (records, report) = transform(&sample_batch(), &TransformConfig::default()).unwrap();

    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.title, "T-Shirt A");
    assert_eq!(r.price, 160_000);
    assert_eq!(r.rating, 4.5);
    assert_eq!(r.colors, 3);
    assert_eq!(r.size, "M");
    assert_eq!(r.gender, "Unisex");
    assert_eq!(r.timestamp.as_deref(), Some("2025-01-01T00:00:00"));

    assert_eq!(report.input, 3);
    assert_eq!(report.dropped_title, 1);
    assert_eq!(report.dropped_price, 1);
    assert_eq!(report.kept, 1);
}

#[test]
fn empty_batch_fails() {
    assert_eq!(
        transform(&[], &TransformConfig::default()).unwrap_err(),
        TransformError::EmptyBatch
    );
}

#[test]
fn sentinel_title_drops_an_otherwise_valid_record() {
    let batch = vec![raw([
        "Unknown Product",
        "$10",
        "4.5 / 5",
        "3 Colors",
        "Size: M",
        "Gender: Unisex",
    ])];
    let (records, _) = transform(&batch, &TransformConfig::default()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn dedup_is_on_title_and_converted_price() {
    let batch = vec![
        raw(["Hoodie", "$20", "4.0 / 5", "2 Colors", "Size: L", "Gender: Men"]),
        raw(["Hoodie", "$20.0", "1.0 / 5", "5 Colors", "Size: S", "Gender: Women"]),
        raw(["Hoodie ", "$20", "3.0 / 5", "2 Colors", "Size: L", "Gender: Men"]),
    ];
    let (records, report) = transform(&batch, &TransformConfig::default()).unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].rating, 4.0);
    assert_eq!(records[0].colors, 2);
    assert_eq!(records[1].title, "Hoodie ");
    assert_eq!(report.duplicates, 1);
}

#[test]
fn output_preserves_input_order() {
    let batch = vec![
        raw(["C", "$3", "3", "1", "S", "Men"]),
        raw(["A", "$1", "1", "1", "S", "Men"]),
        raw(["B", "$2", "2", "1", "S", "Men"]),
    ];
    let (records, _) = transform(&batch, &TransformConfig::default()).unwrap();
    let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, ["C", "A", "B"]);
}

#[test]
fn transform_is_idempotent_on_clean_output() {
    let config = TransformConfig::default();
    let mut batch = sample_batch();
    batch.push(raw(["Pants C", "$42.99", "3.7 / 5", "Red; Blue", "Size: XL", "Gender: Men"]));
    batch.push(raw(["Scarf D", "$7", "4.1 / 5", "1 Colors", "M", "Gender: Genderfluid"]));
    batch.push(raw(["Belt E", "$9", "3.9 / 5", "2 Colors", "Size:", "Men"]));

    let (first, _) = transform(&batch, &config).unwrap();
    let refed: Vec<RawRecord> = first
        .iter()
        .map(|r| r.to_raw(config.exchange_rate))
        .collect();
    let (second, report) = transform(&refed, &config).unwrap();

    assert_eq!(first, second);
    assert_eq!(report.dropped(), 0);

    let scarf = first.iter().find(|r| r.title == "Scarf D").unwrap();
    assert_eq!(scarf.gender, "Genderfluid");
    let belt = first.iter().find(|r| r.title == "Belt E").unwrap();
    assert_eq!(belt.size, "");
}
