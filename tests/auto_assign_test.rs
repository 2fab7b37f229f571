//! Auto-assign integration tests
//!
//! Runs the join and assignment engine against in-memory datasets.

use pulse::data_set::{row_of, InMemoryDatasetProvider, Visibility};
use pulse::mapping::{
    initial_data, AutoAssigner, CustomField, FieldResolution, HemicicloData, HemicicloDataSource,
    HemicicloLayout,
};
use serde_json::{json, Value};

async fn parliament() -> InMemoryDatasetProvider {
    let provider = InMemoryDatasetProvider::new();
    let mut rows = Vec::new();
    for i in 0..4 {
        rows.push(row_of([
            ("name", json!(format!("A{}", i))),
            ("party", json!("Party A")),
            ("member_id", json!(format!("A{}", i))),
        ]));
    }
    for i in 0..6 {
        rows.push(row_of([
            ("name", json!(format!("B{}", i))),
            ("party", json!("Party B")),
            ("member_id", json!(format!("B{}", i))),
        ]));
    }
    provider
        .insert("p1", "members", "Members", Visibility::Private, rows)
        .await;

    provider
        .insert(
            "p1",
            "committees",
            "Committees",
            Visibility::Public,
            vec![
                row_of([("members", json!("A0,B1")), ("committee", json!("Budget"))]),
                row_of([("members", json!("A0; A1")), ("committee", json!("Health"))]),
                row_of([("members", json!(["B2"])), ("committee", json!("Defence"))]),
            ],
        )
        .await;
    provider
}

fn source() -> HemicicloDataSource {
    HemicicloDataSource::new(["members"])
        .with_actor_column("name")
        .with_category_column("party")
        .with_custom_field(CustomField::joined(
            "committees",
            "Committees",
            "committees",
            "member_id",
            "members",
            "committee",
        ))
}

fn empty_hemicycle() -> (HemicicloLayout, HemicicloData) {
    let layout = HemicicloLayout::from_rows(vec![4, 6]).unwrap();
    let data = initial_data(&layout);
    (layout, data)
}

fn metadata(data: &HemicicloData, seat_id: &str, field: &str) -> Option<Value> {
    data.get_seat(seat_id)?
        .actor_data
        .as_ref()?
        .metadata
        .get(field)
        .cloned()
}

#[tokio::test]
async fn test_two_parties_fill_their_rows() {
    let provider = parliament().await;
    let (layout, data) = empty_hemicycle();

    let outcome = AutoAssigner::new(&provider)
        .run(&data, &source())
        .await
        .unwrap();
    let data = outcome.data;

    assert_eq!(data.categories.len(), 2);
    assert_eq!(data.categories[0].name, "Party A");
    assert_eq!(data.categories[0].order, 1);
    assert_eq!(data.categories[0].seat_count, Some(4));
    assert_eq!(data.categories[1].name, "Party B");
    assert_eq!(data.categories[1].order, 2);
    assert_eq!(data.categories[1].seat_count, Some(6));

    for (index, seat) in data.seats.iter().enumerate() {
        let expected = if index < 4 { "Party A" } else { "Party B" };
        let category = data
            .get_category(seat.category_id.as_deref().unwrap())
            .unwrap();
        assert_eq!(category.name, expected, "seat {}", seat.id);
        assert_eq!(seat.row, if index < 4 { 0 } else { 1 });
    }
    data.check_invariants(&layout).unwrap();
}

#[tokio::test]
async fn test_auto_assign_is_idempotent() {
    let provider = parliament().await;
    let (_, data) = empty_hemicycle();
    let assigner = AutoAssigner::new(&provider);

    let first = assigner.run(&data, &source()).await.unwrap().data;
    let second = assigner.run(&first, &source()).await.unwrap().data;

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_join_fans_out_and_collects_multiple_matches() {
    let provider = parliament().await;
    let (_, data) = empty_hemicycle();

    let outcome = AutoAssigner::new(&provider)
        .run(&data, &source())
        .await
        .unwrap();
    let data = outcome.data;

    // A0 appears in two committee rows, A1 and B1 each in one.
    assert_eq!(
        metadata(&data, "seat-0-0", "committees"),
        Some(json!(["Budget", "Health"]))
    );
    assert_eq!(metadata(&data, "seat-0-1", "committees"), Some(json!("Health")));
    assert_eq!(metadata(&data, "seat-1-1", "committees"), Some(json!("Budget")));
    assert_eq!(metadata(&data, "seat-1-2", "committees"), Some(json!("Defence")));
    assert_eq!(metadata(&data, "seat-0-2", "committees"), None);

    assert_eq!(
        outcome.fields,
        vec![FieldResolution::Resolved {
            field_id: "committees".into(),
            matched_actors: 4,
        }]
    );
}

#[tokio::test]
async fn test_failed_related_dataset_only_drops_its_field() {
    let provider = parliament().await;
    provider.mark_unavailable("committees").await;
    let (_, data) = empty_hemicycle();

    let source = source().with_custom_field(CustomField::column("id", "Member id", "member_id"));
    let outcome = AutoAssigner::new(&provider).run(&data, &source).await.unwrap();

    assert_eq!(outcome.assigned_rows, 10);
    assert!(outcome.fields[0].is_failed());
    assert!(!outcome.fields[1].is_failed());
    assert_eq!(metadata(&outcome.data, "seat-0-0", "committees"), None);
    assert_eq!(metadata(&outcome.data, "seat-0-0", "id"), Some(json!("A0")));
}

#[tokio::test]
async fn test_more_rows_than_seats_are_dropped() {
    let provider = parliament().await;
    let layout = HemicicloLayout::from_rows(vec![3, 4]).unwrap();
    let data = initial_data(&layout);

    let outcome = AutoAssigner::new(&provider)
        .run(&data, &source())
        .await
        .unwrap();

    assert_eq!(outcome.assigned_rows, 7);
    assert_eq!(outcome.dropped_rows, 3);
    assert_eq!(outcome.empty_seats, 0);
    assert_eq!(outcome.data.categories[1].seat_count, Some(3));
    outcome.data.check_invariants(&layout).unwrap();
}

#[tokio::test]
async fn test_categories_pool_across_datasets() {
    let provider = InMemoryDatasetProvider::new();
    provider
        .insert(
            "p1",
            "north",
            "North",
            Visibility::Private,
            vec![
                row_of([("name", json!("N1")), ("party", json!("A"))]),
                row_of([("name", json!("N2")), ("party", json!("B"))]),
            ],
        )
        .await;
    provider
        .insert(
            "p1",
            "south",
            "South",
            Visibility::Private,
            vec![
                row_of([("name", json!("S1")), ("party", json!("A"))]),
                row_of([("name", json!("S2")), ("party", json!("C"))]),
            ],
        )
        .await;

    let layout = HemicicloLayout::from_rows(vec![4]).unwrap();
    let source = HemicicloDataSource::new(["north", "south"])
        .with_actor_column("name")
        .with_category_column("party");
    let outcome = AutoAssigner::new(&provider)
        .run(&initial_data(&layout), &source)
        .await
        .unwrap();
    let data = &outcome.data;

    let names: Vec<&str> = data.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
    assert_eq!(data.categories[0].seat_count, Some(2));

    let actors: Vec<&str> = data
        .seats
        .iter()
        .map(|seat| seat.actor_data.as_ref().unwrap().name.as_str())
        .collect();
    assert_eq!(actors, vec!["N1", "S1", "N2", "S2"]);
    assert_eq!(data.seats[0].category_id, data.seats[1].category_id);
}
