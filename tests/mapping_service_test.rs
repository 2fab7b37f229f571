//! Mapping service integration tests
//!
//! Exercises the CSV dataset provider and the JSON file store together,
//! the way the command line wires them.

use anyhow::Result;
use pulse::config::ExportFormat;
use pulse::data_set::{CsvDatasetProvider, DatasetProvider, Visibility};
use pulse::errors::CoreErrorKind;
use pulse::export::{render_mapping, SvgRenderConfig};
use pulse::mapping::{CustomField, HemicicloDataSource, MappingFilter};
use pulse::services::{CreateHemicycle, JsonFileMappingStore, MappingService};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const DEPUTIES: &str = "name,party,member_id,photo\n\
Ana,Verde,1,ana.jpg\n\
Luis,Azul,2,\n\
Eva,Verde,3,eva.jpg\n\
,Azul,4,\n";

const COMMITTEES: &str = "committee,members\n\
Budget,\"1,2\"\n\
Health,1\n";

fn setup() -> Result<(TempDir, MappingService)> {
    let dir = tempfile::tempdir()?;
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir)?;
    std::fs::write(data_dir.join("deputies.csv"), DEPUTIES)?;
    std::fs::write(data_dir.join("committees.csv"), COMMITTEES)?;

    let service = MappingService::new(
        Arc::new(JsonFileMappingStore::new(dir.path().join("store"))),
        Arc::new(CsvDatasetProvider::new(data_dir, "p1")),
    );
    Ok((dir, service))
}

fn new_hemicycle(seats: u32) -> CreateHemicycle {
    CreateHemicycle {
        project_id: "p1".into(),
        user_id: "u1".into(),
        name: "Cortes".into(),
        description: Some("Test chamber".into()),
        seats,
    }
}

#[tokio::test]
async fn test_csv_provider_infers_schema() -> Result<()> {
    let (dir, _) = setup()?;
    let provider = CsvDatasetProvider::new(dir.path().join("data"), "p1");

    let datasets = provider.list_datasets("p1", Visibility::All).await?;
    let names: Vec<&str> = datasets.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(names, vec!["committees", "deputies"]);

    let deputies = provider.get_dataset("deputies").await?;
    assert_eq!(deputies.row_count, 4);
    assert!(deputies.has_column("member_id"));

    let rows = provider.get_dataset_data("deputies").await?;
    assert_eq!(rows[0]["member_id"], json!("1"));
    assert_eq!(rows[1]["photo"], json!(null));
    Ok(())
}

#[tokio::test]
async fn test_assign_from_csv_and_reload() -> Result<()> {
    let (_dir, service) = setup()?;
    let mapping = service.create_hemicycle(new_hemicycle(5)).await?;

    let source = HemicicloDataSource::new(["deputies"])
        .with_actor_column("name")
        .with_category_column("party")
        .with_photo_column("photo")
        .with_custom_field(CustomField::joined(
            "committees",
            "Committees",
            "committees",
            "member_id",
            "members",
            "committee",
        ));
    service.set_data_source(&mapping.id, Some(source)).await?;

    let (saved, outcome) = service.auto_assign(&mapping.id).await?;
    assert_eq!(outcome.assigned_rows, 3);
    assert_eq!(outcome.skipped_rows, 1);
    assert_eq!(outcome.empty_seats, 2);

    let reloaded = service.get(&mapping.id).await?;
    assert_eq!(reloaded, saved);

    let verde = &reloaded.data.categories[0];
    assert_eq!(verde.name, "Verde");
    assert_eq!(verde.seat_count, Some(2));

    let ana = reloaded.data.seats[0].actor_data.as_ref().unwrap();
    assert_eq!(ana.name, "Ana");
    assert_eq!(ana.photo.as_deref(), Some("ana.jpg"));
    assert_eq!(ana.metadata["committees"], json!(["Budget", "Health"]));
    Ok(())
}

#[tokio::test]
async fn test_render_outputs() -> Result<()> {
    let (_dir, service) = setup()?;
    let mapping = service.create_hemicycle(new_hemicycle(12)).await?;
    service
        .set_data_source(
            &mapping.id,
            Some(
                HemicicloDataSource::new(["deputies"])
                    .with_actor_column("name")
                    .with_category_column("party"),
            ),
        )
        .await?;
    let (mapping, _) = service.auto_assign(&mapping.id).await?;

    let config = SvgRenderConfig::default();
    let svg = render_mapping(&mapping, ExportFormat::Svg, &config).unwrap();
    assert_eq!(svg.matches("<circle").count(), 12);

    let csv = render_mapping(&mapping, ExportFormat::Csv, &config).unwrap();
    assert_eq!(csv.lines().count(), 13);

    let json: serde_json::Value =
        serde_json::from_str(&render_mapping(&mapping, ExportFormat::Json, &config).unwrap())?;
    assert_eq!(json["mapping"]["id"], json!(mapping.id));
    Ok(())
}

#[tokio::test]
async fn test_only_owner_deletes() -> Result<()> {
    let (_dir, service) = setup()?;
    let mapping = service.create_hemicycle(new_hemicycle(3)).await?;

    let err = service.delete(&mapping.id, "someone-else").await.unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);
    assert_eq!(service.list(&MappingFilter::for_project("p1")).await?.len(), 1);

    service.delete(&mapping.id, "u1").await?;
    assert!(service.list(&MappingFilter::for_project("p1")).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_leading_zero_keys_join() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(&data_dir)?;
    std::fs::write(data_dir.join("members.csv"), "name,member_id\nAna,007\nLuis,1e3\n")?;
    std::fs::write(
        data_dir.join("groups.csv"),
        "group,members\nBudget,\"007,008\"\nHealth,1e3\n",
    )?;
    let service = MappingService::new(
        Arc::new(JsonFileMappingStore::new(dir.path().join("store"))),
        Arc::new(CsvDatasetProvider::new(data_dir, "p1")),
    );

    let mapping = service.create_hemicycle(new_hemicycle(2)).await?;
    let source = HemicicloDataSource::new(["members"])
        .with_actor_column("name")
        .with_custom_field(CustomField::joined(
            "groups", "Groups", "groups", "member_id", "members", "group",
        ));
    service.set_data_source(&mapping.id, Some(source)).await?;

    let (saved, _) = service.auto_assign(&mapping.id).await?;
    let ana = saved.data.seats[0].actor_data.as_ref().unwrap();
    assert_eq!(ana.metadata["groups"], json!("Budget"));
    let luis = saved.data.seats[1].actor_data.as_ref().unwrap();
    assert_eq!(luis.metadata["groups"], json!("Health"));
    Ok(())
}
