mod common;

use campaign_server::config::AppConfig;
use campaign_server::importer::{ImportError, import_file, replace_recipients};
use campaign_server::models::{Contact, DataResponse, Recipient};
use campaign_server::routes::recipients::{import_recipients, list_recipients};
use campaign_server::tabular::{TabularError, TabularFormat};
use campaign_server::test_support::{TestFixtures, TestRocketBuilder};
use rocket::http::{ContentType, Status};
use rocket::routes;

fn pairs(rows: &[(&str, &str)]) -> Vec<(String, String)> {
    rows.iter()
        .map(|(name, email)| (name.to_string(), email.to_string()))
        .collect()
}

#[tokio::test]
async fn import_replaces_the_previous_list() {
    let Some(test_db) = common::provision("import replace test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);

    fixtures.insert_recipient("Old", "old@x.com").await.unwrap();
    fixtures.insert_recipient("Bob", "b@x.com").await.unwrap();

    let stats = replace_recipients(
        &pool,
        &[Contact::new("Alice", "a@x.com"), Contact::new("Bob", "b@x.com")],
    )
    .await
    .expect("import succeeds");

    assert_eq!(stats.removed, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(
        fixtures.recipient_pairs().await.unwrap(),
        pairs(&[("Alice", "a@x.com"), ("Bob", "b@x.com")])
    );

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn duplicate_email_fails_and_keeps_previous_list() {
    let Some(test_db) = common::provision("duplicate import test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);

    fixtures.insert_recipient("Carol", "c@x.com").await.unwrap();

    let err = replace_recipients(
        &pool,
        &[Contact::new("Alice", "a@x.com"), Contact::new("Alicia", "a@x.com")],
    )
    .await
    .expect_err("duplicate email must fail the import");

    match err {
        ImportError::DuplicateEmail(email) => assert_eq!(email, "a@x.com"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        fixtures.recipient_pairs().await.unwrap(),
        pairs(&[("Carol", "c@x.com")])
    );

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn import_does_not_consult_the_exclusion_list() {
    let Some(test_db) = common::provision("re-import test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);

    fixtures.insert_excluded("Alice", "a@x.com").await.unwrap();

    replace_recipients(&pool, &[Contact::new("Alice", "a@x.com")])
        .await
        .expect("excluded addresses can be re-imported");

    assert_eq!(
        fixtures.recipient_pairs().await.unwrap(),
        pairs(&[("Alice", "a@x.com")])
    );
    assert_eq!(
        fixtures.excluded_pairs().await.unwrap(),
        pairs(&[("Alice", "a@x.com")])
    );

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn missing_column_leaves_store_untouched() {
    let Some(test_db) = common::provision("missing column test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);
    fixtures.insert_recipient("Carol", "c@x.com").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lista.csv");
    std::fs::write(&path, "Nome,Correio\nAlice,a@x.com\n").unwrap();

    let err = import_file(&pool, &path, TabularFormat::default())
        .await
        .expect_err("missing Email column must fail");
    assert!(matches!(
        err,
        ImportError::Format(TabularError::MissingColumn("Email"))
    ));
    assert_eq!(
        fixtures.recipient_pairs().await.unwrap(),
        pairs(&[("Carol", "c@x.com")])
    );

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn upload_route_imports_redirects_and_cleans_up() {
    let Some(test_db) = common::provision("upload route test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let upload_dir = tempfile::tempdir().unwrap();

    let config = AppConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_config(config)
        .mount_api_routes(routes![import_recipients, list_recipients])
        .async_client()
        .await;

    let response = client
        .post("/api/v1/recipients/import")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", common::BOUNDARY)))
        .body(common::multipart_upload(
            "lista.csv",
            "Nome,Email\nAlice,a@x.com\nBob,b@x.com",
        ))
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::SeeOther);
    assert_eq!(
        response.headers().get_one("Location"),
        Some("/api/v1/recipients")
    );

    let listed: DataResponse<Vec<Recipient>> = client
        .get("/api/v1/recipients")
        .dispatch()
        .await
        .into_json()
        .await
        .expect("recipient list");
    let emails: Vec<&str> = listed.data.iter().map(|r| r.email.as_str()).collect();
    assert_eq!(emails, vec!["a@x.com", "b@x.com"]);

    let leftovers = std::fs::read_dir(upload_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0, "staged upload must be deleted");

    drop(response);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn malformed_upload_is_rejected_and_cleaned_up() {
    let Some(test_db) = common::provision("malformed upload test").await else {
        return;
    };
    let pool = test_db.pool_clone();
    let upload_dir = tempfile::tempdir().unwrap();

    let config = AppConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .manage_config(config)
        .mount_api_routes(routes![import_recipients])
        .async_client()
        .await;

    let response = client
        .post("/api/v1/recipients/import")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", common::BOUNDARY)))
        .body(common::multipart_upload("lista.csv", "Name,Email\nAlice,a@x.com"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);

    let duplicate = client
        .post("/api/v1/recipients/import")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", common::BOUNDARY)))
        .body(common::multipart_upload(
            "lista.csv",
            "Nome,Email\nAlice,a@x.com\nAlicia,a@x.com",
        ))
        .dispatch()
        .await;
    assert_eq!(duplicate.status(), Status::Conflict);

    let empty = client
        .post("/api/v1/recipients/import")
        .header(ContentType::new("multipart", "form-data").with_params(("boundary", common::BOUNDARY)))
        .body(common::multipart_upload("vazia.csv", ""))
        .dispatch()
        .await;
    assert_eq!(empty.status(), Status::UnprocessableEntity);
    assert!(TestFixtures::new(&pool).recipient_pairs().await.unwrap().is_empty());

    let leftovers = std::fs::read_dir(upload_dir.path()).unwrap().count();
    assert_eq!(leftovers, 0, "staged upload must be deleted on failure too");

    drop(response);
    drop(duplicate);
    drop(empty);
    drop(client);
    test_db.close().await.expect("failed to drop test database");
}
