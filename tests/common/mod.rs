#![allow(dead_code)]

use campaign_server::test_support::{TestDatabase, TestDatabaseError};

/// Provision a migrated database, or `None` when no Postgres is reachable
/// (no `TEST_DATABASE_URL` and no container runtime).
pub async fn provision(test_name: &str) -> Option<TestDatabase> {
    match TestDatabase::new_from_env().await {
        Ok(db) => Some(db),
        Err(TestDatabaseError::Container(err)) => {
            eprintln!("skipping {test_name}: container runtime unavailable ({err})");
            None
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    }
}

pub const BOUNDARY: &str = "campaign-test-boundary";

/// Multipart body carrying `contents` as the `file` field.
pub fn multipart_upload(file_name: &str, contents: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\
         \r\n\
         {contents}\r\n\
         --{BOUNDARY}--\r\n"
    )
}
