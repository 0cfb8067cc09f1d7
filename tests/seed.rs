mod common;

use std::io::Write;

use common::{ALICE, add_user, memory_pool};
use coursework::{
    models::User,
    password::verify_password,
    seed::{SeedReport, seed_users, seed_users_from_path},
};

const CSV: &str = "\
first_name,last_name,email,password
Ada,Lovelace,ada@example.com,Engine#1843
Alan,Turing,alan@example.com,Enigma(39)
Bad,Email,not-an-email,Passw0rd!
Weak,Password,weak@example.com,password
,Nameless,nameless@example.com,Passw0rd!
Alice,Again,alice@example.com,Passw0rd!
";

#[tokio::test]
async fn imports_acceptable_new_users() {
    let db = memory_pool().await;
    add_user(&db, ALICE).await;

    let report = seed_users(&db, CSV.as_bytes()).await.unwrap();

    assert_eq!(
        report,
        SeedReport {
            inserted: 2,
            existing: 1,
            rejected: 3,
        }
    );

    let ada = User::find_by_email(&db, "ada@example.com").await.unwrap().unwrap();
    assert_eq!(ada.first_name, "Ada");
    assert_ne!(ada.password_hash, "Engine#1843");
    assert!(verify_password(&ada.password_hash, "Engine#1843"));

    assert!(User::find_by_email(&db, "weak@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn seeding_twice_is_idempotent() {
    let db = memory_pool().await;

    seed_users(&db, CSV.as_bytes()).await.unwrap();
    let again = seed_users(&db, CSV.as_bytes()).await.unwrap();

    assert_eq!(again.inserted, 0);
    assert_eq!(again.existing, 3);
}

#[tokio::test]
async fn reads_from_a_file() {
    let db = memory_pool().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CSV.as_bytes()).unwrap();

    let report = seed_users_from_path(&db, file.path()).await.unwrap();

    assert_eq!(report.inserted, 3);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let db = memory_pool().await;

    let err = seed_users_from_path(&db, std::path::Path::new("/nonexistent/users.csv"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("/nonexistent/users.csv"));
}
