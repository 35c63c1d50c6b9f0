//! Tests for the geotagged responder queries feeding dispatch.

use lifelink_db::repositories::ResponderRepo;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../migrations")]
async fn donors_are_filtered_by_group_and_location(pool: PgPool) {
    sqlx::query(
        "INSERT INTO donors (name, email, blood_group, latitude, longitude) VALUES \
         ('Located Match', 'a@donor.test', 'O+', 12.97, 77.59), \
         ('Unlocated Match', 'b@donor.test', 'O+', NULL, NULL), \
         ('Located Other', 'c@donor.test', 'A+', 12.97, 77.59)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let donors = ResponderRepo::geotagged_donors(&pool, "O+").await.unwrap();

    assert_eq!(donors.len(), 1);
    assert_eq!(donors[0].name, "Located Match");
    assert!(donors[0].point().is_ok());
}

#[sqlx::test(migrations = "../../migrations")]
async fn banks_and_ngos_require_both_coordinates(pool: PgPool) {
    sqlx::query(
        "INSERT INTO blood_banks (name, email, latitude, longitude) VALUES \
         ('Located Bank', 'a@bank.test', 12.97, 77.59), \
         ('Half Located Bank', 'b@bank.test', 12.97, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO ngos (name, email, latitude, longitude) VALUES \
         ('Located Ngo', 'a@ngo.test', 12.97, 77.59), \
         ('Unlocated Ngo', 'b@ngo.test', NULL, NULL)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let banks = ResponderRepo::geotagged_blood_banks(&pool).await.unwrap();
    assert_eq!(banks.len(), 1);
    assert_eq!(banks[0].name, "Located Bank");

    let ngos = ResponderRepo::geotagged_ngos(&pool).await.unwrap();
    assert_eq!(ngos.len(), 1);
    assert_eq!(ngos[0].name, "Located Ngo");
}
