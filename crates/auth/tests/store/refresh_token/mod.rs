use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use wetask_auth::{
    db::refresh_token::RefreshTokenRepo,
    model::{token::RefreshTokenEntry, user::UserId},
};

use crate::store::Tester;

mod refresh_token_sqlite;

/// Refresh tokens belong to a user that has to exist first.
#[async_trait]
pub trait UserFixture {
    async fn seed_user(&self, email: &str) -> UserId;
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

pub fn create_entry(token: &str, user_id: UserId, expires_at: DateTime<Utc>) -> RefreshTokenEntry {
    RefreshTokenEntry::builder()
        .token(token)
        .user_id(user_id)
        .expires_at(expires_at)
        .created_at(at(1_700_000_000))
        .build()
}

fn in_a_week() -> DateTime<Utc> {
    at((Utc::now() + Duration::days(7)).timestamp())
}

pub async fn save<T: RefreshTokenRepo>(tester: impl Tester<T> + UserFixture) {
    let user_id = tester.seed_user("a@x.com").await;
    let store = tester.store();

    let entry = create_entry("R1", user_id, in_a_week());

    store.save(entry.clone()).await.unwrap();

    let saved = store.fetch("R1").await.unwrap().unwrap();

    assert_eq!(saved, entry);
}

pub async fn save_duplicate<T: RefreshTokenRepo>(tester: impl Tester<T> + UserFixture) {
    let user_id = tester.seed_user("a@x.com").await;
    let store = tester.store();

    store
        .save(create_entry("R1", user_id, in_a_week()))
        .await
        .unwrap();

    let result = store.save(create_entry("R1", user_id, in_a_week())).await;

    assert!(result.is_err());
}

pub async fn take<T: RefreshTokenRepo>(tester: impl Tester<T> + UserFixture) {
    let user_id = tester.seed_user("a@x.com").await;
    let store = tester.store();

    let entry = create_entry("R1", user_id, in_a_week());
    store.save(entry.clone()).await.unwrap();
    store
        .save(create_entry("R2", user_id, in_a_week()))
        .await
        .unwrap();

    let taken = store.take("R1").await.unwrap();

    assert_eq!(taken, Some(entry));
    assert!(store.take("R1").await.unwrap().is_none());
    assert!(store.fetch("R1").await.unwrap().is_none());
    assert!(store.fetch("R2").await.unwrap().is_some());
}

pub async fn delete<T: RefreshTokenRepo>(tester: impl Tester<T> + UserFixture) {
    let user_id = tester.seed_user("a@x.com").await;
    let store = tester.store();

    store
        .save(create_entry("R1", user_id, in_a_week()))
        .await
        .unwrap();

    store.delete("R1").await.unwrap();
    store.delete("unknown").await.unwrap();

    assert!(store.fetch("R1").await.unwrap().is_none());
}

pub async fn delete_expired<T: RefreshTokenRepo>(tester: impl Tester<T> + UserFixture) {
    let user_id = tester.seed_user("a@x.com").await;
    let store = tester.store();

    store
        .save(create_entry("old", user_id, at(1_700_000_100)))
        .await
        .unwrap();
    store
        .save(create_entry("fresh", user_id, in_a_week()))
        .await
        .unwrap();

    let purged = store.delete_expired(Utc::now()).await.unwrap();

    assert_eq!(purged, 1);
    assert!(store.fetch("old").await.unwrap().is_none());
    assert!(store.fetch("fresh").await.unwrap().is_some());
}

#[macro_export]
macro_rules! generate_refresh_token_store_tests {
    ($tester:ident) => {
        macro_rules! test {
            ($title: ident, $func: path) => {
                crate::declare_test_fn!($tester, $title, $func);
            };
        }

        test!(save, crate::store::refresh_token::save);
        test!(save_duplicate, crate::store::refresh_token::save_duplicate);
        test!(take, crate::store::refresh_token::take);
        test!(delete, crate::store::refresh_token::delete);
        test!(delete_expired, crate::store::refresh_token::delete_expired);
    };
}
