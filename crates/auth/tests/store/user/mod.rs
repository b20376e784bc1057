use chrono::DateTime;
use wetask_auth::{db::user::UserRepo, model::user::NewUser};

use crate::store::Tester;

mod user_sqlite;

pub fn new_user(email: &str) -> NewUser {
    NewUser::builder()
        .email(email)
        .name("A")
        .password_hash("$2b$04$hash")
        .created_at(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
        .build()
}

pub async fn create<T: UserRepo>(tester: impl Tester<T>) {
    let store = tester.store();

    let created = store.create(new_user("a@x.com")).await.unwrap().unwrap();

    assert_eq!(created.email, "a@x.com");
    assert_eq!(created.name, "A");
    assert_eq!(created.password_hash, "$2b$04$hash");
    assert_eq!(created.created_at, new_user("a@x.com").created_at);
}

pub async fn create_duplicate_email<T: UserRepo>(tester: impl Tester<T>) {
    let store = tester.store();

    let first = store.create(new_user("a@x.com")).await.unwrap();
    let second = store.create(new_user("a@x.com")).await.unwrap();

    assert!(first.is_some());
    assert!(second.is_none());
}

pub async fn fetch_by_email<T: UserRepo>(tester: impl Tester<T>) {
    let store = tester.store();

    let created = store.create(new_user("a@x.com")).await.unwrap().unwrap();
    store.create(new_user("b@x.com")).await.unwrap().unwrap();

    let fetched = store.fetch_by_email("a@x.com").await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert!(store.fetch_by_email("c@x.com").await.unwrap().is_none());
}

pub async fn fetch_by_id<T: UserRepo>(tester: impl Tester<T>) {
    let store = tester.store();

    let created = store.create(new_user("a@x.com")).await.unwrap().unwrap();

    let fetched = store.fetch_by_id(created.id).await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert!(store.fetch_by_id(9999i64.into()).await.unwrap().is_none());
}

#[macro_export]
macro_rules! generate_user_store_tests {
    ($tester:ident) => {
        macro_rules! test {
            ($title: ident, $func: path) => {
                crate::declare_test_fn!($tester, $title, $func);
            };
        }

        test!(create, crate::store::user::create);
        test!(
            create_duplicate_email,
            crate::store::user::create_duplicate_email
        );
        test!(fetch_by_email, crate::store::user::fetch_by_email);
        test!(fetch_by_id, crate::store::user::fetch_by_id);
    };
}
