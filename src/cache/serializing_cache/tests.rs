use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{retrieve, store, BrokenDriver, CacheManager, Error, StubDriver};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Profile {
    name: String,
    visits: i32,
}

fn profile() -> Profile {
    Profile {
        name: "test".to_string(),
        visits: 42,
    }
}

#[tokio::test]
async fn test_store_then_retrieve() {
    let cache = CacheManager::new(StubDriver::new(true), "app:");

    store(&cache, "profile", &profile(), 60).await.unwrap();
    let retrieved: Option<Profile> = retrieve(&cache, "profile").await.unwrap();

    assert_eq!(retrieved, Some(profile()));
}

#[tokio::test]
async fn test_payload_is_json() {
    let cache = CacheManager::new(StubDriver::new(false), "");

    store(&cache, "profile", &profile(), 60).await.unwrap();

    let raw = cache.get("profile").await.unwrap().unwrap();
    let decoded: Profile = serde_json::from_str(&raw).unwrap();
    assert_eq!(decoded, profile());
}

#[tokio::test]
async fn test_retrieve_miss() {
    let cache = CacheManager::new(StubDriver::new(true), "");

    let result: Result<Option<Profile>, Error> = retrieve(&cache, "missing").await;

    assert_eq!(result, Ok(None));
}

#[tokio::test]
async fn test_retrieve_undecodable_payload() {
    let cache = CacheManager::new(StubDriver::new(true), "");
    cache.set("profile", "invalid json", 60).await.unwrap();

    let result: Result<Option<Profile>, Error> = retrieve(&cache, "profile").await;

    assert!(matches!(result, Err(Error::Execution(_))));
}

#[tokio::test]
async fn test_backend_errors() {
    let cache = CacheManager::new(Arc::new(BrokenDriver), "");

    let result: Result<Option<Profile>, Error> = retrieve(&cache, "profile").await;
    assert!(matches!(result, Err(Error::Execution(_))));

    let result = store(&cache, "profile", &profile(), 60).await;
    assert!(matches!(result, Err(Error::Execution(_))));
}

#[derive(Debug, Serialize)]
struct Unencodable {
    #[serde(serialize_with = "fail_serialization")]
    value: i32,
}

fn fail_serialization<S>(_: &i32, _: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    Err(serde::ser::Error::custom("refusing to serialize"))
}

#[tokio::test]
async fn test_store_encoding_error() {
    let cache = CacheManager::new(StubDriver::new(true), "");

    let result = store(&cache, "bad", &Unencodable { value: 42 }, 60).await;

    match result {
        Err(Error::Execution(msg)) => assert!(msg.contains("Unable to encode cache payload")),
        other => panic!("Expected Execution error, got {other:?}"),
    }
    assert_eq!(cache.get("bad").await, Ok(None));
}
